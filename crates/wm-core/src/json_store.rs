//! File-backed marker store: one `markers.json` per map directory.
//!
//! ```text
//! <root>/<map-id>/markers.json   {"markers": [{"name": .., "lat": .., ...}]}
//! ```
//!
//! Disk access never happens inside a `MarkerStore` call. `load` and `save`
//! only queue the map; the host drains the queues off its UI path with
//! `complete_pending_loads` and `complete_pending_saves`. A missing file is
//! an empty list. Failures are logged and kept in `last_error`; they never
//! reach the caller of `save`.

use crate::id::{MapId, MarkerId};
use crate::model::{Marker, MarkerFile};
use crate::store::{MarkerStore, StoreError};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const MARKER_FILE_NAME: &str = "markers.json";

#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
    lists: HashMap<MapId, Vec<Marker>>,
    pending: Vec<MapId>,
    pending_saves: Vec<MapId>,
    last_error: Option<StoreError>,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lists: HashMap::new(),
            pending: Vec::new(),
            pending_saves: Vec::new(),
            last_error: None,
        }
    }

    pub fn marker_file(&self, map: MapId) -> PathBuf {
        self.root.join(map.as_str()).join(MARKER_FILE_NAME)
    }

    /// Read every queued map from disk. Returns the maps whose markers are now
    /// in memory; a map whose file is unreadable stays unloaded.
    pub fn complete_pending_loads(&mut self) -> Vec<MapId> {
        let mut done = Vec::new();
        for map in std::mem::take(&mut self.pending) {
            let path = self.marker_file(map);
            match read_marker_file(&path) {
                Ok(markers) => {
                    log::info!("loaded {} markers from {}", markers.len(), path.display());
                    self.lists.insert(map, markers);
                    done.push(map);
                }
                Err(err) => {
                    log::error!("could not load markers of {map:?}: {err}");
                    self.last_error = Some(err);
                }
            }
        }
        done
    }

    /// Write every map whose save is queued. Each file gets the in-memory list
    /// as it is now, so several saves of one map collapse into one write.
    /// Returns the maps written successfully.
    pub fn complete_pending_saves(&mut self) -> Vec<MapId> {
        let mut done = Vec::new();
        for map in std::mem::take(&mut self.pending_saves) {
            match self.write(map) {
                Ok(()) => {
                    log::debug!("saved markers of {map:?}");
                    done.push(map);
                }
                Err(err) => {
                    log::error!("could not save markers of {map:?}: {err}");
                    self.last_error = Some(err);
                }
            }
        }
        done
    }

    pub fn pending_saves(&self) -> &[MapId] {
        &self.pending_saves
    }

    /// Most recent load or save failure, cleared on read.
    pub fn take_last_error(&mut self) -> Option<StoreError> {
        self.last_error.take()
    }

    fn write(&self, map: MapId) -> Result<(), StoreError> {
        let path = self.marker_file(map);
        let file = MarkerFile {
            markers: self.markers(map).to_vec(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, json).map_err(|source| StoreError::Io { path, source })
    }
}

fn read_marker_file(path: &Path) -> Result<Vec<Marker>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let file: MarkerFile = serde_json::from_str(&text).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.markers)
}

impl MarkerStore for JsonFileStore {
    fn markers_loaded(&self, map: MapId) -> bool {
        self.lists.contains_key(&map)
    }

    fn markers(&self, map: MapId) -> &[Marker] {
        self.lists.get(&map).map(Vec::as_slice).unwrap_or(&[])
    }

    fn marker_mut(&mut self, map: MapId, id: MarkerId) -> Option<&mut Marker> {
        self.lists.get_mut(&map)?.iter_mut().find(|m| m.id == id)
    }

    fn add_marker(&mut self, map: MapId, marker: Marker) -> Result<(), StoreError> {
        let list = self.lists.get_mut(&map).ok_or(StoreError::NotLoaded(map))?;
        list.push(marker);
        Ok(())
    }

    fn load(&mut self, map: MapId) {
        if !self.pending.contains(&map) {
            self.pending.push(map);
        }
    }

    fn load_pending(&self, map: MapId) -> bool {
        self.pending.contains(&map)
    }

    fn save(&mut self, map: MapId) {
        if !self.markers_loaded(map) {
            log::warn!("save of {map:?} ignored: markers were never loaded");
            return;
        }
        if !self.pending_saves.contains(&map) {
            self.pending_saves.push(map);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_loads_as_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        let map = MapId::intern("json-missing");

        store.load(map);
        assert!(!store.markers_loaded(map));
        assert_eq!(store.complete_pending_loads(), vec![map]);
        assert!(store.markers_loaded(map));
        assert!(store.markers(map).is_empty());
    }

    #[test]
    fn save_then_reload_preserves_markers() {
        let dir = tempfile::tempdir().unwrap();
        let map = MapId::intern("json-roundtrip");

        let mut store = JsonFileStore::new(dir.path());
        store.load(map);
        store.complete_pending_loads();
        let mut marker = Marker::new("Col de la Croix").with_geo(45.2, 5.9);
        marker.comment = Some("windy".into());
        marker
            .extra
            .insert("color".into(), serde_json::json!("#ff0000"));
        store.add_marker(map, marker).unwrap();
        store.save(map);
        assert!(!store.marker_file(map).exists(), "written only on flush");
        assert_eq!(store.complete_pending_saves(), vec![map]);
        assert!(store.take_last_error().is_none());
        assert!(store.marker_file(map).exists());

        let mut reloaded = JsonFileStore::new(dir.path());
        reloaded.load(map);
        reloaded.complete_pending_loads();
        let markers = reloaded.markers(map);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].name, "Col de la Croix");
        assert_eq!(markers[0].comment.as_deref(), Some("windy"));
        assert_eq!(markers[0].extra["color"], serde_json::json!("#ff0000"));
    }

    #[test]
    fn malformed_file_is_reported_and_left_unloaded() {
        let dir = tempfile::tempdir().unwrap();
        let map = MapId::intern("json-malformed");
        let mut store = JsonFileStore::new(dir.path());
        let path = store.marker_file(map);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        store.load(map);
        assert!(store.complete_pending_loads().is_empty());
        assert!(!store.markers_loaded(map));
        assert!(!store.load_pending(map));
        assert!(matches!(
            store.take_last_error(),
            Some(StoreError::Json { .. })
        ));
    }

    #[test]
    fn saves_of_one_map_collapse_into_one_write() {
        let dir = tempfile::tempdir().unwrap();
        let map = MapId::intern("json-collapse");
        let mut store = JsonFileStore::new(dir.path());
        store.load(map);
        store.complete_pending_loads();

        store.add_marker(map, Marker::new("a")).unwrap();
        store.save(map);
        store.add_marker(map, Marker::new("b")).unwrap();
        store.save(map);
        assert_eq!(store.pending_saves(), &[map]);

        store.complete_pending_saves();
        let text = fs::read_to_string(store.marker_file(map)).unwrap();
        let file: MarkerFile = serde_json::from_str(&text).unwrap();
        assert_eq!(file.markers.len(), 2);
        assert!(store.pending_saves().is_empty());
    }

    #[test]
    fn unloaded_map_is_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let map = MapId::intern("json-unloaded-save");
        let mut store = JsonFileStore::new(dir.path());

        assert!(matches!(
            store.add_marker(map, Marker::new("early")),
            Err(StoreError::NotLoaded(_))
        ));
        store.save(map);
        assert!(store.pending_saves().is_empty());
        assert!(store.complete_pending_saves().is_empty());
        assert!(!store.marker_file(map).exists());
    }
}
