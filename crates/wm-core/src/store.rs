//! Marker stores: the authoritative marker lists, one per map.
//!
//! Loading is asynchronous from the caller's point of view: `load` only
//! queues a request, and whoever drives the store completes it later and
//! notifies the overlay engine. Saving is fire-and-forget; a store reports
//! its own write failures.

use crate::id::{MapId, MarkerId};
use crate::model::Marker;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed marker file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("markers of {0:?} are not loaded")]
    NotLoaded(MapId),
}

/// Access to the marker lists of maps.
pub trait MarkerStore {
    /// Whether `map`'s markers are in memory.
    fn markers_loaded(&self, map: MapId) -> bool;

    /// In-memory markers of `map`, in insertion order. Empty if not loaded.
    fn markers(&self, map: MapId) -> &[Marker];

    fn marker(&self, map: MapId, id: MarkerId) -> Option<&Marker> {
        self.markers(map).iter().find(|m| m.id == id)
    }

    fn marker_mut(&mut self, map: MapId, id: MarkerId) -> Option<&mut Marker>;

    /// Append to the in-memory list. Not persisted until `save`.
    ///
    /// Fails with `StoreError::NotLoaded` before `map` is loaded: a list
    /// started from nothing would replace the persisted one on the next save.
    fn add_marker(&mut self, map: MapId, marker: Marker) -> Result<(), StoreError>;

    /// Request an asynchronous load of `map`'s markers.
    fn load(&mut self, map: MapId);

    /// Whether a load of `map` is queued and not yet completed. A load that
    /// failed is no longer pending and leaves `map` unloaded.
    fn load_pending(&self, map: MapId) -> bool;

    /// Persist the whole in-memory list of `map`. Fire-and-forget.
    fn save(&mut self, map: MapId);
}

/// A store held entirely in memory.
///
/// "Persisted" lists live in a backing table; `load` queues a request that
/// `complete_load` / `complete_pending_loads` fulfil by copying the backing
/// list in. Every `save` records a snapshot, which makes the store double as
/// an observable fake in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lists: HashMap<MapId, Vec<Marker>>,
    backing: HashMap<MapId, Vec<Marker>>,
    pending: Vec<MapId>,
    load_requests: usize,
    saves: Vec<(MapId, Vec<Marker>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backing table, as if `markers` were on disk but not yet read.
    pub fn with_backing(mut self, map: MapId, markers: Vec<Marker>) -> Self {
        self.backing.insert(map, markers);
        self
    }

    /// Seed an already-loaded list.
    pub fn with_loaded(mut self, map: MapId, markers: Vec<Marker>) -> Self {
        self.lists.insert(map, markers);
        self
    }

    /// Fulfil a queued load of `map`. Returns `false` if none was queued.
    pub fn complete_load(&mut self, map: MapId) -> bool {
        let Some(pos) = self.pending.iter().position(|m| *m == map) else {
            return false;
        };
        self.pending.remove(pos);
        let markers = self.backing.get(&map).cloned().unwrap_or_default();
        log::debug!("loaded {} markers for {map:?}", markers.len());
        self.lists.insert(map, markers);
        true
    }

    /// Drop a queued load of `map` without loading it, as a failed read would.
    pub fn fail_load(&mut self, map: MapId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|m| *m != map);
        self.pending.len() != before
    }

    /// Fulfil every queued load, returning the maps that completed.
    pub fn complete_pending_loads(&mut self) -> Vec<MapId> {
        let pending = std::mem::take(&mut self.pending);
        for map in &pending {
            let markers = self.backing.get(map).cloned().unwrap_or_default();
            self.lists.insert(*map, markers);
        }
        pending
    }

    pub fn pending_loads(&self) -> &[MapId] {
        &self.pending
    }

    /// Number of `load` calls received so far.
    pub fn load_requests(&self) -> usize {
        self.load_requests
    }

    /// Snapshots taken by each `save`, oldest first.
    pub fn saves(&self) -> &[(MapId, Vec<Marker>)] {
        &self.saves
    }

    /// The persisted list of `map`, as the last save left it.
    pub fn persisted(&self, map: MapId) -> Option<&[Marker]> {
        self.backing.get(&map).map(Vec::as_slice)
    }
}

impl MarkerStore for MemoryStore {
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
        self.load_requests += 1;
        if !self.pending.contains(&map) {
            self.pending.push(map);
        }
    }

    fn load_pending(&self, map: MapId) -> bool {
        self.pending.contains(&map)
    }

    fn save(&mut self, map: MapId) {
        let snapshot = self.markers(map).to_vec();
        self.backing.insert(map, snapshot.clone());
        self.saves.push((map, snapshot));
    }
}
