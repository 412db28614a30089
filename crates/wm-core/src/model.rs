//! Persisted marker data and the map descriptor markers belong to.
//!
//! A `Marker` stores both geographic (`lat`/`lon`) and projected
//! (`proj_x`/`proj_y`) coordinates. Which pair is canonical depends on the
//! owning map: with a projection the projected pair is authoritative and
//! `lat`/`lon` are a cache refreshed on every commit; without one, `lat`/`lon`
//! are authoritative and the projected fields stay `None`.

use crate::id::{MapId, MarkerId};
use crate::projection::Projection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A marker as stored in a map's marker list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Session-local identity, never written to disk.
    #[serde(skip)]
    pub id: MarkerId,

    #[serde(default)]
    pub name: String,

    /// Latitude in degrees. `0.0` until first set.
    #[serde(default)]
    pub lat: f64,

    /// Longitude in degrees. `0.0` until first set.
    #[serde(default)]
    pub lon: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proj_x: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proj_y: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Any other descriptive fields found in the marker file, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Marker {
    /// A new, unplaced marker with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: MarkerId::generate(),
            name: name.into(),
            lat: 0.0,
            lon: 0.0,
            proj_x: None,
            proj_y: None,
            comment: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_geo(mut self, lat: f64, lon: f64) -> Self {
        self.lat = lat;
        self.lon = lon;
        self
    }

    pub fn with_projected(mut self, x: f64, y: f64) -> Self {
        self.proj_x = Some(x);
        self.proj_y = Some(y);
        self
    }

    pub fn geo(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    /// Stored projected coordinates, if both halves are present.
    pub fn projected(&self) -> Option<(f64, f64)> {
        self.proj_x.zip(self.proj_y)
    }
}

/// On-disk envelope of a marker list: `{"markers": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkerFile {
    #[serde(default)]
    pub markers: Vec<Marker>,
}

/// The map markers are drawn on. Cheap to clone.
#[derive(Clone)]
pub struct MapInfo {
    pub id: MapId,
    pub name: String,
    /// `None` when the map is calibrated directly in WGS84.
    pub projection: Option<Arc<dyn Projection>>,
}

impl MapInfo {
    pub fn new(id: MapId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            projection: None,
        }
    }

    pub fn with_projection(mut self, projection: Arc<dyn Projection>) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn projection(&self) -> Option<&dyn Projection> {
        self.projection.as_deref()
    }
}

impl fmt::Debug for MapInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("projection", &self.projection.as_ref().map(|p| p.name()))
            .finish()
    }
}
