//! Coordinate mapper: canonical marker coordinates ↔ display space.
//!
//! The display ("relative") space of a map is its own planar space:
//!
//! - **No projection**: display `(x, y)` is `(lon, lat)`, and the inverse is
//!   always defined.
//! - **Projection**: display `(x, y)` is the projected pair. Going back to
//!   WGS84 uses the projection's inverse, which may be undefined. In that case
//!   the marker keeps its previous `lat`/`lon` (stale but never corrupted).

use crate::model::{GeoPoint, MapInfo, Marker};
use crate::projection::Projection;
use kurbo::Point;

/// Result of writing a display position back into a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Canonical and derived coordinates are all up to date.
    Synced,
    /// Projected coordinates were updated but the inverse projection is
    /// undefined there; `lat`/`lon` still hold their previous values.
    GeoStale,
}

#[derive(Clone, Copy)]
pub struct CoordinateMapper<'a> {
    projection: Option<&'a dyn Projection>,
}

impl<'a> CoordinateMapper<'a> {
    pub fn new(projection: Option<&'a dyn Projection>) -> Self {
        Self { projection }
    }

    pub fn for_map(map: &'a MapInfo) -> Self {
        Self::new(map.projection())
    }

    pub fn has_projection(&self) -> bool {
        self.projection.is_some()
    }

    /// Forward transform of a WGS84 position.
    pub fn to_display(&self, lat: f64, lon: f64) -> Option<Point> {
        match self.projection {
            None => Some(Point::new(lon, lat)),
            Some(p) => p.do_projection(lat, lon).map(Point::from),
        }
    }

    /// Display position of a marker's canonical coordinates.
    ///
    /// With a projection this is the stored projected pair. Markers lacking
    /// one (hand-written marker files) fall back to projecting `lat`/`lon`.
    pub fn marker_position(&self, marker: &Marker) -> Option<Point> {
        match self.projection {
            None => Some(Point::new(marker.lon, marker.lat)),
            Some(_) => marker
                .projected()
                .map(Point::from)
                .or_else(|| self.to_display(marker.lat, marker.lon)),
        }
    }

    /// Inverse transform of a display position.
    pub fn to_geo(&self, point: Point) -> Option<GeoPoint> {
        match self.projection {
            None => Some(GeoPoint::new(point.y, point.x)),
            Some(p) => p.undo_projection(point.x, point.y),
        }
    }

    /// Write `point` into the marker's canonical coordinates and refresh the
    /// derived ones.
    pub fn commit(&self, marker: &mut Marker, point: Point) -> CommitOutcome {
        if self.projection.is_some() {
            marker.proj_x = Some(point.x);
            marker.proj_y = Some(point.y);
        }
        match self.to_geo(point) {
            Some(geo) => {
                marker.lat = geo.lat;
                marker.lon = geo.lon;
                CommitOutcome::Synced
            }
            None => {
                log::warn!(
                    "inverse projection undefined at ({}, {}); {} keeps lat/lon ({}, {})",
                    point.x,
                    point.y,
                    marker.id,
                    marker.lat,
                    marker.lon
                );
                CommitOutcome::GeoStale
            }
        }
    }
}
