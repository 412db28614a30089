//! Map projections: WGS84 ↔ planar coordinates.

use crate::model::GeoPoint;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// A forward/inverse transform between WGS84 and a map's planar space.
///
/// Either direction may be undefined outside the projection's valid domain,
/// in which case `None` is returned.
pub trait Projection {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// WGS84 → planar `(x, y)`.
    fn do_projection(&self, lat: f64, lon: f64) -> Option<(f64, f64)>;

    /// Planar `(x, y)` → WGS84.
    fn undo_projection(&self, x: f64, y: f64) -> Option<GeoPoint>;
}

/// Spherical (Web) Mercator, EPSG:3857.
#[derive(Debug, Clone, Copy)]
pub struct MercatorProjection {
    radius: f64,
}

impl MercatorProjection {
    pub const EARTH_RADIUS: f64 = 6_378_137.0;

    /// Latitude beyond which the projection is not defined (the world square).
    pub const MAX_LATITUDE: f64 = 85.051_128_78;

    pub fn new() -> Self {
        Self {
            radius: Self::EARTH_RADIUS,
        }
    }

    /// Half the side of the projected world square.
    pub fn max_extent(&self) -> f64 {
        self.radius * PI
    }
}

impl Default for MercatorProjection {
    fn default() -> Self {
        Self::new()
    }
}

impl Projection for MercatorProjection {
    fn name(&self) -> &str {
        "mercator"
    }

    fn do_projection(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > Self::MAX_LATITUDE {
            return None;
        }
        let x = self.radius * lon.to_radians();
        let y = self.radius * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        Some((x, y))
    }

    fn undo_projection(&self, x: f64, y: f64) -> Option<GeoPoint> {
        let extent = self.max_extent();
        // Small tolerance so the square's own edge stays invertible.
        let limit = extent * (1.0 + 1e-12);
        if !x.is_finite() || !y.is_finite() || x.abs() > limit || y.abs() > limit {
            return None;
        }
        let lon = (x / self.radius).to_degrees();
        let lat = (2.0 * (y / self.radius).exp().atan() - FRAC_PI_2).to_degrees();
        Some(GeoPoint::new(lat, lon))
    }
}
