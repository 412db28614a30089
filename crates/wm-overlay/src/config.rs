//! Overlay engine configuration.

use serde::{Deserialize, Serialize};

/// Where an overlay sits relative to its coordinate, as a fraction of the
/// overlay's own size. `(-0.5, -0.5)` centers it; `(-0.5, -1.0)` puts its
/// bottom-center on the point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    pub const CENTER: Anchor = Anchor { x: -0.5, y: -0.5 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Configuration for `MarkerOverlay`.
///
/// Every field has a default, so a partial JSON document is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Anchor of marker overlays. Default: centered.
    pub marker_anchor: Anchor,

    /// Anchor of drag handles. Default: centered.
    pub handle_anchor: Anchor,

    /// Anchor of the info popup, which sits above its marker.
    /// Default: `(-0.5, -1.2)`.
    pub popup_anchor: Anchor,

    /// Name given to markers created with `add_new_marker`.
    pub new_marker_name: String,

    /// Decimal places of the coordinates shown in popup subtitles.
    pub coordinate_precision: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            marker_anchor: Anchor::CENTER,
            handle_anchor: Anchor::CENTER,
            popup_anchor: Anchor::new(-0.5, -1.2),
            new_marker_name: "Marker".to_string(),
            coordinate_precision: 5,
        }
    }
}

impl OverlayConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = OverlayConfig::from_json(r#"{"new_marker_name":"Waypoint"}"#).unwrap();
        assert_eq!(config.new_marker_name, "Waypoint");
        assert_eq!(config.popup_anchor, Anchor::new(-0.5, -1.2));
        assert_eq!(config.coordinate_precision, 5);
    }

    #[test]
    fn anchors_parse_from_json() {
        let config =
            OverlayConfig::from_json(r#"{"marker_anchor":{"x":-0.5,"y":-1.0}}"#).unwrap();
        assert_eq!(config.marker_anchor, Anchor::new(-0.5, -1.0));
        assert_eq!(config.handle_anchor, Anchor::CENTER);
    }
}
