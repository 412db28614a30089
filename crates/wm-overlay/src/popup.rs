//! Info popup and external edit listener contracts.
//!
//! At most one popup is open at a time. The host renders it however it likes
//! and routes the user's choice back with `MarkerOverlay::on_popup_action`.

use crate::config::Anchor;
use kurbo::Point;
use wm_core::{Marker, MarkerId};

/// The two actions a popup offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupAction {
    /// Switch the marker to its draggable form.
    Move,
    /// Hand the marker to the external editing flow.
    Edit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoPopup {
    pub marker: MarkerId,
    pub title: String,
    pub subtitle: String,
}

impl InfoPopup {
    /// Title is the marker name, subtitle its WGS84 position.
    pub fn for_marker(marker: &Marker, precision: usize) -> Self {
        Self {
            marker: marker.id,
            title: marker.name.clone(),
            subtitle: format!(
                "lat: {:.*}  lon: {:.*}",
                precision, marker.lat, precision, marker.lon
            ),
        }
    }
}

pub trait PopupHost {
    fn show(&mut self, popup: &InfoPopup, at: Point, anchor: Anchor);

    fn dismiss(&mut self, marker: MarkerId);
}

/// Receives markers the user asked to edit in detail.
pub trait EditListener {
    fn on_request_manage_marker(&mut self, marker: &Marker);
}
