//! Movable marker: the view-model wrapping one stored marker.
//!
//! A movable marker holds the marker's relative position and its mode. The
//! mode is a tagged variant rather than two view types: the drag handle only
//! exists inside `Dynamic`, so "a static marker with a handle" cannot be
//! represented.

use crate::handle::DragHandle;
use crate::surface::{MarkerForm, OverlayKey};
use kurbo::Point;
use smallvec::{SmallVec, smallvec};
use wm_core::MarkerId;

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerMode {
    /// Display-only. Position mirrors the marker's canonical coordinates.
    Static,
    /// Draggable. Position is the live, uncommitted drag position.
    Dynamic { handle: DragHandle },
}

/// What tapping the marker does in its current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapAction {
    OpenPopup,
    Commit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovableMarker {
    marker: MarkerId,
    position: Point,
    mode: MarkerMode,
}

impl MovableMarker {
    pub fn new_static(marker: MarkerId, position: Point) -> Self {
        Self {
            marker,
            position,
            mode: MarkerMode::Static,
        }
    }

    /// Created straight into the dynamic form, handle under the marker.
    pub fn new_dynamic(marker: MarkerId, position: Point) -> Self {
        Self {
            marker,
            position,
            mode: MarkerMode::Dynamic {
                handle: DragHandle::new(marker, position),
            },
        }
    }

    pub fn id(&self) -> MarkerId {
        self.marker
    }

    /// Relative position in the map's display space.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn mode(&self) -> &MarkerMode {
        &self.mode
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.mode, MarkerMode::Dynamic { .. })
    }

    pub fn form(&self) -> MarkerForm {
        match self.mode {
            MarkerMode::Static => MarkerForm::Static,
            MarkerMode::Dynamic { .. } => MarkerForm::Dynamic,
        }
    }

    pub fn tap_action(&self) -> TapAction {
        match self.mode {
            MarkerMode::Static => TapAction::OpenPopup,
            MarkerMode::Dynamic { .. } => TapAction::Commit,
        }
    }

    pub fn handle(&self) -> Option<&DragHandle> {
        match &self.mode {
            MarkerMode::Dynamic { handle } => Some(handle),
            MarkerMode::Static => None,
        }
    }

    pub(crate) fn handle_mut(&mut self) -> Option<&mut DragHandle> {
        match &mut self.mode {
            MarkerMode::Dynamic { handle } => Some(handle),
            MarkerMode::Static => None,
        }
    }

    /// Static → Dynamic. Attaches a handle at the current position.
    /// Returns `None` if the marker already was dynamic.
    pub fn morph_to_dynamic(&mut self) -> Option<&DragHandle> {
        if self.is_dynamic() {
            return None;
        }
        self.mode = MarkerMode::Dynamic {
            handle: DragHandle::new(self.marker, self.position),
        };
        self.handle()
    }

    /// Dynamic → Static. Returns the detached handle, or `None` if the marker
    /// already was static.
    pub fn morph_to_static(&mut self) -> Option<DragHandle> {
        match std::mem::replace(&mut self.mode, MarkerMode::Static) {
            MarkerMode::Dynamic { handle } => Some(handle),
            MarkerMode::Static => None,
        }
    }

    /// Move the marker, and its handle along with it.
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
        if let Some(handle) = self.handle_mut() {
            handle.move_to(position);
        }
    }

    /// Surface overlays owned by this marker, topmost last.
    pub fn overlay_keys(&self) -> SmallVec<[OverlayKey; 2]> {
        match self.mode {
            MarkerMode::Static => smallvec![OverlayKey::Marker(self.marker)],
            MarkerMode::Dynamic { .. } => smallvec![
                OverlayKey::DragHandle(self.marker),
                OverlayKey::Marker(self.marker)
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_marker_opens_popup_on_tap() {
        let m = MovableMarker::new_static(MarkerId::generate(), Point::new(1.0, 2.0));
        assert_eq!(m.tap_action(), TapAction::OpenPopup);
        assert_eq!(m.form(), MarkerForm::Static);
        assert!(m.handle().is_none());
        assert_eq!(m.overlay_keys().len(), 1);
    }

    #[test]
    fn morph_roundtrip_attaches_and_detaches_handle() {
        let id = MarkerId::generate();
        let mut m = MovableMarker::new_static(id, Point::new(1.0, 2.0));

        let handle = m.morph_to_dynamic().unwrap();
        assert_eq!(handle.position(), Point::new(1.0, 2.0));
        assert_eq!(handle.marker(), id);
        assert_eq!(m.tap_action(), TapAction::Commit);
        assert!(m.morph_to_dynamic().is_none(), "already dynamic");

        let detached = m.morph_to_static().unwrap();
        assert_eq!(detached.marker(), id);
        assert!(!m.is_dynamic());
        assert!(m.morph_to_static().is_none(), "already static");
    }

    #[test]
    fn handle_follows_position() {
        let mut m = MovableMarker::new_dynamic(MarkerId::generate(), Point::new(0.0, 0.0));
        m.set_position(Point::new(3.0, -4.0));
        assert_eq!(m.position(), Point::new(3.0, -4.0));
        assert_eq!(m.handle().map(DragHandle::position), Some(Point::new(3.0, -4.0)));
        assert_eq!(
            m.overlay_keys().as_slice(),
            &[OverlayKey::DragHandle(m.id()), OverlayKey::Marker(m.id())]
        );
    }
}
