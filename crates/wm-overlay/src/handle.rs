//! Drag handle: the grab affordance attached to a marker in its dynamic form.
//!
//! The handle turns pointer events into pixel displacements (the way a select
//! tool tracks its last pointer position) and carries its own display
//! position, which the engine keeps identical to the marker's.

use crate::input::DragEvent;
use kurbo::{Point, Vec2};
use wm_core::MarkerId;

#[derive(Debug, Clone, PartialEq)]
pub struct DragHandle {
    marker: MarkerId,
    position: Point,
    /// Last pointer position while a gesture is in progress.
    last_pointer: Option<(f64, f64)>,
}

impl DragHandle {
    pub fn new(marker: MarkerId, position: Point) -> Self {
        Self {
            marker,
            position,
            last_pointer: None,
        }
    }

    pub fn marker(&self) -> MarkerId {
        self.marker
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.last_pointer.is_some()
    }

    /// Feed a pointer event. Returns the pixel displacement since the last
    /// event, if any.
    pub fn track(&mut self, event: &DragEvent) -> Option<Vec2> {
        match event {
            DragEvent::Start { x, y } => {
                self.last_pointer = Some((*x, *y));
                None
            }
            DragEvent::Move { x, y } => {
                let (lx, ly) = self.last_pointer?;
                self.last_pointer = Some((*x, *y));
                let delta = Vec2::new(x - lx, y - ly);
                (delta != Vec2::ZERO).then_some(delta)
            }
            DragEvent::End => {
                self.last_pointer = None;
                None
            }
        }
    }

    pub(crate) fn move_to(&mut self, position: Point) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_without_start_is_ignored() {
        let mut handle = DragHandle::new(MarkerId::generate(), Point::ZERO);
        assert_eq!(handle.track(&DragEvent::Move { x: 5.0, y: 5.0 }), None);
        assert!(!handle.is_dragging());
    }

    #[test]
    fn deltas_accumulate_from_last_pointer() {
        let mut handle = DragHandle::new(MarkerId::generate(), Point::ZERO);
        assert_eq!(handle.track(&DragEvent::Start { x: 10.0, y: 10.0 }), None);
        assert_eq!(
            handle.track(&DragEvent::Move { x: 15.0, y: 8.0 }),
            Some(Vec2::new(5.0, -2.0))
        );
        assert_eq!(
            handle.track(&DragEvent::Move { x: 20.0, y: 8.0 }),
            Some(Vec2::new(5.0, 0.0))
        );
        // Same position twice: nothing to apply
        assert_eq!(handle.track(&DragEvent::Move { x: 20.0, y: 8.0 }), None);

        assert_eq!(handle.track(&DragEvent::End), None);
        assert!(!handle.is_dragging());
    }
}
