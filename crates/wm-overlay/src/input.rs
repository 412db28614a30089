//! Pointer events delivered to a drag handle.
//!
//! Positions are screen pixels as reported by the host's touch listener.
//! Gesture recognition itself stays in the host.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEvent {
    /// Finger/pointer went down on the handle.
    Start { x: f64, y: f64 },

    /// Pointer moved while down.
    Move { x: f64, y: f64 },

    /// Pointer released or the gesture was cancelled.
    End,
}

impl DragEvent {
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::Start { x, y } | Self::Move { x, y } => Some((*x, *y)),
            Self::End => None,
        }
    }
}
