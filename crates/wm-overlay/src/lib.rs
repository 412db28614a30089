pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod input;
pub mod movable;
pub mod popup;
pub mod surface;

pub use config::{Anchor, OverlayConfig};
pub use engine::{InitOutcome, MarkerOverlay, Session};
pub use error::OverlayError;
pub use handle::DragHandle;
pub use input::DragEvent;
pub use movable::{MarkerMode, MovableMarker, TapAction};
pub use popup::{EditListener, InfoPopup, PopupAction, PopupHost};
pub use surface::{
    DisplaySurface, MarkerForm, OverlayKey, OverlayView, PixelTranslator, ViewportState,
};
