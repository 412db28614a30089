use wm_core::{MapId, MarkerId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverlayError {
    /// The engine is not bound to a map and surface.
    #[error("marker overlay is not attached to a map")]
    NotAttached,

    /// The bound map's markers have not been loaded and drawn yet.
    #[error("markers of {0:?} are not loaded yet")]
    MarkersNotLoaded(MapId),

    #[error("no marker {0} on the current map")]
    UnknownMarker(MarkerId),

    /// `update_current_marker` before any edit request.
    #[error("no marker has been selected for editing")]
    NoCurrentMarker,

    #[error("marker {0} is not in its draggable form")]
    NotDynamic(MarkerId),

    #[error("marker {0} is being moved")]
    NotStatic(MarkerId),
}
