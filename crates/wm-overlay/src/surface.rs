//! The display surface markers are drawn on, as seen by the overlay engine.
//!
//! The surface hosts tiles and gestures; the engine only places, moves and
//! removes overlays on it, and reads its viewport to find the visual center.
//! Positions handed to the surface are always in the map's relative
//! (display) space; the surface converts to pixels itself.

use crate::config::Anchor;
use kurbo::{Point, Vec2};
use wm_core::MarkerId;

/// Visual form of a marker overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerForm {
    /// Display-only pin.
    Static,
    /// Rounded, draggable form shown while a drag handle is attached.
    Dynamic,
}

/// Identity of an overlay on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKey {
    Marker(MarkerId),
    DragHandle(MarkerId),
}

/// What to draw for a new overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayView {
    Marker { id: MarkerId, form: MarkerForm },
    DragHandle { marker: MarkerId },
}

impl OverlayView {
    pub fn key(&self) -> OverlayKey {
        match self {
            OverlayView::Marker { id, .. } => OverlayKey::Marker(*id),
            OverlayView::DragHandle { marker } => OverlayKey::DragHandle(*marker),
        }
    }
}

/// Scroll, size, offset and zoom of the surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub scroll_x: i32,
    pub scroll_y: i32,
    pub width: u32,
    pub height: u32,
    /// Offset of the map content inside the surface (when smaller than it).
    pub offset_x: i32,
    pub offset_y: i32,
    pub scale: f64,
}

impl ViewportState {
    /// Absolute pixel position of the visible center. Half sizes round down
    /// to whole pixels.
    pub fn visual_center(&self) -> (f64, f64) {
        let x = f64::from(self.scroll_x) + f64::from(self.width / 2) - f64::from(self.offset_x);
        let y = f64::from(self.scroll_y) + f64::from(self.height / 2) - f64::from(self.offset_y);
        (x, y)
    }
}

pub trait DisplaySurface {
    /// Add an overlay on top of all existing ones.
    fn add_overlay(&mut self, view: OverlayView, at: Point, anchor: Anchor);

    fn remove_overlay(&mut self, key: OverlayKey);

    fn move_overlay(&mut self, key: OverlayKey, at: Point);

    /// Switch a marker overlay between its static and dynamic look.
    fn restyle_marker(&mut self, id: MarkerId, form: MarkerForm);

    fn viewport(&self) -> ViewportState;

    /// Absolute (scaled, scrolled) pixel position → relative position.
    fn absolute_to_relative(&self, x: f64, y: f64) -> Point;

    /// A pointer displacement in screen pixels → the same displacement in
    /// relative units at the current scale.
    fn pixel_delta_to_relative(&self, delta: Vec2) -> Vec2;
}

/// Linear mapping between a map's relative bounds and its full-resolution
/// pixel size. Hosts can back `DisplaySurface`'s conversions with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelTranslator {
    /// Relative coordinate of the left edge.
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    /// Map size in pixels at scale 1.
    pub width: f64,
    pub height: f64,
}

impl PixelTranslator {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            width,
            height,
        }
    }

    fn units_per_pixel(&self) -> Vec2 {
        Vec2::new(
            (self.right - self.left) / self.width,
            (self.bottom - self.top) / self.height,
        )
    }

    pub fn absolute_to_relative(&self, x: f64, y: f64, scale: f64) -> Point {
        let upp = self.units_per_pixel();
        Point::new(
            self.left + x / scale * upp.x,
            self.top + y / scale * upp.y,
        )
    }

    pub fn relative_to_absolute(&self, p: Point, scale: f64) -> (f64, f64) {
        let upp = self.units_per_pixel();
        (
            (p.x - self.left) / upp.x * scale,
            (p.y - self.top) / upp.y * scale,
        )
    }

    pub fn pixel_delta_to_relative(&self, delta: Vec2, scale: f64) -> Vec2 {
        let upp = self.units_per_pixel();
        Vec2::new(delta.x / scale * upp.x, delta.y / scale * upp.y)
    }
}
