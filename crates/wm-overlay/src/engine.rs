//! Marker overlay engine: owns the movable markers of the displayed map.
//!
//! The engine sits between the marker store and the display surface:
//!
//! - **Store → Surface**: on `initialize` (or when a deferred load completes)
//!   every stored marker is wrapped in a static `MovableMarker` and placed on
//!   the surface at its display position.
//!
//! - **Surface → Store**: taps, popup actions and drags drive the
//!   static/dynamic state machine. Drags only move the view-model; the new
//!   position reaches the stored marker on commit, which is also the only
//!   point where a save is requested.
//!
//! Host callbacks can outlive the binding they were issued for. Every
//! binding gets a fresh `Session`; the `on_*` entry points take the session
//! their callback was registered under, and anything carrying an older one
//! (or naming a marker the engine no longer shows) is dropped.

use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::input::DragEvent;
use crate::movable::{MovableMarker, TapAction};
use crate::popup::{EditListener, InfoPopup, PopupAction, PopupHost};
use crate::surface::{DisplaySurface, MarkerForm, OverlayKey, OverlayView};
use kurbo::{Point, Vec2};
use wm_core::{CommitOutcome, CoordinateMapper, MapInfo, Marker, MarkerId, MarkerStore};

/// Identifies one map/surface binding. Stale once the engine is re-attached
/// or detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Markers were already in memory and have been drawn.
    Drawn(usize),
    /// A load was requested; call `on_markers_updated` with this session
    /// once it completes.
    LoadRequested(Session),
    /// A load requested earlier in this session is still in flight.
    LoadPending(Session),
}

struct Binding {
    map: MapInfo,
    surface: Box<dyn DisplaySurface>,
}

pub struct MarkerOverlay<S: MarkerStore> {
    store: S,
    config: OverlayConfig,
    binding: Option<Binding>,
    /// Bumped on every attach/detach.
    generation: u64,
    load_pending: bool,
    /// Drawn markers, in drawing order.
    markers: Vec<MovableMarker>,
    /// Marker last handed to the edit listener.
    current: Option<MarkerId>,
    open_popup: Option<MarkerId>,
    popup_host: Option<Box<dyn PopupHost>>,
    edit_listener: Option<Box<dyn EditListener>>,
}

impl<S: MarkerStore> MarkerOverlay<S> {
    pub fn new(store: S, config: OverlayConfig) -> Self {
        Self {
            store,
            config,
            binding: None,
            generation: 0,
            load_pending: false,
            markers: Vec::new(),
            current: None,
            open_popup: None,
            popup_host: None,
            edit_listener: None,
        }
    }

    pub fn set_popup_host(&mut self, host: Box<dyn PopupHost>) {
        self.popup_host = Some(host);
    }

    pub fn set_edit_listener(&mut self, listener: Box<dyn EditListener>) {
        self.edit_listener = Some(listener);
    }

    // ─── Binding ─────────────────────────────────────────────────────────

    /// Bind to `map` drawn on `surface`, tearing down any previous binding.
    pub fn attach(&mut self, map: MapInfo, surface: Box<dyn DisplaySurface>) -> Session {
        self.teardown();
        log::info!("marker overlay attached to {:?}", map.id);
        self.binding = Some(Binding { map, surface });
        Session(self.generation)
    }

    /// Remove every overlay and invalidate pending callbacks.
    pub fn detach(&mut self) {
        if self.binding.is_some() {
            log::info!("marker overlay detached");
        }
        self.teardown();
    }

    fn teardown(&mut self) {
        self.dismiss_popup();
        if let Some(mut binding) = self.binding.take() {
            for movable in &self.markers {
                for key in movable.overlay_keys() {
                    binding.surface.remove_overlay(key);
                }
            }
        }
        self.markers.clear();
        self.current = None;
        self.load_pending = false;
        self.generation += 1;
    }

    pub fn is_attached(&self) -> bool {
        self.binding.is_some()
    }

    /// The live session, if attached.
    pub fn session(&self) -> Option<Session> {
        self.binding.as_ref().map(|_| Session(self.generation))
    }

    fn is_live(&self, session: Session) -> bool {
        self.binding.is_some() && session.0 == self.generation
    }

    // ─── Loading & drawing ───────────────────────────────────────────────

    /// Draw the map's markers, or request them from the store if they are
    /// not in memory yet. Never issues a second load while one is pending.
    /// A load the store gave up on is requested again.
    pub fn initialize(&mut self) -> Result<InitOutcome, OverlayError> {
        let map = self.binding.as_ref().ok_or(OverlayError::NotAttached)?.map.id;

        if self.store.markers_loaded(map) {
            self.load_pending = false;
            return Ok(InitOutcome::Drawn(self.draw_markers()));
        }

        if self.load_pending && !self.store.load_pending(map) {
            log::warn!("load of {map:?} ended without markers; requesting again");
            self.load_pending = false;
        }

        let session = Session(self.generation);
        if self.load_pending {
            log::debug!("markers of {map:?} already requested");
            return Ok(InitOutcome::LoadPending(session));
        }

        log::debug!("requesting markers of {map:?}");
        self.store.load(map);
        self.load_pending = true;
        Ok(InitOutcome::LoadRequested(session))
    }

    /// Store listener: the markers of the bound map changed (first load or
    /// external refresh). Redraws everything. Returns `false` when `session`
    /// is stale and the update was dropped.
    pub fn on_markers_updated(&mut self, session: Session) -> bool {
        if !self.is_live(session) {
            log::debug!("dropping marker update for stale {session:?}");
            return false;
        }
        self.load_pending = false;
        let count = self.draw_markers();
        log::debug!("redrew {count} markers");
        true
    }

    /// Replace every drawn marker with a static one at its canonical position.
    fn draw_markers(&mut self) -> usize {
        self.dismiss_popup();
        let Some(Binding { map, surface }) = self.binding.as_mut() else {
            return 0;
        };

        for movable in self.markers.drain(..) {
            for key in movable.overlay_keys() {
                surface.remove_overlay(key);
            }
        }

        let mapper = CoordinateMapper::for_map(map);
        for marker in self.store.markers(map.id) {
            let Some(position) = mapper.marker_position(marker) else {
                log::warn!(
                    "{} ({:?}) has no display position on {:?}; not drawn",
                    marker.id,
                    marker.name,
                    map.id
                );
                continue;
            };
            surface.add_overlay(
                OverlayView::Marker {
                    id: marker.id,
                    form: MarkerForm::Static,
                },
                position,
                self.config.marker_anchor,
            );
            self.markers.push(MovableMarker::new_static(marker.id, position));
        }
        self.markers.len()
    }

    // ─── New markers & external edits ────────────────────────────────────

    /// Create a marker at the center of the visible area, already in its
    /// draggable form. It joins the store's in-memory list right away but is
    /// only saved on its first commit.
    ///
    /// Refused until the map's markers are loaded and drawn, so the first
    /// save cannot replace the persisted list with the new marker alone.
    pub fn add_new_marker(&mut self) -> Result<MarkerId, OverlayError> {
        let Binding { map, surface } = self.binding.as_mut().ok_or(OverlayError::NotAttached)?;
        if self.load_pending || !self.store.markers_loaded(map.id) {
            return Err(OverlayError::MarkersNotLoaded(map.id));
        }

        let (cx, cy) = surface.viewport().visual_center();
        let position = surface.absolute_to_relative(cx, cy);

        let mut marker = Marker::new(self.config.new_marker_name.clone());
        if CoordinateMapper::for_map(map).commit(&mut marker, position) == CommitOutcome::GeoStale {
            log::warn!("new marker {} placed outside the projection domain", marker.id);
        }
        let id = marker.id;
        self.store
            .add_marker(map.id, marker)
            .map_err(|_| OverlayError::MarkersNotLoaded(map.id))?;

        let movable = MovableMarker::new_dynamic(id, position);
        surface.add_overlay(
            OverlayView::DragHandle { marker: id },
            position,
            self.config.handle_anchor,
        );
        surface.add_overlay(
            OverlayView::Marker {
                id,
                form: movable.form(),
            },
            position,
            self.config.marker_anchor,
        );
        self.markers.push(movable);

        log::info!("added {id} at ({}, {})", position.x, position.y);
        Ok(id)
    }

    /// The current marker's stored data was edited elsewhere: move it to its
    /// new canonical position. Its mode is left alone.
    pub fn update_current_marker(&mut self) -> Result<(), OverlayError> {
        let Binding { map, surface } = self.binding.as_mut().ok_or(OverlayError::NotAttached)?;
        let id = self.current.ok_or(OverlayError::NoCurrentMarker)?;
        let marker = self
            .store
            .marker(map.id, id)
            .ok_or(OverlayError::UnknownMarker(id))?;
        let movable = self
            .markers
            .iter_mut()
            .find(|m| m.id() == id)
            .ok_or(OverlayError::UnknownMarker(id))?;

        let Some(position) = CoordinateMapper::for_map(map).marker_position(marker) else {
            log::warn!("edited {id} has no display position; left in place");
            return Ok(());
        };

        movable.set_position(position);
        surface.move_overlay(OverlayKey::Marker(id), position);
        if movable.is_dynamic() {
            surface.move_overlay(OverlayKey::DragHandle(id), position);
        }
        Ok(())
    }

    // ─── Taps & popup ────────────────────────────────────────────────────

    /// Surface tap listener. A static marker opens its popup; a dynamic one
    /// commits. Returns what was done, or `None` for a stale session or an
    /// unknown marker.
    pub fn on_marker_tap(&mut self, session: Session, id: MarkerId) -> Option<TapAction> {
        if !self.is_live(session) {
            log::debug!("dropping tap on {id} from stale {session:?}");
            return None;
        }
        let Some(action) = self.movable(id).map(MovableMarker::tap_action) else {
            log::debug!("tap on unknown marker {id}");
            return None;
        };
        match action {
            TapAction::OpenPopup => self.open_popup_for(id),
            TapAction::Commit => {
                if let Err(err) = self.commit(id) {
                    log::warn!("commit of {id} failed: {err}");
                    return None;
                }
            }
        }
        Some(action)
    }

    fn open_popup_for(&mut self, id: MarkerId) {
        let Some(binding) = self.binding.as_ref() else {
            return;
        };
        let (Some(marker), Some(movable)) = (
            self.store.marker(binding.map.id, id),
            self.markers.iter().find(|m| m.id() == id),
        ) else {
            return;
        };
        let popup = InfoPopup::for_marker(marker, self.config.coordinate_precision);
        let position = movable.position();

        let Some(host) = self.popup_host.as_mut() else {
            log::warn!("no popup host; tap on {id} ignored");
            return;
        };
        if let Some(previous) = self.open_popup.take() {
            host.dismiss(previous);
        }
        host.show(&popup, position, self.config.popup_anchor);
        self.open_popup = Some(id);
    }

    pub fn dismiss_popup(&mut self) {
        if let Some(id) = self.open_popup.take()
            && let Some(host) = self.popup_host.as_mut()
        {
            host.dismiss(id);
        }
    }

    /// Popup action listener. Actions from a stale session or from a popup
    /// that is no longer open are dropped (`Ok(false)`).
    pub fn on_popup_action(
        &mut self,
        session: Session,
        id: MarkerId,
        action: PopupAction,
    ) -> Result<bool, OverlayError> {
        if !self.is_live(session) || self.open_popup != Some(id) {
            log::debug!("dropping {action:?} from closed popup of {id}");
            return Ok(false);
        }
        match action {
            PopupAction::Move => self.begin_move(id)?,
            PopupAction::Edit => self.request_edit(id)?,
        }
        Ok(true)
    }

    // ─── State machine ───────────────────────────────────────────────────
    //
    // These act on the live binding. Host callbacks reach them through the
    // session-checked `on_*` entry points.

    /// Static → Dynamic: attach a drag handle, raise the marker above its
    /// siblings and close the popup.
    pub fn begin_move(&mut self, id: MarkerId) -> Result<(), OverlayError> {
        let Binding { surface, .. } = self.binding.as_mut().ok_or(OverlayError::NotAttached)?;
        let movable = self
            .markers
            .iter_mut()
            .find(|m| m.id() == id)
            .ok_or(OverlayError::UnknownMarker(id))?;
        let position = movable
            .morph_to_dynamic()
            .map(|handle| handle.position())
            .ok_or(OverlayError::NotStatic(id))?;

        surface.add_overlay(
            OverlayView::DragHandle { marker: id },
            position,
            self.config.handle_anchor,
        );
        // Re-adding puts the marker on top of everything, handle included
        surface.remove_overlay(OverlayKey::Marker(id));
        surface.add_overlay(
            OverlayView::Marker {
                id,
                form: MarkerForm::Dynamic,
            },
            position,
            self.config.marker_anchor,
        );
        log::debug!("{id} is now movable");

        self.dismiss_popup();
        Ok(())
    }

    /// Dynamic → Static: write the dragged position into the stored marker,
    /// drop the handle and request a save of the map's marker list.
    pub fn commit(&mut self, id: MarkerId) -> Result<CommitOutcome, OverlayError> {
        let Binding { map, surface } = self.binding.as_mut().ok_or(OverlayError::NotAttached)?;
        let movable = self
            .markers
            .iter_mut()
            .find(|m| m.id() == id)
            .ok_or(OverlayError::UnknownMarker(id))?;
        if !movable.is_dynamic() {
            return Err(OverlayError::NotDynamic(id));
        }

        let marker = self
            .store
            .marker_mut(map.id, id)
            .ok_or(OverlayError::UnknownMarker(id))?;
        let outcome = CoordinateMapper::for_map(map).commit(marker, movable.position());

        if let Some(handle) = movable.morph_to_static() {
            surface.remove_overlay(OverlayKey::DragHandle(handle.marker()));
        }
        surface.restyle_marker(id, MarkerForm::Static);

        self.store.save(map.id);
        log::info!("committed {id} ({outcome:?}), save requested for {:?}", map.id);
        Ok(outcome)
    }

    /// Edit trigger: make `id` the current marker and hand it to the edit
    /// listener. Only static markers can be edited.
    pub fn request_edit(&mut self, id: MarkerId) -> Result<(), OverlayError> {
        let map = self.binding.as_ref().ok_or(OverlayError::NotAttached)?.map.id;
        let movable = self.movable(id).ok_or(OverlayError::UnknownMarker(id))?;
        if movable.is_dynamic() {
            return Err(OverlayError::NotStatic(id));
        }

        self.current = Some(id);
        self.dismiss_popup();

        let marker = self
            .store
            .marker(map, id)
            .ok_or(OverlayError::UnknownMarker(id))?;
        match self.edit_listener.as_mut() {
            Some(listener) => listener.on_request_manage_marker(marker),
            None => log::warn!("no edit listener for {id}"),
        }
        Ok(())
    }

    // ─── Dragging ────────────────────────────────────────────────────────

    /// Drag listener of a marker's handle. Returns `false` for a stale
    /// session or a marker that is unknown or not draggable.
    pub fn on_drag(&mut self, session: Session, id: MarkerId, event: DragEvent) -> bool {
        if !self.is_live(session) {
            log::debug!("dropping {event:?} for {id} from stale {session:?}");
            return false;
        }
        let Some(binding) = self.binding.as_ref() else {
            return false;
        };
        let Some(handle) = self
            .markers
            .iter_mut()
            .find(|m| m.id() == id)
            .and_then(MovableMarker::handle_mut)
        else {
            log::debug!("dropping {event:?} for {id}: no drag handle");
            return false;
        };
        match handle.track(&event) {
            Some(pixels) => {
                let delta = binding.surface.pixel_delta_to_relative(pixels);
                self.drag_by(id, delta)
            }
            None => true,
        }
    }

    /// Move a dynamic marker and its handle by `delta` (relative units).
    pub fn drag_by(&mut self, id: MarkerId, delta: Vec2) -> bool {
        match self.movable(id) {
            Some(movable) => {
                let target = movable.position() + delta;
                self.drag_to(id, target)
            }
            None => false,
        }
    }

    /// Move a dynamic marker and its handle to `position` (relative units).
    pub fn drag_to(&mut self, id: MarkerId, position: Point) -> bool {
        let Some(Binding { surface, .. }) = self.binding.as_mut() else {
            return false;
        };
        let Some(movable) = self
            .markers
            .iter_mut()
            .find(|m| m.id() == id && m.is_dynamic())
        else {
            return false;
        };
        movable.set_position(position);
        surface.move_overlay(OverlayKey::DragHandle(id), position);
        surface.move_overlay(OverlayKey::Marker(id), position);
        true
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn map(&self) -> Option<&MapInfo> {
        self.binding.as_ref().map(|b| &b.map)
    }

    pub fn markers(&self) -> &[MovableMarker] {
        &self.markers
    }

    pub fn movable(&self, id: MarkerId) -> Option<&MovableMarker> {
        self.markers.iter().find(|m| m.id() == id)
    }

    /// Stored data of the current marker.
    pub fn current_marker(&self) -> Option<&Marker> {
        let map = self.binding.as_ref()?.map.id;
        self.store.marker(map, self.current?)
    }

    pub fn current_marker_id(&self) -> Option<MarkerId> {
        self.current
    }

    pub fn open_popup(&self) -> Option<MarkerId> {
        self.open_popup
    }

    pub fn is_load_pending(&self) -> bool {
        self.load_pending
    }
}
