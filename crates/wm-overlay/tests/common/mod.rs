//! Recording fakes for the collaborators of `MarkerOverlay`.
//!
//! Each fake shares its log through `Rc<RefCell<_>>` so the test keeps a
//! handle after boxing the fake into the engine.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use wm_core::{MapId, MapInfo, Marker, MarkerId, MarkerStore, Point, Vec2};
use wm_overlay::{
    Anchor, DisplaySurface, EditListener, InfoPopup, MarkerForm, MarkerOverlay, OverlayConfig,
    OverlayKey, OverlayView, PixelTranslator, PopupHost, Session, ViewportState,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ─── Surface ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub key: OverlayKey,
    pub form: Option<MarkerForm>,
    pub at: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Add(OverlayKey),
    Remove(OverlayKey),
    Move(OverlayKey, Point),
    Restyle(MarkerId, MarkerForm),
}

#[derive(Debug, Default)]
pub struct SurfaceLog {
    /// Overlays currently on the surface, bottom first.
    pub overlays: Vec<Placed>,
    pub ops: Vec<SurfaceOp>,
}

impl SurfaceLog {
    pub fn get(&self, key: OverlayKey) -> Option<&Placed> {
        self.overlays.iter().find(|p| p.key == key)
    }

    pub fn position(&self, key: OverlayKey) -> Option<Point> {
        self.get(key).map(|p| p.at)
    }

    pub fn form(&self, id: MarkerId) -> Option<MarkerForm> {
        self.get(OverlayKey::Marker(id)).and_then(|p| p.form)
    }

    pub fn z_index(&self, key: OverlayKey) -> Option<usize> {
        self.overlays.iter().position(|p| p.key == key)
    }

    pub fn count(&self, key: OverlayKey) -> usize {
        self.overlays.iter().filter(|p| p.key == key).count()
    }
}

pub struct FakeSurface {
    log: Rc<RefCell<SurfaceLog>>,
    viewport: ViewportState,
    translator: PixelTranslator,
}

impl FakeSurface {
    /// A 200×100 px surface at scale 1 showing lon 4..6, lat 46..44.
    /// Its visual center is pixel (100, 50), i.e. lat 45, lon 5.
    pub fn recording() -> (Self, Rc<RefCell<SurfaceLog>>) {
        Self::with_translator(PixelTranslator::new(4.0, 46.0, 6.0, 44.0, 200.0, 100.0))
    }

    pub fn with_translator(translator: PixelTranslator) -> (Self, Rc<RefCell<SurfaceLog>>) {
        let log = Rc::new(RefCell::new(SurfaceLog::default()));
        let surface = Self {
            log: Rc::clone(&log),
            viewport: ViewportState {
                scroll_x: 0,
                scroll_y: 0,
                width: 200,
                height: 100,
                offset_x: 0,
                offset_y: 0,
                scale: 1.0,
            },
            translator,
        };
        (surface, log)
    }
}

impl DisplaySurface for FakeSurface {
    fn add_overlay(&mut self, view: OverlayView, at: Point, _anchor: Anchor) {
        let form = match view {
            OverlayView::Marker { form, .. } => Some(form),
            OverlayView::DragHandle { .. } => None,
        };
        let mut log = self.log.borrow_mut();
        log.overlays.push(Placed {
            key: view.key(),
            form,
            at,
        });
        log.ops.push(SurfaceOp::Add(view.key()));
    }

    fn remove_overlay(&mut self, key: OverlayKey) {
        let mut log = self.log.borrow_mut();
        log.overlays.retain(|p| p.key != key);
        log.ops.push(SurfaceOp::Remove(key));
    }

    fn move_overlay(&mut self, key: OverlayKey, at: Point) {
        let mut log = self.log.borrow_mut();
        for placed in log.overlays.iter_mut().filter(|p| p.key == key) {
            placed.at = at;
        }
        log.ops.push(SurfaceOp::Move(key, at));
    }

    fn restyle_marker(&mut self, id: MarkerId, form: MarkerForm) {
        let mut log = self.log.borrow_mut();
        for placed in log
            .overlays
            .iter_mut()
            .filter(|p| p.key == OverlayKey::Marker(id))
        {
            placed.form = Some(form);
        }
        log.ops.push(SurfaceOp::Restyle(id, form));
    }

    fn viewport(&self) -> ViewportState {
        self.viewport
    }

    fn absolute_to_relative(&self, x: f64, y: f64) -> Point {
        self.translator
            .absolute_to_relative(x, y, self.viewport.scale)
    }

    fn pixel_delta_to_relative(&self, delta: Vec2) -> Vec2 {
        self.translator
            .pixel_delta_to_relative(delta, self.viewport.scale)
    }
}

// ─── Popup host & edit listener ──────────────────────────────────────────

#[derive(Debug, Default)]
pub struct PopupLog {
    pub shown: Vec<InfoPopup>,
    pub dismissed: Vec<MarkerId>,
    pub open: Option<MarkerId>,
}

pub struct FakePopups(Rc<RefCell<PopupLog>>);

impl PopupHost for FakePopups {
    fn show(&mut self, popup: &InfoPopup, _at: Point, _anchor: Anchor) {
        let mut log = self.0.borrow_mut();
        log.shown.push(popup.clone());
        log.open = Some(popup.marker);
    }

    fn dismiss(&mut self, marker: MarkerId) {
        let mut log = self.0.borrow_mut();
        log.dismissed.push(marker);
        if log.open == Some(marker) {
            log.open = None;
        }
    }
}

#[derive(Debug, Default)]
pub struct EditLog {
    pub requests: Vec<Marker>,
}

pub struct FakeEditor(Rc<RefCell<EditLog>>);

impl EditListener for FakeEditor {
    fn on_request_manage_marker(&mut self, marker: &Marker) {
        self.0.borrow_mut().requests.push(marker.clone());
    }
}

// ─── Harness ─────────────────────────────────────────────────────────────

pub struct Harness<S: MarkerStore> {
    pub engine: MarkerOverlay<S>,
    pub surface: Rc<RefCell<SurfaceLog>>,
    pub popups: Rc<RefCell<PopupLog>>,
    pub edits: Rc<RefCell<EditLog>>,
}

impl<S: MarkerStore> Harness<S> {
    /// Engine over `store`, attached to `map` on a fresh `FakeSurface`.
    pub fn attached(store: S, map: MapInfo) -> Self {
        init_logging();
        let mut engine = MarkerOverlay::new(store, OverlayConfig::default());
        let popups = Rc::new(RefCell::new(PopupLog::default()));
        let edits = Rc::new(RefCell::new(EditLog::default()));
        engine.set_popup_host(Box::new(FakePopups(Rc::clone(&popups))));
        engine.set_edit_listener(Box::new(FakeEditor(Rc::clone(&edits))));

        let (surface, surface_log) = FakeSurface::recording();
        engine.attach(map, Box::new(surface));
        Self {
            engine,
            surface: surface_log,
            popups,
            edits,
        }
    }

    /// The live session; the one host callbacks are registered under.
    pub fn session(&self) -> Session {
        self.engine.session().expect("attached")
    }

    pub fn marker(&self, id: MarkerId) -> Marker {
        let map = self.engine.map().expect("attached").id;
        self.engine
            .store()
            .marker(map, id)
            .cloned()
            .expect("marker in store")
    }
}

pub fn plain_map(name: &str) -> MapInfo {
    MapInfo::new(MapId::intern(name), name)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
