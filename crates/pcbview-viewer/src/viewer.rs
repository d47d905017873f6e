use pcbview_core::board::ItemRef;
use pcbview_core::geometry::{BBox, Vec2};
use pcbview_renderer::{Camera, Renderer};

use crate::config::ViewerConfig;
use crate::layers::{LayerHit, LayerSet};

/// Where a viewer is in its lifecycle.
///
/// The types carry the lifecycle: a `ViewerBuilder` is `Uninitialized`,
/// `Loading` only exists inside `ViewerBuilder::load_with`, a built viewer is
/// `Ready` until first driven and then `Interactive`, and `Disposed` is the
/// consumed viewer. Only the first and the two live states can be observed
/// through `state()`; the others name the transitions in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    Uninitialized,
    Loading,
    Ready,
    Interactive,
    Disposed,
}

/// The currently selected item and the box drawn around it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub item: Option<ItemRef>,
    pub bbox: BBox,
}

/// Document-agnostic viewer state: renderer, layers, camera and selection.
#[derive(Debug)]
pub struct DocumentViewer<R: Renderer> {
    renderer: R,
    layers: LayerSet,
    camera: Camera,
    selection: Option<Selection>,
    config: ViewerConfig,
    state: ViewerState,
}

impl<R: Renderer> DocumentViewer<R> {
    pub fn new(renderer: R, layers: LayerSet, camera: Camera, config: ViewerConfig) -> Self {
        Self {
            renderer,
            layers,
            camera,
            selection: None,
            config,
            state: ViewerState::Ready,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerSet {
        &mut self.layers
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    /// Record that a caller has driven the viewer.
    pub fn mark_interactive(&mut self) {
        if self.state == ViewerState::Ready {
            log::debug!("viewer is interactive");
            self.state = ViewerState::Interactive;
        }
    }

    /// Hand every layer to the renderer, back to front.
    pub fn draw(&mut self) {
        let batches = self.layers.batches();
        self.renderer.draw(&self.camera, &batches);
    }

    /// Candidates under a screen position, front to back.
    pub fn pick(&self, screen: Vec2) -> impl Iterator<Item = LayerHit<'_>> + '_ {
        let world = self.camera.screen_to_world(screen);
        self.pick_world(world)
    }

    /// Candidates under a world position, front to back.
    pub fn pick_world(&self, world: Vec2) -> impl Iterator<Item = LayerHit<'_>> + '_ {
        let tolerance = self.config.pick_tolerance.max(0.0) / self.camera.zoom();
        self.layers.query_point(world, tolerance)
    }

    /// Replace the selection, let `paint_overlay` redraw its marker and
    /// redraw.
    pub fn select_bbox<F>(&mut self, bbox: Option<BBox>, paint_overlay: F)
    where
        F: FnOnce(&mut LayerSet, Option<&BBox>),
    {
        self.selection = bbox.map(|bbox| Selection {
            item: bbox.context,
            bbox,
        });
        paint_overlay(&mut self.layers, bbox.as_ref());
        self.draw();
    }

    /// Fit the camera to `bbox` and redraw. Degenerate boxes are ignored.
    pub fn set_camera_bbox(&mut self, bbox: BBox) -> bool {
        if !self.camera.set_bbox(bbox) {
            return false;
        }
        self.draw();
        true
    }

    pub fn zoom_to_page(&mut self, page: BBox) {
        if !self.set_camera_bbox(page) {
            log::warn!("drawing sheet {page:?} has no area");
        }
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.camera.pan(dx, dy);
        self.draw();
    }

    pub fn zoom_at(&mut self, screen: Vec2, factor: f64) {
        self.camera.zoom_at(screen, factor);
        self.draw();
    }

    /// Follow a surface resize. Empty or non-finite sizes are ignored and
    /// the viewer keeps its last good size.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        if !self.camera.resize(width, height) {
            log::warn!("ignoring resize to {width}x{height}");
            return false;
        }
        self.renderer.resize(width, height);
        self.draw();
        true
    }

    /// Tear down, handing the renderer back.
    pub fn dispose(self) -> R {
        log::info!("viewer {:?} -> {:?}", self.state, ViewerState::Disposed);
        self.renderer
    }
}
