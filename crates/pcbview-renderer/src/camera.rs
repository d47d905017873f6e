use serde::{Deserialize, Serialize};

use pcbview_core::geometry::{BBox, Vec2};

use crate::renderer::Surface;

const MIN_ZOOM: f64 = 0.001;
const MAX_ZOOM: f64 = 1_000_000.0;

/// The world-space region to show and the pixel size of the output surface.
///
/// The assigned box is kept as given; zoom and center are derived from it so
/// that the whole box fits the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    bbox: BBox,
    /// Output width in pixels.
    pub width: f64,
    /// Output height in pixels.
    pub height: f64,
}

impl Camera {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            bbox: BBox::new(0.0, 0.0, width.max(1.0), height.max(1.0)),
            width,
            height,
        }
    }

    /// The world-space box the camera is fitted to.
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// Fit the camera to `bbox`.
    ///
    /// Degenerate or non-finite boxes are rejected and leave the camera as is.
    pub fn set_bbox(&mut self, bbox: BBox) -> bool {
        let finite = [bbox.x, bbox.y, bbox.w, bbox.h].iter().all(|v| v.is_finite());
        if !finite || bbox.w <= 0.0 || bbox.h <= 0.0 {
            log::debug!("rejecting degenerate camera box {bbox:?}");
            return false;
        }
        self.bbox = BBox { context: None, ..bbox };
        true
    }

    /// Change the output size. Sizes a surface could not have are ignored.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        if let Err(err) = Surface::new(width, height).validate() {
            log::debug!("ignoring camera resize: {err}");
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    /// Pixels per world unit.
    pub fn zoom(&self) -> f64 {
        (self.width / self.bbox.w).min(self.height / self.bbox.h)
    }

    fn has_usable_zoom(&self) -> bool {
        let zoom = self.zoom();
        zoom.is_finite() && zoom > 0.0
    }

    pub fn center(&self) -> Vec2 {
        self.bbox.center()
    }

    /// Pan by a delta in screen pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite() && self.has_usable_zoom()) {
            return;
        }
        let zoom = self.zoom();
        self.bbox.x -= dx / zoom;
        self.bbox.y -= dy / zoom;
    }

    /// Zoom in/out centered on a screen position.
    ///
    /// The world point under `screen` stays under it.
    pub fn zoom_at(&mut self, screen: Vec2, factor: f64) {
        if !(factor.is_finite() && factor > 0.0 && self.has_usable_zoom()) {
            return;
        }
        let zoom = self.zoom();
        let factor = (zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM) / zoom;

        let anchor = self.screen_to_world(screen);
        self.bbox = BBox::new(
            anchor.x + (self.bbox.x - anchor.x) / factor,
            anchor.y + (self.bbox.y - anchor.y) / factor,
            self.bbox.w / factor,
            self.bbox.h / factor,
        );
    }

    /// Convert a screen position to world coordinates.
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let zoom = self.zoom();
        let center = self.center();
        Vec2::new(
            (screen.x - self.width / 2.0) / zoom + center.x,
            (screen.y - self.height / 2.0) / zoom + center.y,
        )
    }

    /// Convert a world position to screen coordinates.
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let zoom = self.zoom();
        let center = self.center();
        Vec2::new(
            (world.x - center.x) * zoom + self.width / 2.0,
            (world.y - center.y) * zoom + self.height / 2.0,
        )
    }

    /// The world region actually visible on the surface. Contains `bbox()`,
    /// widened along one axis when the aspect ratios differ.
    pub fn visible_bounds(&self) -> BBox {
        let zoom = self.zoom();
        let w = self.width / zoom;
        let h = self.height / zoom;
        let center = self.center();
        BBox::new(center.x - w / 2.0, center.y - h / 2.0, w, h)
    }
}
