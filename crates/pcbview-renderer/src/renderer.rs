use thiserror::Error;

use pcbview_core::geometry::Vec2;
use pcbview_core::theme::Color;

use crate::camera::Camera;
use crate::render_data::{DrawList, Primitive, RenderFrame, RenderLayer, RenderShape};

/// Failure to acquire a drawing context. Fatal to the viewer being built.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RendererInitError {
    #[error("surface has no drawable area ({width}x{height})")]
    EmptySurface { width: f64, height: f64 },

    #[error("rendering backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Handle to the output a renderer draws into.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
}

impl Surface {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Reject zero, negative or non-finite sizes.
    pub fn validate(&self) -> Result<(), RendererInitError> {
        let ok = self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0;
        if ok {
            Ok(())
        } else {
            Err(RendererInitError::EmptySurface {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// One layer handed to [`Renderer::draw`].
#[derive(Debug, Clone, Copy)]
pub struct LayerBatch<'a> {
    pub name: &'a str,
    pub visible: bool,
    pub opacity: f32,
    pub draw_list: &'a DrawList,
}

impl LayerBatch<'_> {
    /// Invisible and fully transparent layers are skipped entirely.
    pub fn is_drawn(&self) -> bool {
        self.visible && self.opacity > 0.0
    }

    pub fn alpha(&self) -> f32 {
        if self.opacity.is_nan() {
            0.0
        } else {
            self.opacity.clamp(0.0, 1.0)
        }
    }
}

/// A drawing backend bound to an output surface.
pub trait Renderer {
    /// Acquire the backend for `surface`.
    fn create(surface: &Surface) -> Result<Self, RendererInitError>
    where
        Self: Sized;

    /// Follow a surface size change. Sizes rejected by [`Surface::validate`]
    /// leave the renderer at its last good size.
    fn resize(&mut self, width: f64, height: f64);

    fn set_background(&mut self, color: Color);

    /// Composite `layers` in the given order (back to front) and present.
    fn draw(&mut self, camera: &Camera, layers: &[LayerBatch<'_>]);
}

/// Renderer that projects layers into [`RenderFrame`]s for a GPU canvas.
#[derive(Debug)]
pub struct FrameRenderer {
    width: f64,
    height: f64,
    background: Color,
    last_frame: Option<RenderFrame>,
    frames_presented: usize,
}

impl FrameRenderer {
    pub fn last_frame(&self) -> Option<&RenderFrame> {
        self.last_frame.as_ref()
    }

    pub fn frames_presented(&self) -> usize {
        self.frames_presented
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn project(camera: &Camera, points: &[Vec2]) -> Vec<f64> {
        points
            .iter()
            .flat_map(|p| {
                let s = camera.world_to_screen(*p);
                [s.x, s.y]
            })
            .collect()
    }

    fn render_shape(camera: &Camera, primitive: &Primitive, alpha: f32) -> RenderShape {
        let zoom = camera.zoom();
        let color = primitive.color().to_f32_array(alpha);
        match primitive {
            Primitive::Line { points, width, .. } => RenderShape {
                kind: "line".to_string(),
                vertices: Self::project(camera, points),
                size: width * zoom,
                color,
                text: None,
            },
            Primitive::Polygon { points, .. } => RenderShape {
                kind: "polygon".to_string(),
                vertices: Self::project(camera, points),
                size: 0.0,
                color,
                text: None,
            },
            Primitive::Circle {
                center,
                radius,
                stroke,
                ..
            } => RenderShape {
                kind: if stroke.is_some() { "ring" } else { "circle" }.to_string(),
                vertices: Self::project(camera, std::slice::from_ref(center)),
                size: radius * zoom,
                color,
                text: None,
            },
            Primitive::Text { text, at, size, .. } => RenderShape {
                kind: "text".to_string(),
                vertices: Self::project(camera, std::slice::from_ref(at)),
                size: size.y * zoom,
                color,
                text: Some(text.clone()),
            },
        }
    }
}

impl Renderer for FrameRenderer {
    fn create(surface: &Surface) -> Result<Self, RendererInitError> {
        surface.validate()?;
        log::debug!("frame renderer bound to {}x{} surface", surface.width, surface.height);
        Ok(Self {
            width: surface.width,
            height: surface.height,
            background: Color::BLACK,
            last_frame: None,
            frames_presented: 0,
        })
    }

    fn resize(&mut self, width: f64, height: f64) {
        if let Err(err) = Surface::new(width, height).validate() {
            log::warn!("keeping {}x{} surface: {err}", self.width, self.height);
            return;
        }
        self.width = width;
        self.height = height;
    }

    fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    fn draw(&mut self, camera: &Camera, layers: &[LayerBatch<'_>]) {
        let visible = camera.visible_bounds();
        let mut frame = RenderFrame::empty(*camera, self.background);

        for batch in layers.iter().filter(|b| b.is_drawn()) {
            let alpha = batch.alpha();
            let shapes = batch
                .draw_list
                .primitives()
                .iter()
                .filter(|p| p.bbox().is_some_and(|bb| bb.intersects(&visible)))
                .map(|p| Self::render_shape(camera, p, alpha))
                .collect();
            frame.layers.push(RenderLayer {
                name: batch.name.to_string(),
                alpha,
                shapes,
            });
        }

        self.frames_presented += 1;
        self.last_frame = Some(frame);
    }
}
