use serde::{Deserialize, Serialize};

use pcbview_core::geometry::{BBox, Vec2};
use pcbview_core::theme::Color;

use crate::camera::Camera;

/// A world-space draw primitive queued on a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    /// An open polyline stroked with `width`.
    Line {
        points: Vec<Vec2>,
        width: f64,
        color: Color,
    },
    /// A filled polygon.
    Polygon { points: Vec<Vec2>, color: Color },
    /// A filled circle, or a ring when `stroke` is set.
    Circle {
        center: Vec2,
        radius: f64,
        color: Color,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<f64>,
    },
    /// A run of glyphs centered on `at`.
    Text {
        text: String,
        at: Vec2,
        size: Vec2,
        rotation: f64,
        thickness: f64,
        color: Color,
    },
}

impl Primitive {
    pub fn bbox(&self) -> Option<BBox> {
        match self {
            Primitive::Line { points, width, .. } => {
                BBox::from_points(points).map(|bb| bb.grow(width / 2.0, width / 2.0))
            }
            Primitive::Polygon { points, .. } => BBox::from_points(points),
            Primitive::Circle {
                center,
                radius,
                stroke,
                ..
            } => {
                let r = radius + stroke.unwrap_or(0.0) / 2.0;
                Some(BBox::new(center.x - r, center.y - r, r * 2.0, r * 2.0))
            }
            Primitive::Text {
                text,
                at,
                size,
                rotation,
                thickness,
                ..
            } => {
                let chars = text.chars().count();
                if chars == 0 {
                    return None;
                }
                let w = chars as f64 * size.x + thickness;
                let h = size.y + thickness;
                let local = BBox::new(-w / 2.0, -h / 2.0, w, h);
                Some(local.transform(&pcbview_core::Transform::new(*at, *rotation, false)))
            }
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Primitive::Line { color, .. }
            | Primitive::Polygon { color, .. }
            | Primitive::Circle { color, .. }
            | Primitive::Text { color, .. } => *color,
        }
    }
}

/// The queued primitives of one layer, tagged with the layer's name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawList {
    tag: String,
    primitives: Vec<Primitive>,
}

impl DrawList {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            primitives: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn clear(&mut self) {
        self.primitives.clear();
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    /// Stroke a polyline. Fewer than two points draws nothing.
    pub fn line(&mut self, points: Vec<Vec2>, width: f64, color: Color) {
        if points.len() < 2 {
            return;
        }
        self.push(Primitive::Line {
            points,
            width,
            color,
        });
    }

    /// Fill a polygon. Fewer than three points draws nothing.
    pub fn polygon(&mut self, points: Vec<Vec2>, color: Color) {
        if points.len() < 3 {
            return;
        }
        self.push(Primitive::Polygon { points, color });
    }

    pub fn circle(&mut self, center: Vec2, radius: f64, color: Color) {
        self.push(Primitive::Circle {
            center,
            radius,
            color,
            stroke: None,
        });
    }

    pub fn ring(&mut self, center: Vec2, radius: f64, stroke: f64, color: Color) {
        self.push(Primitive::Circle {
            center,
            radius,
            color,
            stroke: Some(stroke),
        });
    }

    pub fn text(
        &mut self,
        text: &str,
        at: Vec2,
        size: Vec2,
        rotation: f64,
        thickness: f64,
        color: Color,
    ) {
        if text.is_empty() {
            return;
        }
        self.push(Primitive::Text {
            text: text.to_string(),
            at,
            size,
            rotation,
            thickness,
            color,
        });
    }

    /// Union of the boxes of primitives queued since index `start`.
    pub fn bbox_since(&self, start: usize) -> Option<BBox> {
        let boxes: Vec<BBox> = self
            .primitives
            .get(start..)
            .unwrap_or_default()
            .iter()
            .filter_map(Primitive::bbox)
            .collect();
        BBox::combine(&boxes)
    }

    pub fn bbox(&self) -> Option<BBox> {
        self.bbox_since(0)
    }
}

/// A primitive projected to screen space, ready for the GPU canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderShape {
    /// "line", "polygon", "circle", "ring" or "text".
    pub kind: String,
    /// Flat array of screen vertices: [x0, y0, x1, y1, ...]
    pub vertices: Vec<f64>,
    /// Stroke width, radius or glyph height in pixels, depending on `kind`.
    pub size: f64,
    /// RGBA with the layer opacity already applied.
    pub color: [f32; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Render data for a single layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderLayer {
    pub name: String,
    pub alpha: f32,
    pub shapes: Vec<RenderShape>,
}

/// Complete render frame handed to the output surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub background: [f32; 4],
    pub camera: Camera,
    /// Layers back to front.
    pub layers: Vec<RenderLayer>,
}

impl RenderFrame {
    pub fn empty(camera: Camera, background: Color) -> Self {
        Self {
            background: background.to_f32_array(1.0),
            camera,
            layers: Vec::new(),
        }
    }

    pub fn layer(&self, name: &str) -> Option<&RenderLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
