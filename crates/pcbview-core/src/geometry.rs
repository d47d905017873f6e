use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::board::ItemRef;

/// A 2D point or offset in board coordinates (millimeters, y pointing down).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Vec2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Rotate about the origin by `degrees`.
    pub fn rotate(&self, degrees: f64) -> Self {
        if degrees == 0.0 {
            return *self;
        }
        let rad = degrees.to_radians();
        let (sin_r, cos_r) = rad.sin_cos();
        Self {
            x: self.x * cos_r - self.y * sin_r,
            y: self.x * sin_r + self.y * cos_r,
        }
    }

    pub fn min(&self, other: &Vec2) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    pub fn max(&self, other: &Vec2) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// An axis-aligned bounding box.
///
/// `context` points back at the board entity the box was computed for, so a
/// hit-test result can be traced to its source. It is a handle, not an owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ItemRef>,
}

impl BBox {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            context: None,
        }
    }

    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        let min = a.min(&b);
        let max = a.max(&b);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for p in rest {
            min = min.min(p);
            max = max.max(p);
        }
        Some(Self::from_corners(min, max))
    }

    /// Smallest box enclosing every box in `boxes`.
    ///
    /// Returns `None` for an empty sequence. The result carries no context.
    pub fn combine<'a, I>(boxes: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a BBox>,
    {
        let mut iter = boxes.into_iter();
        let first = iter.next()?;
        let mut min = first.start();
        let mut max = first.end();
        for bb in iter {
            min = min.min(&bb.start());
            max = max.max(&bb.end());
        }
        Some(Self::from_corners(min, max))
    }

    pub fn with_context(mut self, context: ItemRef) -> Self {
        self.context = Some(context);
        self
    }

    pub fn start(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn end(&self) -> Vec2 {
        Vec2::new(self.x + self.w, self.y + self.h)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// True when the box has no area in either direction.
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 && self.h <= 0.0
    }

    /// Pad the box by `dx` on the left and right and `dy` on the top and bottom.
    ///
    /// Negative margins shrink the box; width and height never go below zero.
    pub fn grow(&self, dx: f64, dy: f64) -> Self {
        let w = (self.w + dx * 2.0).max(0.0);
        let h = (self.h + dy * 2.0).max(0.0);
        let center = self.center();
        Self {
            x: center.x - w / 2.0,
            y: center.y - h / 2.0,
            w,
            h,
            context: self.context,
        }
    }

    pub fn contains_point(&self, p: &Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.x <= other.x + other.w
            && self.x + self.w >= other.x
            && self.y <= other.y + other.h
            && self.y + self.h >= other.y
    }

    /// Bounds of this box after mapping its corners through `transform`.
    pub fn transform(&self, transform: &Transform) -> Self {
        let corners = [
            transform.apply(&self.start()),
            transform.apply(&Vec2::new(self.x + self.w, self.y)),
            transform.apply(&self.end()),
            transform.apply(&Vec2::new(self.x, self.y + self.h)),
        ];
        // Four corners are never empty.
        let mut bb = Self::from_points(&corners).unwrap_or_default();
        bb.context = self.context;
        bb
    }
}

/// Placement of a footprint's local geometry on the board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation offset.
    pub offset: Vec2,
    /// Rotation in degrees, counter-clockwise as seen on screen.
    pub rotation: f64,
    /// Mirror about the Y axis (footprints placed on the back side).
    pub flip: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            rotation: 0.0,
            flip: false,
        }
    }
}

impl Transform {
    pub fn new(offset: Vec2, rotation: f64, flip: bool) -> Self {
        Self {
            offset,
            rotation,
            flip,
        }
    }

    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            offset: Vec2::new(x, y),
            ..Default::default()
        }
    }

    pub fn apply(&self, point: &Vec2) -> Vec2 {
        let mut p = *point;

        if self.flip {
            p.x = -p.x;
        }

        // y points down, so a counter-clockwise turn on screen is a negative angle.
        p.rotate(-self.rotation) + self.offset
    }

    /// Compose with a nested local transform (pad inside a footprint).
    pub fn then(&self, local: &Transform) -> Transform {
        // A mirrored parent reverses the sense of the child's rotation.
        let rotation = if self.flip {
            self.rotation - local.rotation
        } else {
            self.rotation + local.rotation
        };
        Transform {
            offset: self.apply(&local.offset),
            rotation,
            flip: self.flip != local.flip,
        }
    }
}

/// Approximate an arc through `start`, `mid` and `end` with a polyline.
///
/// Collinear points degrade to the straight segment.
pub fn arc_points(start: Vec2, mid: Vec2, end: Vec2, segments: usize) -> Vec<Vec2> {
    let Some(center) = circumcenter(start, mid, end) else {
        return vec![start, end];
    };
    let radius = center.distance_to(&start);
    let angle_of = |p: Vec2| (p.y - center.y).atan2(p.x - center.x);
    let a0 = angle_of(start);
    let a1 = angle_of(mid);
    let a2 = angle_of(end);

    let tau = std::f64::consts::TAU;
    let norm = |a: f64| a.rem_euclid(tau);
    // Sweep from start to end in whichever direction passes through mid.
    let ccw_to_end = norm(a2 - a0);
    let ccw_to_mid = norm(a1 - a0);
    let sweep = if ccw_to_mid <= ccw_to_end {
        ccw_to_end
    } else {
        ccw_to_end - tau
    };

    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let a = a0 + sweep * (i as f64 / segments as f64);
            Vec2::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

fn circumcenter(a: Vec2, b: Vec2, c: Vec2) -> Option<Vec2> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-12 {
        return None;
    }
    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    Some(Vec2::new(
        (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
        (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
    ))
}
