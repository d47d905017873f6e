use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{arc_points, BBox, Transform, Vec2};
use crate::layer::{names, BoardLayer};

/// Logical net number. Net 0 is "unconnected".
pub type NetId = u32;

/// Segments used to approximate arcs and circles.
pub const ARC_SEGMENTS: usize = 32;

/// Handle to a top-level board entity, by collection and index.
///
/// Used as the back-reference carried by [`BBox::context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum ItemRef {
    Footprint(usize),
    Segment(usize),
    Via(usize),
    Zone(usize),
    Drawing(usize),
}

impl ItemRef {
    pub fn is_footprint(&self) -> bool {
        matches!(self, ItemRef::Footprint(_))
    }
}

/// Page size of the drawing sheet, in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub size: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub portrait: bool,
}

impl Default for Paper {
    fn default() -> Self {
        Self::from_size_name("A4").unwrap_or_else(|| Self::custom(297.0, 210.0))
    }
}

impl Paper {
    /// Standard landscape sheet sizes.
    pub fn from_size_name(size: &str) -> Option<Self> {
        let (width, height) = match size {
            "A5" => (210.0, 148.0),
            "A4" => (297.0, 210.0),
            "A3" => (420.0, 297.0),
            "A2" => (594.0, 420.0),
            "A1" => (841.0, 594.0),
            "A0" => (1189.0, 841.0),
            "A" => (279.4, 215.9),
            "B" => (431.8, 279.4),
            "C" => (558.8, 431.8),
            "D" => (863.6, 558.8),
            "E" => (1117.6, 863.6),
            "USLetter" => (279.4, 215.9),
            "USLegal" => (355.6, 215.9),
            "USLedger" => (431.8, 279.4),
            _ => return None,
        };
        Some(Self {
            size: size.to_string(),
            width,
            height,
            portrait: false,
        })
    }

    pub fn custom(width: f64, height: f64) -> Self {
        Self {
            size: "User".to_string(),
            width,
            height,
            portrait: false,
        }
    }

    /// The full sheet extent.
    pub fn bbox(&self) -> BBox {
        if self.portrait {
            BBox::new(0.0, 0.0, self.height, self.width)
        } else {
            BBox::new(0.0, 0.0, self.width, self.height)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Setup {
    #[serde(default)]
    pub grid_origin: Option<Vec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Net {
    pub number: NetId,
    pub name: String,
}

// ── Graphics ─────────────────────────────────────────────────────────

/// The geometric part of a graphic item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Line { start: Vec2, end: Vec2 },
    Rect { start: Vec2, end: Vec2 },
    Circle { center: Vec2, end: Vec2 },
    Arc { start: Vec2, mid: Vec2, end: Vec2 },
    Poly { points: Vec<Vec2> },
}

impl Shape {
    /// Outline vertices; closed shapes do not repeat the first point.
    pub fn points(&self) -> Vec<Vec2> {
        match self {
            Shape::Line { start, end } => vec![*start, *end],
            Shape::Rect { start, end } => vec![
                *start,
                Vec2::new(end.x, start.y),
                *end,
                Vec2::new(start.x, end.y),
            ],
            Shape::Circle { center, end } => {
                let r = center.distance_to(end);
                (0..ARC_SEGMENTS)
                    .map(|i| {
                        let a = std::f64::consts::TAU * i as f64 / ARC_SEGMENTS as f64;
                        Vec2::new(center.x + r * a.cos(), center.y + r * a.sin())
                    })
                    .collect()
            }
            Shape::Arc { start, mid, end } => arc_points(*start, *mid, *end, ARC_SEGMENTS),
            Shape::Poly { points } => points.clone(),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Shape::Rect { .. } | Shape::Circle { .. } | Shape::Poly { .. })
    }
}

/// A line, rectangle, circle, arc or polygon on a single layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicItem {
    pub layer: String,
    #[serde(flatten)]
    pub shape: Shape,
    #[serde(default = "default_stroke_width")]
    pub width: f64,
    #[serde(default)]
    pub fill: bool,
}

fn default_stroke_width() -> f64 {
    0.1
}

impl GraphicItem {
    pub fn new(layer: &str, shape: Shape, width: f64) -> Self {
        Self {
            layer: layer.to_string(),
            shape,
            width,
            fill: false,
        }
    }

    pub fn bbox(&self) -> Option<BBox> {
        let half_w = self.width / 2.0;
        BBox::from_points(&self.shape.points()).map(|bb| bb.grow(half_w, half_w))
    }
}

/// A single line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub layer: String,
    pub text: String,
    pub at: Vec2,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_text_size")]
    pub size: Vec2,
    #[serde(default = "default_stroke_width")]
    pub thickness: f64,
    #[serde(default)]
    pub hide: bool,
}

fn default_text_size() -> Vec2 {
    Vec2::new(1.0, 1.0)
}

impl Text {
    pub fn new(layer: &str, text: &str, at: Vec2) -> Self {
        Self {
            layer: layer.to_string(),
            text: text.to_string(),
            at,
            rotation: 0.0,
            size: default_text_size(),
            thickness: default_stroke_width(),
            hide: false,
        }
    }

    /// Approximate extent: one glyph cell per character, centered on `at`.
    pub fn bbox(&self) -> Option<BBox> {
        let chars = self.text.chars().count();
        if chars == 0 {
            return None;
        }
        let w = chars as f64 * self.size.x;
        let h = self.size.y;
        let stroke = self.thickness / 2.0;
        let local = BBox::new(-w / 2.0, -h / 2.0, w, h).grow(stroke, stroke);
        Some(local.transform(&Transform::new(self.at, self.rotation, false)))
    }
}

/// A dimension annotation. Never part of the printed board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub layer: String,
    pub start: Vec2,
    pub end: Vec2,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_stroke_width")]
    pub width: f64,
}

impl Dimension {
    pub fn bbox(&self) -> BBox {
        BBox::from_corners(self.start, self.end).grow(self.width / 2.0, self.width / 2.0)
    }
}

/// Board-level drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Drawing {
    Graphic(GraphicItem),
    Text(Text),
    Dimension(Dimension),
}

impl Drawing {
    pub fn layer(&self) -> &str {
        match self {
            Drawing::Graphic(g) => &g.layer,
            Drawing::Text(t) => &t.layer,
            Drawing::Dimension(d) => &d.layer,
        }
    }

    /// Annotations are drawn but never count toward the board outline.
    pub fn is_annotation(&self) -> bool {
        matches!(self, Drawing::Dimension(_))
    }

    pub fn bbox(&self) -> Option<BBox> {
        match self {
            Drawing::Graphic(g) => g.bbox(),
            Drawing::Text(t) => t.bbox(),
            Drawing::Dimension(d) => Some(d.bbox()),
        }
    }
}

// ── Copper ───────────────────────────────────────────────────────────

/// A track segment, straight or arced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Vec2,
    #[serde(default)]
    pub mid: Option<Vec2>,
    pub end: Vec2,
    pub width: f64,
    pub layer: String,
    #[serde(default)]
    pub net: NetId,
}

impl Segment {
    pub fn line(start: Vec2, end: Vec2, width: f64, layer: &str, net: NetId) -> Self {
        Self {
            start,
            mid: None,
            end,
            width,
            layer: layer.to_string(),
            net,
        }
    }

    /// Centerline vertices.
    pub fn points(&self) -> Vec<Vec2> {
        match self.mid {
            Some(mid) => arc_points(self.start, mid, self.end, ARC_SEGMENTS),
            None => vec![self.start, self.end],
        }
    }

    pub fn bbox(&self) -> BBox {
        let half_w = self.width / 2.0;
        BBox::from_points(&self.points())
            .unwrap_or_default()
            .grow(half_w, half_w)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViaType {
    #[default]
    Through,
    BlindBuried,
    Micro,
}

/// A plated hole connecting copper layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Via {
    pub at: Vec2,
    pub size: f64,
    pub drill: f64,
    #[serde(default)]
    pub via_type: ViaType,
    #[serde(default = "default_via_layers")]
    pub layers: [String; 2],
    #[serde(default)]
    pub net: NetId,
}

fn default_via_layers() -> [String; 2] {
    [names::F_CU.to_string(), names::B_CU.to_string()]
}

impl Via {
    pub fn new(at: Vec2, size: f64, drill: f64, net: NetId) -> Self {
        Self {
            at,
            size,
            drill,
            via_type: ViaType::Through,
            layers: default_via_layers(),
            net,
        }
    }

    pub fn bbox(&self) -> BBox {
        let r = self.size / 2.0;
        BBox::new(self.at.x - r, self.at.y - r, self.size, self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilledPolygon {
    pub layer: String,
    pub points: Vec<Vec2>,
}

/// A copper pour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub layers: Vec<String>,
    #[serde(default)]
    pub net: NetId,
    #[serde(default)]
    pub name: Option<String>,
    pub outline: Vec<Vec2>,
    #[serde(default)]
    pub filled_polygons: Vec<FilledPolygon>,
}

impl Zone {
    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.outline).or_else(|| {
            let boxes: Vec<BBox> = self
                .filled_polygons
                .iter()
                .filter_map(|p| BBox::from_points(&p.points))
                .collect();
            BBox::combine(&boxes)
        })
    }
}

// ── Footprints ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadKind {
    ThruHole,
    Smd,
    Connect,
    NpThruHole,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadShape {
    Circle,
    Rect,
    Oval,
    RoundRect { ratio: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Drill {
    pub diameter: f64,
    #[serde(default)]
    pub offset: Vec2,
}

/// A pad, positioned relative to its footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub number: String,
    pub kind: PadKind,
    pub shape: PadShape,
    pub at: Vec2,
    #[serde(default)]
    pub rotation: f64,
    pub size: Vec2,
    pub layers: Vec<String>,
    #[serde(default)]
    pub drill: Option<Drill>,
    #[serde(default)]
    pub net: Option<NetId>,
}

impl Pad {
    pub fn transform(&self) -> Transform {
        Transform::new(self.at, self.rotation, false)
    }

    /// Pad extent in pad-local coordinates.
    pub fn local_bbox(&self) -> BBox {
        BBox::new(-self.size.x / 2.0, -self.size.y / 2.0, self.size.x, self.size.y)
    }

    /// Pad outline in pad-local coordinates.
    pub fn outline(&self) -> Vec<Vec2> {
        let hw = self.size.x / 2.0;
        let hh = self.size.y / 2.0;
        match self.shape {
            PadShape::Circle => ellipse(hw, hw),
            PadShape::Oval => stadium(hw, hh),
            PadShape::Rect => vec![
                Vec2::new(-hw, -hh),
                Vec2::new(hw, -hh),
                Vec2::new(hw, hh),
                Vec2::new(-hw, hh),
            ],
            PadShape::RoundRect { ratio } => {
                let r = hw.min(hh) * 2.0 * ratio.clamp(0.0, 0.5);
                rounded_rect(hw, hh, r)
            }
        }
    }
}

fn ellipse(rx: f64, ry: f64) -> Vec<Vec2> {
    (0..ARC_SEGMENTS)
        .map(|i| {
            let a = std::f64::consts::TAU * i as f64 / ARC_SEGMENTS as f64;
            Vec2::new(rx * a.cos(), ry * a.sin())
        })
        .collect()
}

fn stadium(hw: f64, hh: f64) -> Vec<Vec2> {
    let r = hw.min(hh);
    rounded_rect(hw, hh, r)
}

fn rounded_rect(hw: f64, hh: f64, r: f64) -> Vec<Vec2> {
    if r <= 0.0 {
        return vec![
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ];
    }
    let quarter = ARC_SEGMENTS / 4;
    let corners = [
        (Vec2::new(hw - r, hh - r), 0.0),
        (Vec2::new(-hw + r, hh - r), 90.0),
        (Vec2::new(-hw + r, -hh + r), 180.0),
        (Vec2::new(hw - r, -hh + r), 270.0),
    ];
    let mut points = Vec::with_capacity((quarter + 1) * 4);
    for (center, start) in corners {
        for i in 0..=quarter {
            let a = (start + 90.0 * i as f64 / quarter as f64).to_radians();
            points.push(Vec2::new(center.x + r * a.cos(), center.y + r * a.sin()));
        }
    }
    points
}

/// A placed component: pads plus its own graphics and texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    #[serde(default = "Uuid::new_v4")]
    pub uuid: Uuid,
    pub reference: String,
    #[serde(default)]
    pub value: String,
    #[serde(default = "default_footprint_layer")]
    pub layer: String,
    pub at: Vec2,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub graphics: Vec<GraphicItem>,
    #[serde(default)]
    pub texts: Vec<Text>,
    #[serde(default)]
    pub pads: Vec<Pad>,
}

fn default_footprint_layer() -> String {
    names::F_CU.to_string()
}

impl Footprint {
    pub fn new(reference: &str, at: Vec2) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            reference: reference.to_string(),
            value: String::new(),
            layer: default_footprint_layer(),
            at,
            rotation: 0.0,
            graphics: Vec::new(),
            texts: Vec::new(),
            pads: Vec::new(),
        }
    }

    pub fn is_back(&self) -> bool {
        self.layer == names::B_CU
    }

    /// Footprint-local to board coordinates.
    pub fn transform(&self) -> Transform {
        Transform::new(self.at, self.rotation, self.is_back())
    }

    /// Nominal extent over pads and graphics. Texts are left out, so a long
    /// reference label does not widen the footprint.
    pub fn bbox(&self) -> Option<BBox> {
        self.bbox_filtered(|_| true)
    }

    /// Extent over the pads plus the graphics whose layer passes `filter`.
    pub fn bbox_filtered<F>(&self, filter: F) -> Option<BBox>
    where
        F: Fn(&str) -> bool,
    {
        let transform = self.transform();
        let pads = self
            .pads
            .iter()
            .map(|pad| pad.local_bbox().transform(&transform.then(&pad.transform())));
        let graphics = self
            .graphics
            .iter()
            .filter(|g| filter(&g.layer))
            .filter_map(|g| g.bbox())
            .map(|bb| bb.transform(&transform));
        let boxes: Vec<BBox> = pads.chain(graphics).collect();
        BBox::combine(&boxes)
    }
}

// ── Board ────────────────────────────────────────────────────────────

/// A borrowed view of one top-level board entity.
#[derive(Debug, Clone, Copy)]
pub enum BoardItem<'a> {
    Footprint(&'a Footprint),
    Segment(&'a Segment),
    Via(&'a Via),
    Zone(&'a Zone),
    Drawing(&'a Drawing),
}

impl BoardItem<'_> {
    pub fn bbox(&self) -> Option<BBox> {
        match self {
            BoardItem::Footprint(fp) => fp.bbox(),
            BoardItem::Segment(s) => Some(s.bbox()),
            BoardItem::Via(v) => Some(v.bbox()),
            BoardItem::Zone(z) => z.bbox(),
            BoardItem::Drawing(d) => d.bbox(),
        }
    }

    /// Whether any copper of this item belongs to `net`.
    pub fn on_net(&self, net: NetId) -> bool {
        match self {
            BoardItem::Footprint(fp) => fp.pads.iter().any(|p| p.net == Some(net)),
            BoardItem::Segment(s) => s.net == net,
            BoardItem::Via(v) => v.net == net,
            BoardItem::Zone(z) => z.net == net,
            BoardItem::Drawing(_) => false,
        }
    }
}

/// A parsed printed-circuit-board document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub paper: Paper,
    #[serde(default)]
    pub layers: Vec<BoardLayer>,
    #[serde(default)]
    pub setup: Option<Setup>,
    #[serde(default)]
    pub nets: Vec<Net>,
    #[serde(default)]
    pub footprints: Vec<Footprint>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub vias: Vec<Via>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub drawings: Vec<Drawing>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every top-level entity: footprints, segments, vias, zones, drawings.
    pub fn items(&self) -> impl Iterator<Item = (ItemRef, BoardItem<'_>)> + '_ {
        let footprints = self
            .footprints
            .iter()
            .enumerate()
            .map(|(i, fp)| (ItemRef::Footprint(i), BoardItem::Footprint(fp)));
        let segments = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, s)| (ItemRef::Segment(i), BoardItem::Segment(s)));
        let vias = self
            .vias
            .iter()
            .enumerate()
            .map(|(i, v)| (ItemRef::Via(i), BoardItem::Via(v)));
        let zones = self
            .zones
            .iter()
            .enumerate()
            .map(|(i, z)| (ItemRef::Zone(i), BoardItem::Zone(z)));
        let drawings = self
            .drawings
            .iter()
            .enumerate()
            .map(|(i, d)| (ItemRef::Drawing(i), BoardItem::Drawing(d)));
        footprints
            .chain(segments)
            .chain(vias)
            .chain(zones)
            .chain(drawings)
    }

    pub fn item(&self, item: ItemRef) -> Option<BoardItem<'_>> {
        match item {
            ItemRef::Footprint(i) => self.footprints.get(i).map(BoardItem::Footprint),
            ItemRef::Segment(i) => self.segments.get(i).map(BoardItem::Segment),
            ItemRef::Via(i) => self.vias.get(i).map(BoardItem::Via),
            ItemRef::Zone(i) => self.zones.get(i).map(BoardItem::Zone),
            ItemRef::Drawing(i) => self.drawings.get(i).map(BoardItem::Drawing),
        }
    }

    /// Nominal bounding box of an entity, with the entity as context.
    pub fn item_bbox(&self, item: ItemRef) -> Option<BBox> {
        self.item(item)?.bbox().map(|bb| bb.with_context(item))
    }

    /// Look up a footprint by UUID or reference designator.
    pub fn find_footprint(&self, key: &str) -> Option<(usize, &Footprint)> {
        let uuid = Uuid::parse_str(key).ok();
        self.footprints
            .iter()
            .enumerate()
            .find(|(_, fp)| Some(fp.uuid) == uuid || fp.reference == key)
    }

    pub fn net_name(&self, number: NetId) -> Option<&str> {
        self.nets
            .iter()
            .find(|n| n.number == number)
            .map(|n| n.name.as_str())
    }

    pub fn grid_origin(&self) -> Option<Vec2> {
        self.setup.as_ref().and_then(|s| s.grid_origin)
    }

    /// The drawing-sheet extent.
    pub fn page_bbox(&self) -> BBox {
        self.paper.bbox()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
            && self.segments.is_empty()
            && self.vias.is_empty()
            && self.zones.is_empty()
            && self.drawings.is_empty()
    }

    // ── Serialization ────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
