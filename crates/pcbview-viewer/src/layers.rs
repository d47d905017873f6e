use std::collections::HashMap;

use pcbview_core::board::{Board, ItemRef};
use pcbview_core::geometry::{BBox, Vec2};
use pcbview_core::layer::{self, names};
use pcbview_core::spatial::SpatialIndex;
use pcbview_core::theme::{BoardTheme, Color};
use pcbview_renderer::{DrawList, LayerBatch};

/// Names of the viewer's virtual layers.
pub mod layer_names {
    pub const DRAWING_SHEET: &str = ":DrawingSheet";
    pub const GRID: &str = ":Grid";
    pub const PADS_FRONT: &str = ":Pads:Front";
    pub const PADS_BACK: &str = ":Pads:Back";
    pub const VIA_THROUGH: &str = ":Via:Through";
    pub const VIA_BURIED_BLIND: &str = ":Via:BuriedBlind";
    pub const VIA_MICRO: &str = ":Via:MicroVia";
    pub const VIA_HOLES: &str = ":Via:Holes";
    pub const PAD_HOLE_WALLS: &str = ":Pad:HoleWalls";
    pub const PAD_HOLES: &str = ":Pad:Holes";
    pub const HIGHLIGHT: &str = ":Highlight";
    pub const OVERLAY: &str = ":Overlay";

    /// The zone layer drawn beneath copper layer `copper`.
    pub fn zone_layer(copper: &str) -> String {
        format!(":Zones:{copper}")
    }
}

/// What a view layer holds. Drives the category iterators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    DrawingSheet,
    Grid,
    Technical,
    Copper,
    Zone,
    Pad,
    Via,
    PadHole,
    ViaHole,
    User,
    Highlight,
    Overlay,
}

impl LayerKind {
    /// Layers that carry pickable board geometry.
    pub fn is_interactive(&self) -> bool {
        !matches!(
            self,
            LayerKind::DrawingSheet | LayerKind::Grid | LayerKind::Highlight | LayerKind::Overlay
        )
    }
}

/// The groups of layers the opacity controls act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerCategory {
    Copper,
    Via,
    Pad,
    PadHole,
    Zone,
    Grid,
    DrawingSheet,
}

impl LayerCategory {
    pub fn includes(&self, kind: LayerKind) -> bool {
        match self {
            LayerCategory::Copper => kind == LayerKind::Copper,
            LayerCategory::Via => matches!(kind, LayerKind::Via | LayerKind::ViaHole),
            LayerCategory::Pad => kind == LayerKind::Pad,
            LayerCategory::PadHole => kind == LayerKind::PadHole,
            LayerCategory::Zone => kind == LayerKind::Zone,
            LayerCategory::Grid => kind == LayerKind::Grid,
            LayerCategory::DrawingSheet => kind == LayerKind::DrawingSheet,
        }
    }
}

/// A named bucket of draw primitives with its own opacity and visibility.
#[derive(Debug)]
pub struct ViewLayer {
    name: String,
    kind: LayerKind,
    color: Color,
    opacity: f32,
    /// Hidden layers are neither drawn nor picked.
    pub visible: bool,
    draw_list: DrawList,
    bboxes: Vec<BBox>,
    index: SpatialIndex,
}

impl ViewLayer {
    pub fn new(name: &str, kind: LayerKind, color: Color) -> Self {
        Self {
            name: name.to_string(),
            kind,
            color,
            opacity: 1.0,
            visible: true,
            draw_list: DrawList::new(name),
            bboxes: Vec::new(),
            index: SpatialIndex::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Base color of the layer, for legends.
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set the opacity, clamped to `0.0..=1.0`. NaN counts as fully transparent.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_nan() {
            0.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }

    pub fn is_interactive(&self) -> bool {
        self.kind.is_interactive()
    }

    /// Whether the renderer would show anything of this layer.
    pub fn is_drawn(&self) -> bool {
        self.visible && self.opacity > 0.0
    }

    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    pub fn draw_list_mut(&mut self) -> &mut DrawList {
        &mut self.draw_list
    }

    /// Per-item boxes recorded during the last paint pass, in paint order.
    pub fn bboxes(&self) -> &[BBox] {
        &self.bboxes
    }

    /// Union of every item box on this layer.
    pub fn bbox(&self) -> Option<BBox> {
        BBox::combine(&self.bboxes)
    }

    pub fn clear(&mut self) {
        self.draw_list.clear();
        self.bboxes.clear();
        self.index = SpatialIndex::new();
    }

    /// Mark the start of one item's primitives.
    pub fn begin_item(&self) -> usize {
        self.draw_list.len()
    }

    /// Record the box of everything queued since `start` for `context`.
    ///
    /// Returns false when the item drew nothing on this layer.
    pub fn end_item(&mut self, start: usize, context: Option<ItemRef>) -> bool {
        let Some(mut bbox) = self.draw_list.bbox_since(start) else {
            return false;
        };
        bbox.context = context;
        self.bboxes.push(bbox);
        true
    }

    /// Rebuild the spatial index from the recorded boxes.
    pub fn commit(&mut self) {
        self.index = SpatialIndex::build(&self.bboxes);
    }

    /// Boxes within `tolerance` of `point`, topmost first.
    pub fn query_point(&self, point: &Vec2, tolerance: f64) -> impl Iterator<Item = &BBox> + '_ {
        self.index
            .query_point(point, tolerance)
            .into_iter()
            .map(|entry| &entry.bbox)
    }

    pub fn as_batch(&self) -> LayerBatch<'_> {
        LayerBatch {
            name: &self.name,
            visible: self.visible,
            opacity: self.opacity,
            draw_list: &self.draw_list,
        }
    }
}

/// One pick candidate.
#[derive(Debug, Clone, Copy)]
pub struct LayerHit<'a> {
    pub layer: &'a ViewLayer,
    pub bbox: &'a BBox,
}

/// The ordered view layers for one board. Insertion order is paint order,
/// back to front.
#[derive(Debug)]
pub struct LayerSet {
    layers: Vec<ViewLayer>,
    by_name: HashMap<String, usize>,
}

impl LayerSet {
    pub fn new(board: &Board, theme: &BoardTheme) -> Self {
        let mut set = Self {
            layers: Vec::new(),
            by_name: HashMap::new(),
        };
        let board_layer =
            |name: &str, kind: LayerKind| ViewLayer::new(name, kind, theme.layer_color(name));

        set.add(ViewLayer::new(
            layer_names::DRAWING_SHEET,
            LayerKind::DrawingSheet,
            theme.drawing_sheet,
        ));
        set.add(ViewLayer::new(layer_names::GRID, LayerKind::Grid, theme.grid));

        for name in [
            names::B_FAB,
            names::B_CRTYD,
            names::B_ADHES,
            names::B_PASTE,
            names::B_SILKS,
            names::B_MASK,
        ] {
            set.add(board_layer(name, LayerKind::Technical));
        }

        // Copper from the back up, each above its zones.
        let copper = layer::copper_layer_names(layer::copper_layer_count(&board.layers));
        for name in copper.iter().rev() {
            let zone = layer_names::zone_layer(name);
            set.add(ViewLayer::new(&zone, LayerKind::Zone, theme.layer_color(name)));
            set.add(board_layer(name, LayerKind::Copper));
        }

        for (name, kind, color) in [
            (layer_names::PADS_BACK, LayerKind::Pad, theme.pad_back),
            (layer_names::VIA_THROUGH, LayerKind::Via, theme.via_through),
            (layer_names::VIA_BURIED_BLIND, LayerKind::Via, theme.via_blind_buried),
            (layer_names::VIA_MICRO, LayerKind::Via, theme.via_micro),
            (layer_names::PADS_FRONT, LayerKind::Pad, theme.pad_front),
            (layer_names::PAD_HOLE_WALLS, LayerKind::PadHole, theme.pad_plated_hole),
            (layer_names::PAD_HOLES, LayerKind::PadHole, theme.pad_hole),
            (layer_names::VIA_HOLES, LayerKind::ViaHole, theme.via_hole),
        ] {
            set.add(ViewLayer::new(name, kind, color));
        }

        for name in [
            names::F_MASK,
            names::F_SILKS,
            names::F_PASTE,
            names::F_ADHES,
            names::F_CRTYD,
            names::F_FAB,
        ] {
            set.add(board_layer(name, LayerKind::Technical));
        }

        for name in [
            names::MARGIN,
            names::EDGE_CUTS,
            names::DWGS_USER,
            names::CMTS_USER,
            names::ECO1_USER,
            names::ECO2_USER,
        ] {
            set.add(board_layer(name, LayerKind::User));
        }
        let mut user_layers: Vec<usize> = board
            .layers
            .iter()
            .filter_map(|l| l.canonical_name.strip_prefix("User.")?.parse().ok())
            .collect();
        user_layers.sort_unstable();
        for n in user_layers {
            set.add(board_layer(&layer::user_layer_name(n), LayerKind::User));
        }

        set.add(ViewLayer::new(layer_names::HIGHLIGHT, LayerKind::Highlight, theme.highlight));
        set.add(ViewLayer::new(layer_names::OVERLAY, LayerKind::Overlay, theme.selection));

        log::debug!("layer set built with {} layers", set.layers.len());
        set
    }

    fn add(&mut self, layer: ViewLayer) {
        if self.by_name.contains_key(layer.name()) {
            log::warn!("duplicate view layer {:?} ignored", layer.name());
            return;
        }
        self.by_name.insert(layer.name().to_string(), self.layers.len());
        self.layers.push(layer);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn by_name(&self, name: &str) -> Option<&ViewLayer> {
        self.by_name.get(name).map(|&i| &self.layers[i])
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut ViewLayer> {
        self.by_name.get(name).map(|&i| &mut self.layers[i])
    }

    /// Back to front.
    pub fn in_paint_order(&self) -> impl DoubleEndedIterator<Item = &ViewLayer> + '_ {
        self.layers.iter()
    }

    /// Front to back.
    pub fn in_pick_order(&self) -> impl Iterator<Item = &ViewLayer> + '_ {
        self.layers.iter().rev()
    }

    pub fn in_category(&self, category: LayerCategory) -> impl Iterator<Item = &ViewLayer> + '_ {
        self.layers
            .iter()
            .filter(move |l| category.includes(l.kind()))
    }

    pub fn in_category_mut(
        &mut self,
        category: LayerCategory,
    ) -> impl Iterator<Item = &mut ViewLayer> + '_ {
        self.layers
            .iter_mut()
            .filter(move |l| category.includes(l.kind()))
    }

    pub fn copper_layers(&self) -> impl Iterator<Item = &ViewLayer> + '_ {
        self.in_category(LayerCategory::Copper)
    }

    pub fn via_layers(&self) -> impl Iterator<Item = &ViewLayer> + '_ {
        self.in_category(LayerCategory::Via)
    }

    pub fn pad_layers(&self) -> impl Iterator<Item = &ViewLayer> + '_ {
        self.in_category(LayerCategory::Pad)
    }

    pub fn pad_hole_layers(&self) -> impl Iterator<Item = &ViewLayer> + '_ {
        self.in_category(LayerCategory::PadHole)
    }

    pub fn zone_layers(&self) -> impl Iterator<Item = &ViewLayer> + '_ {
        self.in_category(LayerCategory::Zone)
    }

    pub fn grid_layers(&self) -> impl Iterator<Item = &ViewLayer> + '_ {
        self.in_category(LayerCategory::Grid)
    }

    /// Assign `opacity` to every layer in `category`. Returns how many
    /// layers changed. Drawing is left to the caller.
    pub fn set_opacity(&mut self, category: LayerCategory, opacity: f32) -> usize {
        let mut count = 0;
        for layer in self.in_category_mut(category) {
            layer.set_opacity(opacity);
            count += 1;
        }
        count
    }

    /// Empty every layer the board painter owns. Highlight and overlay keep
    /// their content.
    pub fn clear_board_layers(&mut self) {
        for layer in self
            .layers
            .iter_mut()
            .filter(|l| !matches!(l.kind(), LayerKind::Highlight | LayerKind::Overlay))
        {
            layer.clear();
        }
    }

    /// Rebuild every layer's spatial index.
    pub fn commit(&mut self) {
        for layer in &mut self.layers {
            layer.commit();
        }
    }

    /// Every item box within `tolerance` of `point` on drawn, interactive
    /// layers, front to back.
    pub fn query_point(
        &self,
        point: Vec2,
        tolerance: f64,
    ) -> impl Iterator<Item = LayerHit<'_>> + '_ {
        self.in_pick_order()
            .filter(|l| l.is_drawn() && l.is_interactive())
            .flat_map(move |layer| {
                layer
                    .query_point(&point, tolerance)
                    .map(move |bbox| LayerHit { layer, bbox })
            })
    }

    /// The batches handed to the renderer, back to front.
    pub fn batches(&self) -> Vec<LayerBatch<'_>> {
        self.layers.iter().map(ViewLayer::as_batch).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcbview_core::layer::{BoardLayer, BoardLayerKind};

    fn four_layer_board() -> Board {
        let mut board = Board::new();
        board.layers = vec![
            BoardLayer::new(0, "F.Cu", BoardLayerKind::Signal),
            BoardLayer::new(1, "In1.Cu", BoardLayerKind::Power),
            BoardLayer::new(2, "In2.Cu", BoardLayerKind::Power),
            BoardLayer::new(31, "B.Cu", BoardLayerKind::Signal),
            BoardLayer::new(51, "User.2", BoardLayerKind::User),
            BoardLayer::new(50, "User.1", BoardLayerKind::User),
        ];
        board
    }

    fn position(set: &LayerSet, name: &str) -> usize {
        set.in_paint_order()
            .position(|l| l.name() == name)
            .unwrap_or_else(|| panic!("missing layer {name}"))
    }

    #[test]
    fn test_layer_roster_and_order() {
        let set = LayerSet::new(&four_layer_board(), &BoardTheme::default());
        let copper: Vec<&str> = set.copper_layers().map(|l| l.name()).collect();
        assert_eq!(copper, vec!["B.Cu", "In2.Cu", "In1.Cu", "F.Cu"]);

        assert_eq!(position(&set, layer_names::DRAWING_SHEET), 0);
        assert!(position(&set, ":Zones:F.Cu") + 1 == position(&set, "F.Cu"));
        assert!(position(&set, "B.Cu") < position(&set, layer_names::VIA_THROUGH));
        assert!(position(&set, "User.1") < position(&set, "User.2"));
        assert_eq!(set.in_pick_order().next().unwrap().name(), layer_names::OVERLAY);
        assert!(set.by_name("In3.Cu").is_none());
    }

    #[test]
    fn test_two_copper_layers_by_default() {
        let set = LayerSet::new(&Board::new(), &BoardTheme::default());
        assert_eq!(set.copper_layers().count(), 2);
        assert_eq!(set.zone_layers().count(), 2);
        assert!(set.by_name("User.1").is_none());
    }

    #[test]
    fn test_categories_are_subsequences_of_paint_order() {
        let set = LayerSet::new(&four_layer_board(), &BoardTheme::default());
        let order: Vec<&str> = set.in_paint_order().map(|l| l.name()).collect();
        for category in [
            LayerCategory::Copper,
            LayerCategory::Via,
            LayerCategory::Pad,
            LayerCategory::PadHole,
            LayerCategory::Zone,
            LayerCategory::Grid,
        ] {
            let positions: Vec<usize> = set
                .in_category(category)
                .map(|l| order.iter().position(|n| *n == l.name()).unwrap())
                .collect();
            assert!(!positions.is_empty(), "{category:?} is empty");
            assert!(positions.windows(2).all(|w| w[0] < w[1]), "{category:?} reordered");
        }
        let vias: Vec<&str> = set.via_layers().map(|l| l.name()).collect();
        assert_eq!(
            vias,
            vec![":Via:Through", ":Via:BuriedBlind", ":Via:MicroVia", ":Via:Holes"]
        );
        let holes: Vec<&str> = set.pad_hole_layers().map(|l| l.name()).collect();
        assert_eq!(holes, vec![layer_names::PAD_HOLE_WALLS, layer_names::PAD_HOLES]);
    }

    #[test]
    fn test_set_opacity_clamps_and_isolates() {
        let mut set = LayerSet::new(&Board::new(), &BoardTheme::default());
        assert_eq!(set.set_opacity(LayerCategory::Zone, 0.5), 2);
        assert!(set.zone_layers().all(|l| l.opacity() == 0.5));
        assert!(set.copper_layers().all(|l| l.opacity() == 1.0));

        set.set_opacity(LayerCategory::Pad, 7.0);
        assert!(set.pad_layers().all(|l| l.opacity() == 1.0));
        set.set_opacity(LayerCategory::Pad, -1.0);
        assert!(set.pad_layers().all(|l| l.opacity() == 0.0));
        set.set_opacity(LayerCategory::Grid, f32::NAN);
        assert!(set.grid_layers().all(|l| l.opacity() == 0.0));
    }

    #[test]
    fn test_query_point_front_to_back() {
        let mut set = LayerSet::new(&Board::new(), &BoardTheme::default());
        for (name, item) in [
            ("B.Cu", ItemRef::Segment(0)),
            ("F.Cu", ItemRef::Segment(1)),
            (layer_names::VIA_THROUGH, ItemRef::Via(0)),
            (layer_names::GRID, ItemRef::Via(9)),
        ] {
            let layer = set.by_name_mut(name).unwrap();
            let start = layer.begin_item();
            layer
                .draw_list_mut()
                .circle(Vec2::new(0.0, 0.0), 1.0, Color::WHITE);
            assert!(layer.end_item(start, Some(item)));
        }
        set.commit();

        let hits: Vec<(&str, Option<ItemRef>)> = set
            .query_point(Vec2::new(0.5, 0.0), 0.0)
            .map(|h| (h.layer.name(), h.bbox.context))
            .collect();
        assert_eq!(
            hits,
            vec![
                (layer_names::VIA_THROUGH, Some(ItemRef::Via(0))),
                ("F.Cu", Some(ItemRef::Segment(1))),
                ("B.Cu", Some(ItemRef::Segment(0))),
            ]
        );

        set.by_name_mut("F.Cu").unwrap().visible = false;
        assert_eq!(set.query_point(Vec2::new(0.5, 0.0), 0.0).count(), 2);
        assert_eq!(set.query_point(Vec2::new(50.0, 0.0), 0.0).count(), 0);
    }

    #[test]
    fn test_clear_board_layers_keeps_overlay() {
        let mut set = LayerSet::new(&Board::new(), &BoardTheme::default());
        for name in ["F.Cu", layer_names::OVERLAY] {
            set.by_name_mut(name)
                .unwrap()
                .draw_list_mut()
                .circle(Vec2::ZERO, 1.0, Color::WHITE);
        }
        set.clear_board_layers();
        assert!(set.by_name("F.Cu").unwrap().draw_list().is_empty());
        assert_eq!(set.by_name(layer_names::OVERLAY).unwrap().draw_list().len(), 1);
    }
}
