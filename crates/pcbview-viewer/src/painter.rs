use std::collections::BTreeSet;

use pcbview_core::board::{
    Board, BoardItem, Dimension, Drawing, Footprint, GraphicItem, NetId, Pad, PadKind, Text,
    ViaType,
};
use pcbview_core::geometry::{BBox, Transform, Vec2};
use pcbview_core::layer::{layer_matches, names};
use pcbview_core::theme::{BoardTheme, Color};
use pcbview_renderer::DrawList;

use crate::config::ViewerConfig;
use crate::layers::{layer_names, LayerSet, ViewLayer};

/// Grid passes with more lines than this per axis are skipped.
const MAX_GRID_LINES: usize = 1000;
/// Inner drawing-sheet border inset, in mm.
const SHEET_MARGIN: f64 = 10.0;
const SHEET_STROKE: f64 = 0.15;
const GRID_STROKE: f64 = 0.02;
const HOLE_WALL_STROKE: f64 = 0.1;

// ── Painter ──────────────────────────────────────────────────────────

/// Projects board entities onto the view layers of a [`LayerSet`].
#[derive(Debug, Clone)]
pub struct BoardPainter {
    theme: BoardTheme,
    grid_spacing: f64,
    selection_padding: f64,
    selection_stroke: f64,
}

impl BoardPainter {
    pub fn new(theme: BoardTheme, config: &ViewerConfig) -> Self {
        Self {
            theme,
            grid_spacing: config.grid_spacing,
            selection_padding: config.selection_padding,
            selection_stroke: config.selection_stroke,
        }
    }

    pub fn theme(&self) -> &BoardTheme {
        &self.theme
    }

    /// Rebuild every board layer from `board`.
    ///
    /// Highlight and overlay content is left alone. Running the pass twice
    /// produces identical layers.
    pub fn paint(&self, layers: &mut LayerSet, board: &Board) {
        layers.clear_board_layers();

        let page = board.page_bbox();
        if let Some(sheet) = layers.by_name_mut(layer_names::DRAWING_SHEET) {
            self.paint_drawing_sheet(sheet, &page);
        }
        if let Some(grid) = layers.by_name_mut(layer_names::GRID) {
            self.paint_grid(grid, board.grid_origin().unwrap_or(Vec2::ZERO), &page);
        }

        let mut missing = BTreeSet::new();
        let mut painted = 0usize;
        for (item_ref, item) in board.items() {
            for layer_name in item_layers(&item) {
                let Some(layer) = layers.by_name_mut(&layer_name) else {
                    missing.insert(layer_name);
                    continue;
                };
                let start = layer.begin_item();
                self.paint_item(layer.draw_list_mut(), &layer_name, &item);
                if layer.end_item(start, Some(item_ref)) {
                    painted += 1;
                }
            }
        }
        for name in &missing {
            log::warn!("skipped items on unknown layer {name:?}");
        }

        layers.commit();
        log::debug!("paint pass recorded {painted} item boxes");
    }

    /// Paint the members of `net` onto the highlight layer. Returns the
    /// number of items drawn; net 0 draws nothing.
    pub fn paint_net(&self, layers: &mut LayerSet, board: &Board, net: NetId) -> usize {
        let Some(layer) = layers.by_name_mut(layer_names::HIGHLIGHT) else {
            return 0;
        };
        layer.clear();
        let color = self.theme.highlight;
        let mut count = 0;

        if net != 0 {
            for (item_ref, item) in board.items().filter(|(_, item)| item.on_net(net)) {
                let start = layer.begin_item();
                let list = layer.draw_list_mut();
                match item {
                    BoardItem::Segment(s) => list.line(s.points(), s.width, color),
                    BoardItem::Via(v) => list.circle(v.at, v.size / 2.0, color),
                    BoardItem::Zone(z) => {
                        for poly in &z.filled_polygons {
                            list.polygon(poly.points.clone(), color);
                        }
                    }
                    BoardItem::Footprint(fp) => {
                        let transform = fp.transform();
                        for pad in fp.pads.iter().filter(|p| p.net == Some(net)) {
                            paint_pad(list, &transform, pad, color);
                        }
                    }
                    BoardItem::Drawing(_) => {}
                }
                if layer.end_item(start, Some(item_ref)) {
                    count += 1;
                }
            }
        }

        layer.commit();
        log::debug!("highlighted {count} items on net {net}");
        count
    }

    /// Draw the selection box on the overlay layer, or clear it.
    pub fn paint_selection(&self, layers: &mut LayerSet, selection: Option<&BBox>) {
        let Some(layer) = layers.by_name_mut(layer_names::OVERLAY) else {
            return;
        };
        layer.clear();
        let Some(bbox) = selection else {
            return;
        };

        let bbox = bbox.grow(self.selection_padding, self.selection_padding);
        let color = self.theme.selection;
        let start = layer.begin_item();
        let list = layer.draw_list_mut();
        let corners = rect_points(&bbox);
        list.polygon(corners.clone(), color.with_alpha(color.alpha() * 0.25));
        list.line(closed(corners), self.selection_stroke, color);
        layer.end_item(start, bbox.context);
        layer.commit();
    }

    fn paint_drawing_sheet(&self, layer: &mut ViewLayer, page: &BBox) {
        let color = self.theme.drawing_sheet;
        let start = layer.begin_item();
        let list = layer.draw_list_mut();
        list.line(closed(rect_points(page)), SHEET_STROKE, color);
        if page.w > SHEET_MARGIN * 2.0 && page.h > SHEET_MARGIN * 2.0 {
            let inner = page.grow(-SHEET_MARGIN, -SHEET_MARGIN);
            list.line(closed(rect_points(&inner)), SHEET_STROKE, color);
        }
        layer.end_item(start, None);
        layer.commit();
    }

    fn paint_grid(&self, layer: &mut ViewLayer, origin: Vec2, page: &BBox) {
        let spacing = self.grid_spacing;
        if !(spacing.is_finite() && spacing > 0.0) {
            return;
        }
        let end = page.end();
        let first = |from: f64, o: f64| o + ((from - o) / spacing).ceil() * spacing;
        let count = |from: f64, to: f64| ((to - from) / spacing).floor().max(-1.0) as i64 + 1;
        let (x0, y0) = (first(page.x, origin.x), first(page.y, origin.y));
        let (nx, ny) = (count(x0, end.x), count(y0, end.y));
        if nx.max(ny) as usize > MAX_GRID_LINES {
            log::debug!("grid of {nx}x{ny} lines skipped");
            return;
        }

        let color = self.theme.grid;
        let start = layer.begin_item();
        let list = layer.draw_list_mut();
        for i in 0..nx {
            let x = x0 + i as f64 * spacing;
            list.line(vec![Vec2::new(x, page.y), Vec2::new(x, end.y)], GRID_STROKE, color);
        }
        for i in 0..ny {
            let y = y0 + i as f64 * spacing;
            list.line(vec![Vec2::new(page.x, y), Vec2::new(end.x, y)], GRID_STROKE, color);
        }
        if page.contains_point(&origin) {
            let axes = self.theme.grid_axes;
            let vertical = vec![Vec2::new(origin.x, page.y), Vec2::new(origin.x, end.y)];
            let horizontal = vec![Vec2::new(page.x, origin.y), Vec2::new(end.x, origin.y)];
            list.line(vertical, GRID_STROKE * 2.0, axes);
            list.line(horizontal, GRID_STROKE * 2.0, axes);
        }
        layer.end_item(start, None);
        layer.commit();
    }

    /// The constituents of `item` that belong on `layer_name`.
    fn paint_item(&self, list: &mut DrawList, layer_name: &str, item: &BoardItem<'_>) {
        match item {
            BoardItem::Segment(s) => {
                list.line(s.points(), s.width, self.theme.layer_color(&s.layer))
            }
            BoardItem::Via(v) => {
                if layer_name == layer_names::VIA_HOLES {
                    list.circle(v.at, v.drill / 2.0, self.theme.via_hole);
                } else {
                    let color = match v.via_type {
                        ViaType::Through => self.theme.via_through,
                        ViaType::BlindBuried => self.theme.via_blind_buried,
                        ViaType::Micro => self.theme.via_micro,
                    };
                    list.circle(v.at, v.size / 2.0, color);
                }
            }
            BoardItem::Zone(z) => {
                for poly in z
                    .filled_polygons
                    .iter()
                    .filter(|p| layer_names::zone_layer(&p.layer) == layer_name)
                {
                    list.polygon(poly.points.clone(), self.theme.layer_color(&poly.layer));
                }
            }
            BoardItem::Drawing(d) => {
                let color = self.theme.layer_color(d.layer());
                let identity = Transform::default();
                match d {
                    Drawing::Graphic(g) => paint_graphic(list, &identity, g, color),
                    Drawing::Text(t) => paint_text(list, &identity, t, color),
                    Drawing::Dimension(dim) => paint_dimension(list, dim, color),
                }
            }
            BoardItem::Footprint(fp) => self.paint_footprint(list, layer_name, fp),
        }
    }

    fn paint_footprint(&self, list: &mut DrawList, layer_name: &str, fp: &Footprint) {
        let transform = fp.transform();
        let color = self.theme.layer_color(layer_name);

        for g in fp.graphics.iter().filter(|g| g.layer == layer_name) {
            paint_graphic(list, &transform, g, color);
        }
        for t in fp.texts.iter().filter(|t| t.layer == layer_name) {
            paint_text(list, &transform, t, color);
        }

        match layer_name {
            layer_names::PADS_FRONT | layer_names::PADS_BACK => {
                let (copper, color) = if layer_name == layer_names::PADS_FRONT {
                    (names::F_CU, self.theme.pad_front)
                } else {
                    (names::B_CU, self.theme.pad_back)
                };
                for pad in fp.pads.iter().filter(|p| pad_on(p, copper)) {
                    paint_pad(list, &transform, pad, color);
                }
            }
            layer_names::PAD_HOLE_WALLS => {
                for pad in fp.pads.iter().filter(|p| p.kind == PadKind::ThruHole) {
                    if let Some(drill) = pad.drill {
                        let center = transform.then(&pad.transform()).apply(&drill.offset);
                        let radius = drill.diameter / 2.0;
                        let color = self.theme.pad_plated_hole;
                        list.ring(center, radius, HOLE_WALL_STROKE, color);
                    }
                }
            }
            layer_names::PAD_HOLES => {
                for pad in &fp.pads {
                    if let Some(drill) = pad.drill {
                        let center = transform.then(&pad.transform()).apply(&drill.offset);
                        list.circle(center, drill.diameter / 2.0, self.theme.pad_hole);
                    }
                }
            }
            _ => {}
        }
    }
}

// ── Layer assignment ─────────────────────────────────────────────────

/// Every view layer `item` has something to draw on, in first-seen order.
pub fn item_layers(item: &BoardItem<'_>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |name: String| {
        if !out.contains(&name) {
            out.push(name);
        }
    };

    match item {
        BoardItem::Segment(s) => push(s.layer.clone()),
        BoardItem::Via(v) => {
            let layer = match v.via_type {
                ViaType::Through => layer_names::VIA_THROUGH,
                ViaType::BlindBuried => layer_names::VIA_BURIED_BLIND,
                ViaType::Micro => layer_names::VIA_MICRO,
            };
            push(layer.to_string());
            push(layer_names::VIA_HOLES.to_string());
        }
        BoardItem::Zone(z) => {
            for poly in &z.filled_polygons {
                push(layer_names::zone_layer(&poly.layer));
            }
        }
        BoardItem::Drawing(d) => push(d.layer().to_string()),
        BoardItem::Footprint(fp) => {
            for g in &fp.graphics {
                push(g.layer.clone());
            }
            for t in fp.texts.iter().filter(|t| !t.hide) {
                push(t.layer.clone());
            }
            if fp.pads.iter().any(|p| pad_on(p, names::B_CU)) {
                push(layer_names::PADS_BACK.to_string());
            }
            if fp.pads.iter().any(|p| pad_on(p, names::F_CU)) {
                push(layer_names::PADS_FRONT.to_string());
            }
            let drilled = fp.pads.iter().filter(|p| p.drill.is_some());
            if drilled.clone().any(|p| p.kind == PadKind::ThruHole) {
                push(layer_names::PAD_HOLE_WALLS.to_string());
            }
            if drilled.count() > 0 {
                push(layer_names::PAD_HOLES.to_string());
            }
        }
    }
    out
}

fn pad_on(pad: &Pad, copper: &str) -> bool {
    pad.layers.iter().any(|pattern| layer_matches(pattern, copper))
}

// ── Shapes ───────────────────────────────────────────────────────────

fn paint_pad(list: &mut DrawList, parent: &Transform, pad: &Pad, color: Color) {
    let transform = parent.then(&pad.transform());
    let outline = pad.outline().iter().map(|p| transform.apply(p)).collect();
    list.polygon(outline, color);
}

fn paint_graphic(list: &mut DrawList, transform: &Transform, g: &GraphicItem, color: Color) {
    let points: Vec<Vec2> = g.shape.points().iter().map(|p| transform.apply(p)).collect();
    if g.shape.is_closed() {
        if g.fill {
            list.polygon(points.clone(), color);
        }
        if g.width > 0.0 {
            list.line(closed(points), g.width, color);
        }
    } else {
        list.line(points, g.width, color);
    }
}

fn paint_text(list: &mut DrawList, transform: &Transform, t: &Text, color: Color) {
    if t.hide {
        return;
    }
    list.text(
        &t.text,
        transform.apply(&t.at),
        t.size,
        t.rotation + transform.rotation,
        t.thickness,
        color,
    );
}

fn paint_dimension(list: &mut DrawList, dim: &Dimension, color: Color) {
    list.line(vec![dim.start, dim.end], dim.width, color);
    let mid = (dim.start + dim.end) * 0.5;
    list.text(&dim.text, mid, Vec2::new(1.0, 1.0), 0.0, dim.width, color);
}

fn rect_points(bbox: &BBox) -> Vec<Vec2> {
    let (s, e) = (bbox.start(), bbox.end());
    vec![s, Vec2::new(e.x, s.y), e, Vec2::new(s.x, e.y)]
}

fn closed(mut points: Vec<Vec2>) -> Vec<Vec2> {
    if let Some(first) = points.first().copied() {
        points.push(first);
    }
    points
}
