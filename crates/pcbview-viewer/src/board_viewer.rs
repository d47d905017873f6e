use std::convert::Infallible;
use std::marker::PhantomData;

use pcbview_core::board::{Board, BoardItem, Drawing, ItemRef, NetId};
use pcbview_core::geometry::{BBox, Vec2};
use pcbview_core::layer::{is_printed_face_layer, names};
use pcbview_core::theme::BoardTheme;
use pcbview_renderer::{Camera, Renderer, Surface};

use crate::config::ViewerConfig;
use crate::error::{LoaderError, ViewerError};
use crate::layers::{layer_names, LayerCategory, LayerHit, LayerSet};
use crate::painter::BoardPainter;
use crate::viewer::{DocumentViewer, Selection, ViewerState};

// ── Selection targets ────────────────────────────────────────────────

/// What [`BoardViewer::select`] should highlight.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectTarget {
    /// Clear the selection.
    None,
    /// A board entity; its nominal box is drawn.
    Item(ItemRef),
    /// An explicit box, drawn as given.
    BBox(BBox),
    /// A footprint reference designator or UUID string.
    Key(String),
}

impl From<ItemRef> for SelectTarget {
    fn from(item: ItemRef) -> Self {
        SelectTarget::Item(item)
    }
}

impl From<Option<ItemRef>> for SelectTarget {
    fn from(item: Option<ItemRef>) -> Self {
        item.map_or(SelectTarget::None, SelectTarget::Item)
    }
}

impl From<BBox> for SelectTarget {
    fn from(bbox: BBox) -> Self {
        SelectTarget::BBox(bbox)
    }
}

impl From<&str> for SelectTarget {
    fn from(key: &str) -> Self {
        SelectTarget::Key(key.to_string())
    }
}

impl From<String> for SelectTarget {
    fn from(key: String) -> Self {
        SelectTarget::Key(key)
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Collects what a [`BoardViewer`] needs and brings it to the ready state.
///
/// Nothing can be drawn, picked or selected before [`ViewerBuilder::load`]
/// succeeds.
#[derive(Debug)]
pub struct ViewerBuilder<R: Renderer> {
    surface: Surface,
    theme: BoardTheme,
    config: ViewerConfig,
    _renderer: PhantomData<R>,
}

impl<R: Renderer> ViewerBuilder<R> {
    pub fn new(surface: Surface) -> Self {
        Self {
            surface,
            theme: BoardTheme::default(),
            config: ViewerConfig::default(),
            _renderer: PhantomData,
        }
    }

    pub fn with_theme(mut self, theme: BoardTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_config(mut self, config: ViewerConfig) -> Self {
        self.config = config;
        self
    }

    /// Always `Uninitialized`; a builder never draws.
    pub fn state(&self) -> ViewerState {
        ViewerState::Uninitialized
    }

    /// Build a viewer around an already parsed board.
    pub fn load(self, board: Board) -> Result<BoardViewer<R>, ViewerError> {
        self.load_with(|| Ok::<_, Infallible>(board))
    }

    /// Acquire the renderer, run `loader`, paint once, apply the default
    /// opacities and fit the camera.
    pub fn load_with<F, E>(self, loader: F) -> Result<BoardViewer<R>, ViewerError>
    where
        F: FnOnce() -> Result<Board, E>,
        E: Into<LoaderError>,
    {
        log::info!("viewer {:?} -> {:?}", ViewerState::Uninitialized, ViewerState::Loading);

        let mut renderer = R::create(&self.surface)
            .inspect_err(|err| log::error!("renderer unavailable: {err}"))?;
        let board = loader().map_err(|err| ViewerError::Document(err.into()))?;
        renderer.set_background(self.theme.background);

        let layers = LayerSet::new(&board, &self.theme);
        let camera = Camera::new(self.surface.width, self.surface.height);
        let painter = BoardPainter::new(self.theme, &self.config);
        let mut viewer = BoardViewer {
            viewer: DocumentViewer::new(renderer, layers, camera, self.config),
            board,
            painter,
        };

        viewer.paint();
        viewer.apply_default_opacity();
        viewer.fit();

        log::info!(
            "viewer {:?} -> {:?} with {} layers",
            ViewerState::Loading,
            ViewerState::Ready,
            viewer.layers().len()
        );
        Ok(viewer)
    }
}

// ── Board viewer ─────────────────────────────────────────────────────

/// A ready board viewer.
#[derive(Debug)]
pub struct BoardViewer<R: Renderer> {
    viewer: DocumentViewer<R>,
    board: Board,
    painter: BoardPainter,
}

impl<R: Renderer> BoardViewer<R> {
    pub fn builder(surface: Surface) -> ViewerBuilder<R> {
        ViewerBuilder::new(surface)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn document(&self) -> &DocumentViewer<R> {
        &self.viewer
    }

    pub fn layers(&self) -> &LayerSet {
        self.viewer.layers()
    }

    pub fn camera(&self) -> &Camera {
        self.viewer.camera()
    }

    pub fn renderer(&self) -> &R {
        self.viewer.renderer()
    }

    pub fn theme(&self) -> &BoardTheme {
        self.painter.theme()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.viewer.selection()
    }

    pub fn state(&self) -> ViewerState {
        self.viewer.state()
    }

    /// The board's grid origin, or (0, 0).
    pub fn grid_origin(&self) -> Vec2 {
        self.board.grid_origin().unwrap_or(Vec2::ZERO)
    }

    fn paint(&mut self) {
        self.painter.paint(self.viewer.layers_mut(), &self.board);
    }

    /// Run the paint pass again and redraw.
    pub fn repaint(&mut self) {
        self.viewer.mark_interactive();
        self.paint();
        self.viewer.draw();
    }

    pub fn draw(&mut self) {
        self.viewer.draw();
    }

    fn apply_default_opacity(&mut self) {
        let defaults = self.viewer.config().default_opacity.clone();
        let layers = self.viewer.layers_mut();
        layers.set_opacity(LayerCategory::Copper, defaults.tracks);
        layers.set_opacity(LayerCategory::Via, defaults.vias);
        layers.set_opacity(LayerCategory::Pad, defaults.pads);
        layers.set_opacity(LayerCategory::PadHole, defaults.holes);
        layers.set_opacity(LayerCategory::Zone, defaults.zones);
        layers.set_opacity(LayerCategory::Grid, defaults.grid);
        if let Some(page) = layers.by_name_mut(layer_names::DRAWING_SHEET) {
            page.set_opacity(defaults.page);
        }
    }

    // ── Opacity ──────────────────────────────────────────────────────

    fn set_category_opacity(&mut self, category: LayerCategory, opacity: f32) {
        self.viewer.mark_interactive();
        self.viewer.layers_mut().set_opacity(category, opacity);
        self.viewer.draw();
    }

    pub fn set_track_opacity(&mut self, opacity: f32) {
        self.set_category_opacity(LayerCategory::Copper, opacity);
    }

    pub fn set_via_opacity(&mut self, opacity: f32) {
        self.set_category_opacity(LayerCategory::Via, opacity);
    }

    pub fn set_pad_opacity(&mut self, opacity: f32) {
        self.set_category_opacity(LayerCategory::Pad, opacity);
    }

    pub fn set_pad_hole_opacity(&mut self, opacity: f32) {
        self.set_category_opacity(LayerCategory::PadHole, opacity);
    }

    pub fn set_zone_opacity(&mut self, opacity: f32) {
        self.set_category_opacity(LayerCategory::Zone, opacity);
    }

    pub fn set_grid_opacity(&mut self, opacity: f32) {
        self.set_category_opacity(LayerCategory::Grid, opacity);
    }

    pub fn set_page_opacity(&mut self, opacity: f32) {
        self.viewer.mark_interactive();
        if let Some(page) = self.viewer.layers_mut().by_name_mut(layer_names::DRAWING_SHEET) {
            page.set_opacity(opacity);
        }
        self.viewer.draw();
    }

    // ── Picking and selection ────────────────────────────────────────

    /// Candidates under a screen position, front to back.
    pub fn pick(&self, screen: Vec2) -> impl Iterator<Item = LayerHit<'_>> + '_ {
        self.viewer.pick(screen)
    }

    pub fn select(&mut self, target: impl Into<SelectTarget>) {
        self.viewer.mark_interactive();
        let bbox = match target.into() {
            SelectTarget::None => None,
            SelectTarget::Item(item) => self.board.item_bbox(item),
            SelectTarget::BBox(bbox) => Some(bbox),
            SelectTarget::Key(key) => self
                .board
                .find_footprint(&key)
                .and_then(|(index, _)| self.board.item_bbox(ItemRef::Footprint(index))),
        };
        let painter = &self.painter;
        self.viewer
            .select_bbox(bbox, |layers, bbox| painter.paint_selection(layers, bbox));
    }

    /// Select the topmost candidate under `screen` that `selectable` accepts.
    ///
    /// Clears the selection when nothing qualifies.
    pub fn select_at<P>(&mut self, screen: Vec2, selectable: P) -> Option<ItemRef>
    where
        P: Fn(ItemRef) -> bool,
    {
        let hit = self
            .viewer
            .pick(screen)
            .filter_map(|h| h.bbox.context)
            .find(|item| selectable(*item));
        self.select(hit);
        hit
    }

    /// Paint `net` onto the highlight layer and redraw. Net 0 clears it.
    pub fn highlight_net(&mut self, net: NetId) -> usize {
        self.viewer.mark_interactive();
        let count = self.painter.paint_net(self.viewer.layers_mut(), &self.board, net);
        self.viewer.draw();
        count
    }

    // ── Camera ───────────────────────────────────────────────────────

    /// Extent of the printed board: the board outline plus every entity,
    /// excluding annotations and non-printed drawings.
    pub fn board_bbox(&self) -> Option<BBox> {
        let mut boxes: Vec<BBox> = Vec::new();
        if let Some(edges) = self
            .layers()
            .by_name(names::EDGE_CUTS)
            .and_then(|l| l.bbox())
            .filter(|bb| !bb.is_empty())
        {
            boxes.push(edges);
        }

        for (_, item) in self.board.items() {
            let bbox = match item {
                BoardItem::Drawing(d) if d.is_annotation() => continue,
                BoardItem::Drawing(Drawing::Graphic(g)) if !is_printed_face_layer(&g.layer) => {
                    continue
                }
                BoardItem::Footprint(fp) => fp.bbox_filtered(is_printed_face_layer),
                other => other.bbox(),
            };
            boxes.extend(bbox);
        }
        BBox::combine(&boxes)
    }

    fn fit_board(&mut self) -> bool {
        let Some(bbox) = self.board_bbox() else {
            log::debug!("nothing on the board to fit");
            return false;
        };
        let margin = self.viewer.config().fit_margin;
        let bbox = bbox.grow(bbox.w * margin, bbox.h * margin);
        self.viewer.set_camera_bbox(bbox)
    }

    fn fit_page(&mut self) {
        self.viewer.zoom_to_page(self.board.page_bbox());
    }

    fn fit(&mut self) -> bool {
        if self.fit_board() {
            return true;
        }
        self.fit_page();
        false
    }

    /// Fit the camera around the board. Returns false, leaving the camera
    /// alone, when there is nothing to fit.
    pub fn zoom_to_board(&mut self) -> bool {
        self.viewer.mark_interactive();
        self.fit_board()
    }

    /// Fit the camera to the drawing sheet.
    pub fn zoom_to_page(&mut self) {
        self.viewer.mark_interactive();
        self.fit_page();
    }

    /// Fit the board, falling back to the drawing sheet. Returns whether the
    /// board fit succeeded.
    pub fn zoom_to_fit(&mut self) -> bool {
        self.viewer.mark_interactive();
        self.fit()
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.viewer.mark_interactive();
        self.viewer.pan(dx, dy);
    }

    pub fn zoom_at(&mut self, screen: Vec2, factor: f64) {
        self.viewer.mark_interactive();
        self.viewer.zoom_at(screen, factor);
    }

    /// Follow a surface resize. Returns false when the size was ignored.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        self.viewer.mark_interactive();
        self.viewer.resize(width, height)
    }

    /// Tear down, handing the renderer back.
    pub fn dispose(self) -> R {
        self.viewer.dispose()
    }
}
