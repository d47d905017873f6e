use pcbview_core::board::{
    Dimension, Drawing, Drill, Footprint, GraphicItem, ItemRef, Pad, PadKind, PadShape, Segment,
    Shape, Via,
};
use pcbview_core::geometry::{BBox, Vec2};
use pcbview_core::layer::{is_printed_face_layer, names};
use pcbview_core::{Board, BoardTheme, Color};
use pcbview_renderer::{FrameRenderer, Surface};
use pcbview_viewer::{
    layer_names, BoardViewer, LayerCategory, SelectTarget, ViewerBuilder, ViewerConfig, ViewerError,
    ViewerState,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn track_and_via() -> Board {
    let mut board = Board::new();
    board.segments.push(Segment::line(
        Vec2::new(0.0, 0.0),
        Vec2::new(10.0, 0.0),
        0.25,
        names::F_CU,
        1,
    ));
    board.vias.push(Via::new(Vec2::new(10.0, 5.0), 0.8, 0.4, 2));
    board
}

fn connector() -> Board {
    let mut board = Board::new();
    let mut fp = Footprint::new("U1", Vec2::new(30.0, 30.0));
    for (number, x, net) in [("1", -1.27, 1), ("2", 1.27, 2)] {
        fp.pads.push(Pad {
            number: number.to_string(),
            kind: PadKind::ThruHole,
            shape: PadShape::Circle,
            at: Vec2::new(x, 0.0),
            rotation: 0.0,
            size: Vec2::new(1.0, 1.0),
            layers: vec!["*.Cu".to_string(), "*.Mask".to_string()],
            drill: Some(Drill {
                diameter: 0.5,
                offset: Vec2::ZERO,
            }),
            net: Some(net),
        });
    }
    fp.graphics.push(GraphicItem::new(
        names::F_SILKS,
        Shape::Rect {
            start: Vec2::new(-3.0, -2.0),
            end: Vec2::new(3.0, 2.0),
        },
        0.12,
    ));
    fp.graphics.push(GraphicItem::new(
        names::F_FAB,
        Shape::Rect {
            start: Vec2::new(-20.0, -20.0),
            end: Vec2::new(20.0, 20.0),
        },
        0.1,
    ));
    board.footprints.push(fp);
    board.segments.push(Segment::line(
        Vec2::new(31.27, 30.0),
        Vec2::new(40.0, 30.0),
        0.25,
        names::F_CU,
        2,
    ));
    board.drawings.push(Drawing::Dimension(Dimension {
        layer: names::CMTS_USER.to_string(),
        start: Vec2::new(150.0, 150.0),
        end: Vec2::new(180.0, 150.0),
        text: "30 mm".to_string(),
        width: 0.1,
    }));
    board
}

fn viewer(board: Board) -> BoardViewer<FrameRenderer> {
    init_logging();
    ViewerBuilder::new(Surface::new(800.0, 600.0))
        .load(board)
        .unwrap()
}

fn opacities(viewer: &BoardViewer<FrameRenderer>) -> Vec<(String, f32)> {
    viewer
        .layers()
        .in_paint_order()
        .map(|l| (l.name().to_string(), l.opacity()))
        .collect()
}

fn draw_lists(viewer: &BoardViewer<FrameRenderer>) -> Vec<String> {
    viewer
        .layers()
        .in_paint_order()
        .map(|l| serde_json::to_string(l.draw_list()).unwrap())
        .collect()
}

fn assert_bbox_eq(a: &BBox, b: &BBox) {
    assert!((a.x - b.x).abs() < 1e-9, "{a:?} != {b:?}");
    assert!((a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
    assert!((a.w - b.w).abs() < 1e-9, "{a:?} != {b:?}");
    assert!((a.h - b.h).abs() < 1e-9, "{a:?} != {b:?}");
}

// ── Lifecycle ────────────────────────────────────────────────────────

#[test]
fn test_builder_reaches_ready() {
    init_logging();
    let builder = BoardViewer::<FrameRenderer>::builder(Surface::new(800.0, 600.0));
    assert_eq!(builder.state(), ViewerState::Uninitialized);

    let mut viewer = builder.load(track_and_via()).unwrap();
    assert_eq!(viewer.state(), ViewerState::Ready);
    assert!(viewer.renderer().frames_presented() > 0);
    let frame = viewer.renderer().last_frame().unwrap();
    assert!(frame.layer(names::F_CU).is_some());

    viewer.set_grid_opacity(0.5);
    assert_eq!(viewer.state(), ViewerState::Interactive);

    let renderer = viewer.dispose();
    assert!(renderer.frames_presented() >= 2);
}

#[test]
fn test_builder_fails_on_empty_surface() {
    init_logging();
    let err = ViewerBuilder::<FrameRenderer>::new(Surface::new(0.0, 600.0))
        .load(Board::new())
        .unwrap_err();
    assert!(matches!(err, ViewerError::Renderer(_)));
}

#[test]
fn test_builder_fails_when_document_fails() {
    init_logging();
    let err = ViewerBuilder::<FrameRenderer>::new(Surface::new(800.0, 600.0))
        .load_with(|| {
            Err::<Board, _>(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "board.json missing",
            ))
        })
        .unwrap_err();
    assert!(matches!(err, ViewerError::Document(_)));
    assert!(err.to_string().contains("board.json missing"));
}

// ── Opacity ──────────────────────────────────────────────────────────

#[test]
fn test_default_opacities() {
    let viewer = viewer(track_and_via());
    let layers = viewer.layers();
    assert!(layers.zone_layers().all(|l| l.opacity() == 0.25));
    assert!(layers.copper_layers().all(|l| l.opacity() == 1.0));
    assert!(layers.via_layers().all(|l| l.opacity() == 1.0));
    assert_eq!(
        layers.by_name(layer_names::DRAWING_SHEET).unwrap().opacity(),
        1.0
    );
}

#[test]
fn test_builder_applies_theme_and_config() {
    init_logging();
    let mut config = ViewerConfig::default();
    config.default_opacity.zones = 0.6;
    config.default_opacity.grid = 0.0;
    let theme = BoardTheme {
        background: Color::rgb(16, 16, 16),
        ..BoardTheme::default()
    };
    let custom = ViewerBuilder::<FrameRenderer>::new(Surface::new(800.0, 600.0))
        .with_theme(theme.clone())
        .with_config(config)
        .load(track_and_via())
        .unwrap();
    assert_eq!(custom.theme().background, theme.background);
    assert!(custom.layers().zone_layers().all(|l| l.opacity() == 0.6));
    assert!(custom.layers().grid_layers().all(|l| l.opacity() == 0.0));
    assert!(custom.layers().copper_layers().all(|l| l.opacity() == 1.0));

    let stock = viewer(track_and_via());
    let custom_bg = custom.renderer().last_frame().unwrap().background;
    let stock_bg = stock.renderer().last_frame().unwrap().background;
    assert_ne!(custom_bg, stock_bg);
}

#[test]
fn test_opacity_setters_touch_only_their_category() {
    type Setter = fn(&mut BoardViewer<FrameRenderer>, f32);
    let cases: [(Setter, fn(&str) -> bool); 7] = [
        (BoardViewer::set_track_opacity, |n| !n.starts_with(':') && n.ends_with(".Cu")),
        (BoardViewer::set_via_opacity, |n| n.starts_with(":Via:")),
        (BoardViewer::set_pad_opacity, |n| n.starts_with(":Pads:")),
        (BoardViewer::set_pad_hole_opacity, |n| n.starts_with(":Pad:")),
        (BoardViewer::set_zone_opacity, |n| n.starts_with(":Zones:")),
        (BoardViewer::set_grid_opacity, |n| n == layer_names::GRID),
        (BoardViewer::set_page_opacity, |n| n == layer_names::DRAWING_SHEET),
    ];

    for (setter, in_category) in cases {
        let mut viewer = viewer(track_and_via());
        let before = opacities(&viewer);
        setter(&mut viewer, 0.4);
        let after = opacities(&viewer);

        let mut changed = 0;
        for ((name, old), (_, new)) in before.iter().zip(&after) {
            if in_category(name) {
                assert_eq!(*new, 0.4, "{name}");
                changed += 1;
            } else {
                assert_eq!(new, old, "{name} should be untouched");
            }
        }
        assert!(changed > 0);
    }
}

#[test]
fn test_opacity_is_clamped() {
    let mut viewer = viewer(track_and_via());
    viewer.set_via_opacity(3.0);
    assert!(viewer.layers().via_layers().all(|l| l.opacity() == 1.0));
    viewer.set_via_opacity(-0.5);
    assert!(viewer.layers().via_layers().all(|l| l.opacity() == 0.0));
}

#[test]
fn test_track_and_via_scenario() {
    let mut viewer = viewer(track_and_via());
    viewer.set_zone_opacity(0.5);
    let layers = viewer.layers();
    assert!(layers.zone_layers().all(|l| l.opacity() == 0.5));
    assert_eq!(layers.by_name(names::F_CU).unwrap().opacity(), 1.0);
    assert!(layers.via_layers().all(|l| l.opacity() == 1.0));

    assert!(viewer.zoom_to_board());
    let board = viewer.board();
    let tight = BBox::combine(&[board.segments[0].bbox(), board.vias[0].bbox()]).unwrap();
    let expected = tight.grow(tight.w * 0.1, tight.h * 0.1);
    assert_bbox_eq(&viewer.camera().bbox(), &expected);
}

// ── Camera ───────────────────────────────────────────────────────────

#[test]
fn test_empty_board_falls_back_to_page() {
    let mut viewer = viewer(Board::new());
    let page = viewer.board().page_bbox();
    assert_eq!(viewer.camera().bbox(), page);

    viewer.pan(40.0, 0.0);
    assert!(!viewer.zoom_to_board());
    viewer.zoom_to_page();
    assert_eq!(viewer.camera().bbox(), page);
    assert!(!viewer.zoom_to_fit());
}

#[test]
fn test_zoom_to_board_skips_annotations_and_fab() {
    let mut viewer = viewer(connector());
    assert!(viewer.zoom_to_board());

    let camera = viewer.camera().bbox();
    let board = viewer.board();
    let footprint = board.footprints[0]
        .bbox_filtered(is_printed_face_layer)
        .unwrap();
    for bb in [footprint, board.segments[0].bbox()] {
        assert!(camera.contains_point(&bb.start()) && camera.contains_point(&bb.end()));
    }
    // Neither the far dimension nor the F.Fab frame stretch the fit.
    assert!(!camera.contains_point(&Vec2::new(150.0, 150.0)));
    assert!(camera.w < 20.0);

    let tight = viewer.board_bbox().unwrap();
    assert!((camera.w - tight.w * 1.2).abs() < 1e-9);
    assert!((camera.h - tight.h * 1.2).abs() < 1e-9);
}

#[test]
fn test_zoom_at_and_resize_redraw() {
    let mut viewer = viewer(track_and_via());
    let frames = viewer.renderer().frames_presented();
    viewer.zoom_at(Vec2::new(400.0, 300.0), 2.0);
    viewer.resize(1024.0, 768.0);
    assert_eq!(viewer.renderer().frames_presented(), frames + 2);
    assert_eq!(viewer.renderer().size(), (1024.0, 768.0));
}

#[test]
fn test_empty_resize_keeps_camera_usable() {
    let mut viewer = viewer(track_and_via());
    let frames = viewer.renderer().frames_presented();
    assert!(!viewer.resize(0.0, 600.0));
    assert!(!viewer.resize(800.0, f64::NAN));
    assert_eq!(viewer.renderer().frames_presented(), frames);
    assert_eq!(viewer.renderer().size(), (800.0, 600.0));

    viewer.pan(10.0, 0.0);
    assert!(viewer.resize(800.0, 600.0));
    let camera = viewer.camera().bbox();
    assert!([camera.x, camera.y, camera.w, camera.h].iter().all(|v| v.is_finite()));

    let screen = viewer.camera().world_to_screen(Vec2::new(10.0, 5.0));
    assert!(viewer.pick(screen).next().is_some());
}

// ── Picking ──────────────────────────────────────────────────────────

#[test]
fn test_pick_is_reverse_paint_order() {
    let viewer = viewer(track_and_via());
    let screen = viewer.camera().world_to_screen(Vec2::new(10.0, 5.0));
    let hits: Vec<(&str, Option<ItemRef>)> = viewer
        .pick(screen)
        .map(|h| (h.layer.name(), h.bbox.context))
        .collect();
    assert_eq!(
        hits,
        vec![
            (layer_names::VIA_HOLES, Some(ItemRef::Via(0))),
            (layer_names::VIA_THROUGH, Some(ItemRef::Via(0))),
        ]
    );

    let order: Vec<&str> = viewer.layers().in_paint_order().map(|l| l.name()).collect();
    let positions: Vec<usize> = hits
        .iter()
        .map(|(name, _)| order.iter().position(|n| n == name).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] > w[1]));
}

#[test]
fn test_pick_over_nothing_is_empty() {
    let viewer = viewer(track_and_via());
    let screen = viewer.camera().world_to_screen(Vec2::new(5.0, 3.0));
    assert_eq!(viewer.pick(screen).count(), 0);
}

#[test]
fn test_hidden_layer_is_not_picked() {
    let mut viewer = viewer(track_and_via());
    viewer.set_via_opacity(0.0);
    let screen = viewer.camera().world_to_screen(Vec2::new(10.0, 5.0));
    assert_eq!(viewer.pick(screen).count(), 0);
}

// ── Selection ────────────────────────────────────────────────────────

#[test]
fn test_select_by_key_matches_footprint_bbox() {
    let mut viewer = viewer(connector());
    let expected = viewer.board().item_bbox(ItemRef::Footprint(0)).unwrap();

    viewer.select("U1");
    let selection = *viewer.selection().unwrap();
    assert_eq!(selection.item, Some(ItemRef::Footprint(0)));
    assert_eq!(selection.bbox, expected);
    assert!(!viewer
        .layers()
        .by_name(layer_names::OVERLAY)
        .unwrap()
        .draw_list()
        .is_empty());

    let uuid = viewer.board().footprints[0].uuid.to_string();
    viewer.select(SelectTarget::None);
    viewer.select(uuid);
    assert_eq!(viewer.selection().unwrap().bbox, expected);
}

#[test]
fn test_select_unknown_key_clears() {
    let mut viewer = viewer(connector());
    viewer.select(ItemRef::Segment(0));
    assert!(viewer.selection().is_some());

    viewer.select("R99");
    assert!(viewer.selection().is_none());
    assert!(viewer
        .layers()
        .by_name(layer_names::OVERLAY)
        .unwrap()
        .draw_list()
        .is_empty());
}

#[test]
fn test_select_none_is_idempotent() {
    let mut viewer = viewer(connector());
    viewer.select(BBox::new(0.0, 0.0, 5.0, 5.0));
    assert!(viewer.selection().is_some());
    for _ in 0..2 {
        viewer.select(SelectTarget::None);
        assert!(viewer.selection().is_none());
    }
}

#[test]
fn test_select_at_applies_policy() {
    let mut viewer = viewer(connector());
    let over_pad = viewer.camera().world_to_screen(Vec2::new(31.27, 30.0));

    let picked = viewer.select_at(over_pad, |item: ItemRef| item.is_footprint());
    assert_eq!(picked, Some(ItemRef::Footprint(0)));
    assert_eq!(viewer.selection().unwrap().item, Some(ItemRef::Footprint(0)));

    let picked = viewer.select_at(over_pad, |item: ItemRef| matches!(item, ItemRef::Segment(_)));
    assert_eq!(picked, Some(ItemRef::Segment(0)));

    let nowhere = viewer.camera().world_to_screen(Vec2::new(60.0, 60.0));
    assert_eq!(viewer.select_at(nowhere, |item: ItemRef| item.is_footprint()), None);
    assert!(viewer.selection().is_none());
}

// ── Painting ─────────────────────────────────────────────────────────

#[test]
fn test_repaint_is_byte_identical() {
    let mut viewer = viewer(connector());
    let before = draw_lists(&viewer);
    viewer.repaint();
    assert_eq!(before, draw_lists(&viewer));
}

#[test]
fn test_highlight_net_leaves_board_layers() {
    let mut viewer = viewer(connector());
    let before = draw_lists(&viewer);

    assert_eq!(viewer.highlight_net(2), 2);
    let highlight = viewer.layers().by_name(layer_names::HIGHLIGHT).unwrap();
    assert_eq!(highlight.bboxes().len(), 2);

    let after: Vec<String> = draw_lists(&viewer);
    let highlight_at = viewer
        .layers()
        .in_paint_order()
        .position(|l| l.name() == layer_names::HIGHLIGHT)
        .unwrap();
    for (i, (a, b)) in before.iter().zip(&after).enumerate() {
        if i != highlight_at {
            assert_eq!(a, b);
        }
    }

    assert_eq!(viewer.highlight_net(0), 0);
    assert!(viewer
        .layers()
        .by_name(layer_names::HIGHLIGHT)
        .unwrap()
        .draw_list()
        .is_empty());
}

#[test]
fn test_category_layers_follow_board() {
    let viewer = viewer(connector());
    let layers = viewer.layers();
    assert_eq!(layers.in_category(LayerCategory::Copper).count(), 2);
    let pads = layers.by_name(layer_names::PADS_FRONT).unwrap();
    assert_eq!(pads.bboxes()[0].context, Some(ItemRef::Footprint(0)));
    let walls = layers.by_name(layer_names::PAD_HOLE_WALLS).unwrap();
    assert_eq!(walls.draw_list().len(), 2);
}
