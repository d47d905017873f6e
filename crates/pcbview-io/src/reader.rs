//! JSON readers for boards, themes and viewer configuration.
//!
//! Boards are checked after parsing so that a viewer never sees geometry it
//! cannot paint: negative widths, vias whose drill exceeds their size, and
//! pads without area are rejected.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use thiserror::Error;

use pcbview_core::board::Board;
use pcbview_core::theme::BoardTheme;
use pcbview_viewer::ViewerConfig;

// ── Errors ────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {item}: {message}")]
    Invalid { item: String, message: String },
}

fn invalid(item: String, message: &str) -> LoadError {
    LoadError::Invalid {
        item,
        message: message.to_string(),
    }
}

// ── Board reader ──────────────────────────────────────────────────────

pub struct BoardReader<R: Read> {
    reader: R,
}

impl<R: Read> BoardReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Parse and check a whole board document.
    pub fn read(&mut self) -> Result<Board, LoadError> {
        let board: Board = serde_json::from_reader(&mut self.reader)?;
        check_board(&board)?;
        log::info!(
            "Board loaded: {} footprints, {} segments, {} vias, {} zones, {} drawings",
            board.footprints.len(),
            board.segments.len(),
            board.vias.len(),
            board.zones.len(),
            board.drawings.len()
        );
        Ok(board)
    }
}

fn check_board(board: &Board) -> Result<(), LoadError> {
    for (i, s) in board.segments.iter().enumerate() {
        if !(s.width.is_finite() && s.width >= 0.0) {
            return Err(invalid(format!("segment {i}"), "width must be a non-negative number"));
        }
    }
    for (i, v) in board.vias.iter().enumerate() {
        if !(v.size > 0.0) {
            return Err(invalid(format!("via {i}"), "size must be positive"));
        }
        if !(v.drill >= 0.0 && v.drill <= v.size) {
            return Err(invalid(format!("via {i}"), "drill must lie between 0 and the via size"));
        }
    }
    for fp in &board.footprints {
        for pad in &fp.pads {
            if !(pad.size.x > 0.0 && pad.size.y > 0.0) {
                return Err(invalid(
                    format!("pad {}.{}", fp.reference, pad.number),
                    "size must be positive",
                ));
            }
        }
    }
    for (i, zone) in board.zones.iter().enumerate() {
        if zone.filled_polygons.iter().any(|p| p.points.len() < 3) {
            return Err(invalid(format!("zone {i}"), "filled polygon has fewer than 3 points"));
        }
    }

    let mut seen = std::collections::HashSet::new();
    for fp in &board.footprints {
        if !seen.insert(fp.uuid) {
            log::warn!("Footprint {} shares UUID {} with another footprint", fp.reference, fp.uuid);
        }
    }
    Ok(())
}

pub fn read_board(path: impl AsRef<Path>) -> Result<Board, LoadError> {
    let path = path.as_ref();
    log::info!("Reading board {}", path.display());
    let file = File::open(path)?;
    BoardReader::new(BufReader::new(file)).read()
}

pub fn read_board_from_str(json: &str) -> Result<Board, LoadError> {
    BoardReader::new(json.as_bytes()).read()
}

// ── Theme and configuration ───────────────────────────────────────────

pub fn read_theme(path: impl AsRef<Path>) -> Result<BoardTheme, LoadError> {
    let file = File::open(path.as_ref())?;
    let theme: BoardTheme = serde_json::from_reader(BufReader::new(file))?;
    log::debug!("Theme loaded with {} layer styles", theme.layers.len());
    Ok(theme)
}

pub fn read_theme_from_str(json: &str) -> Result<BoardTheme, LoadError> {
    Ok(serde_json::from_str(json)?)
}

pub fn read_config(path: impl AsRef<Path>) -> Result<ViewerConfig, LoadError> {
    let file = File::open(path.as_ref())?;
    let config: ViewerConfig = serde_json::from_reader(BufReader::new(file))?;
    log::debug!("Viewer config loaded: {config:?}");
    Ok(config)
}

pub fn read_config_from_str(json: &str) -> Result<ViewerConfig, LoadError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcbview_core::board::ItemRef;
    use pcbview_core::theme::Color;
    use pcbview_renderer::{FrameRenderer, Surface};
    use pcbview_viewer::{ViewerBuilder, ViewerError};

    const BOARD: &str = r#"{
        "paper": {"size": "A3", "width": 420.0, "height": 297.0},
        "nets": [{"number": 1, "name": "GND"}],
        "footprints": [{
            "reference": "R1",
            "at": {"x": 50.0, "y": 40.0},
            "pads": [
                {"number": "1", "kind": "smd", "shape": "rect", "at": {"x": -1.0, "y": 0.0},
                 "size": {"x": 1.0, "y": 1.2}, "layers": ["F.Cu", "F.Mask"], "net": 1},
                {"number": "2", "kind": "smd", "shape": "rect", "at": {"x": 1.0, "y": 0.0},
                 "size": {"x": 1.0, "y": 1.2}, "layers": ["F.Cu", "F.Mask"]}
            ]
        }],
        "segments": [
            {"start": {"x": 49.0, "y": 40.0}, "end": {"x": 30.0, "y": 40.0},
             "width": 0.25, "layer": "F.Cu", "net": 1}
        ],
        "vias": [{"at": {"x": 30.0, "y": 40.0}, "size": 0.8, "drill": 0.4, "net": 1}]
    }"#;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_read_board_from_str() {
        init_logging();
        let board = read_board_from_str(BOARD).unwrap();
        assert_eq!(board.footprints.len(), 1);
        assert_eq!(board.net_name(1), Some("GND"));
        assert!((board.page_bbox().w - 420.0).abs() < 1e-9);
        assert!(board.find_footprint("R1").is_some());
        assert_eq!(board.vias[0].layers[0], "F.Cu");
    }

    #[test]
    fn test_empty_document() {
        let board = read_board_from_str("{}").unwrap();
        assert!(board.is_empty());
        assert!((board.page_bbox().w - 297.0).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_json() {
        let err = read_board_from_str("{\"segments\": [").unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }

    fn rejected_item(json: &str) -> String {
        match read_board_from_str(json) {
            Err(LoadError::Invalid { item, .. }) => item,
            other => panic!("expected an invalid board, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_via_rejected() {
        let json = r#"{"vias": [{"at": {"x": 0.0, "y": 0.0}, "size": 0.4, "drill": 0.8}]}"#;
        assert_eq!(rejected_item(json), "via 0");
    }

    #[test]
    fn test_negative_track_width_rejected() {
        let json = r#"{"segments": [
            {"start": {"x": 0.0, "y": 0.0}, "end": {"x": 1.0, "y": 0.0}, "width": 0.2, "layer": "F.Cu"},
            {"start": {"x": 0.0, "y": 0.0}, "end": {"x": 1.0, "y": 0.0}, "width": -0.2, "layer": "F.Cu"}
        ]}"#;
        assert_eq!(rejected_item(json), "segment 1");
    }

    #[test]
    fn test_nan_track_width_rejected() {
        // JSON has no NaN literal, so this only arrives from boards built in code.
        assert!(read_board_from_str(r#"{"segments": [{"start": {"x": 0.0, "y": 0.0},
            "end": {"x": 1.0, "y": 0.0}, "width": NaN, "layer": "F.Cu"}]}"#)
            .is_err_and(|e| matches!(e, LoadError::Json(_))));

        let mut board = read_board_from_str(BOARD).unwrap();
        assert!(check_board(&board).is_ok());
        board.segments[0].width = f64::NAN;
        match check_board(&board) {
            Err(LoadError::Invalid { item, .. }) => assert_eq!(item, "segment 0"),
            other => panic!("expected invalid segment, got {other:?}"),
        }
    }

    #[test]
    fn test_pad_without_area_rejected() {
        let json = r#"{"footprints": [{
            "reference": "J3",
            "at": {"x": 0.0, "y": 0.0},
            "pads": [{"number": "2", "kind": "smd", "shape": "rect", "at": {"x": 0.0, "y": 0.0},
                      "size": {"x": 1.0, "y": 0.0}, "layers": ["F.Cu"]}]
        }]}"#;
        assert_eq!(rejected_item(json), "pad J3.2");
    }

    #[test]
    fn test_zone_sliver_polygon_rejected() {
        let json = r#"{"zones": [{
            "layers": ["B.Cu"],
            "outline": [{"x": 0.0, "y": 0.0}, {"x": 5.0, "y": 0.0}, {"x": 5.0, "y": 5.0}],
            "filled_polygons": [{"layer": "B.Cu", "points": [{"x": 0.0, "y": 0.0}, {"x": 5.0, "y": 0.0}]}]
        }]}"#;
        assert_eq!(rejected_item(json), "zone 0");
    }

    #[test]
    fn test_read_board_from_file() {
        init_logging();
        let path = std::env::temp_dir().join(format!("pcbview-io-{}.json", std::process::id()));
        std::fs::write(&path, BOARD).unwrap();
        let board = read_board(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(board.segments.len(), 1);

        let err = read_board(&path).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn test_theme_and_config() {
        let json = r##"{"background": "#101010", "layers": {"F.Cu": {"color": "#FF000080"}}}"##;
        let theme = read_theme_from_str(json).unwrap();
        assert_eq!(theme.background, Color::rgb(16, 16, 16));
        assert_eq!(theme.layer_color("F.Cu"), Color::rgba(255, 0, 0, 128));
        assert_eq!(theme.via_hole, BoardTheme::default().via_hole);
        assert!(read_theme_from_str(r#"{"background": "red"}"#).is_err());

        let config = read_config_from_str(r#"{"fit_margin": 0.2}"#).unwrap();
        assert!((config.fit_margin - 0.2).abs() < 1e-9);
        assert_eq!(config.default_opacity.zones, 0.25);
    }

    #[test]
    fn test_viewer_from_loaded_board() {
        init_logging();
        let mut viewer = ViewerBuilder::<FrameRenderer>::new(Surface::new(640.0, 480.0))
            .load_with(|| read_board_from_str(BOARD))
            .unwrap();
        viewer.select("R1");
        assert_eq!(viewer.selection().unwrap().item, Some(ItemRef::Footprint(0)));
        assert_eq!(viewer.highlight_net(1), 3);

        let err = ViewerBuilder::<FrameRenderer>::new(Surface::new(640.0, 480.0))
            .load_with(|| read_board_from_str("[1, 2"))
            .unwrap_err();
        assert!(matches!(err, ViewerError::Document(_)));
    }
}
