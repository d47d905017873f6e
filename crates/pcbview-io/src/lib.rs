//! # pcbview I/O
//!
//! Loads the documents a viewer is built from: boards, themes and viewer
//! configuration, all stored as JSON.

pub mod reader;

pub use reader::{
    read_board, read_board_from_str, read_config, read_config_from_str, read_theme,
    read_theme_from_str, BoardReader, LoadError,
};
