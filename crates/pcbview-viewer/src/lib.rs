//! # pcbview Viewer
//!
//! Turns a parsed [`Board`](pcbview_core::Board) into a layered, pannable and
//! zoomable scene:
//!
//! - [`LayerSet`]: the ordered view layers, back to front
//! - [`BoardPainter`]: projects board entities onto those layers
//! - [`BoardViewer`]: picking, selection, net highlight, opacity controls and
//!   camera fitting on top of a [`Renderer`](pcbview_renderer::Renderer)
//!
//! A viewer is obtained from [`ViewerBuilder`], which only hands it out once
//! the renderer is up, the board is painted and the camera is fitted.

pub mod board_viewer;
pub mod config;
pub mod error;
pub mod layers;
pub mod painter;
pub mod viewer;

pub use board_viewer::{BoardViewer, SelectTarget, ViewerBuilder};
pub use config::{DefaultOpacity, ViewerConfig};
pub use error::{LoaderError, ViewerError};
pub use layers::{layer_names, LayerCategory, LayerHit, LayerKind, LayerSet, ViewLayer};
pub use painter::BoardPainter;
pub use viewer::{DocumentViewer, Selection, ViewerState};
