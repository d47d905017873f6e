//! # pcbview Core
//!
//! Board document model, geometric primitives, layer naming, color themes,
//! and an R-tree spatial index for hit testing.
//!
//! Everything the viewer draws is read from a [`Board`]; every hit-test result
//! points back into it through an [`ItemRef`].

pub mod geometry;
pub mod board;
pub mod layer;
pub mod theme;
pub mod spatial;

pub use board::{Board, BoardItem, Footprint, ItemRef, NetId};
pub use geometry::{BBox, Transform, Vec2};
pub use layer::{BoardLayer, BoardLayerKind};
pub use spatial::SpatialIndex;
pub use theme::{BoardTheme, Color, LayerStyle};
