//! # pcbview Renderer
//!
//! The drawing side of the board viewer: per-layer draw lists, the camera that
//! maps world to screen space, and the [`Renderer`] backend contract.
//!
//! [`FrameRenderer`] is the bundled backend. It composites layers into
//! JSON-serializable [`RenderFrame`]s that a GPU canvas consumes.

pub mod camera;
pub mod render_data;
pub mod renderer;

pub use camera::Camera;
pub use render_data::{DrawList, Primitive, RenderFrame, RenderLayer};
pub use renderer::{FrameRenderer, LayerBatch, Renderer, RendererInitError, Surface};
