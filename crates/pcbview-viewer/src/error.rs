use thiserror::Error;

use pcbview_renderer::RendererInitError;

/// Boxed error from a document loader.
pub type LoaderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reasons a viewer could not be brought to the ready state.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("renderer initialization failed: {0}")]
    Renderer(#[from] RendererInitError),

    #[error("document could not be loaded: {0}")]
    Document(#[source] LoaderError),
}
