//! Error types for the readiness gate

use thiserror::Error;

/// Result type alias for gate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a page and rendering its diagrams
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The rendering capability refused its configuration
    #[error("Renderer initialization failed: {0}")]
    InitializationError(String),

    /// A single diagram failed to render
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// The placeholder has no parent container to receive markup
    #[error("Placeholder {0} has no parent container")]
    MissingContainer(String),

    /// The renderer dropped the completion callback without calling it
    #[error("Renderer dropped the completion callback for {0}")]
    CallbackDropped(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Document lookup or mutation failed
    #[error("Document error: {0}")]
    DocumentError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}
