//! Error types for vitrine-cli

use thiserror::Error;

/// Result type alias for vitrine-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vitrine-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from vitrine-core
    #[error("Core error: {0}")]
    Core(#[from] vitrine_core::Error),

    /// Error from vitrine-search
    #[error("Search error: {0}")]
    Search(#[from] vitrine_search::Error),

    /// Error from vitrine-layer
    #[error("Navigation error: {0}")]
    Layer(#[from] vitrine_layer::Error),

    /// Command-line usage the engine cannot act on
    #[error("{0}")]
    Usage(String),

    /// Configuration could not be rendered as TOML
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Output could not be rendered as JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Error::Usage(message.into())
    }
}
