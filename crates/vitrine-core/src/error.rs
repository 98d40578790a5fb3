//! Error types for vitrine-core.
//!
//! Validation failures (an invalid filter value, an unknown attribute code)
//! are deliberately absent from this enum: they are reported through `Option`
//! or `bool` returns and never surface as errors.

use std::path::PathBuf;

/// Result type alias for vitrine-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Vitrine.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Missing or invalid engine configuration. Fatal at construction time.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// The search index service could not be reached or rejected a request.
    #[error("Transport error: {message}")]
    Transport {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The search index service answered with something we cannot decode.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The engine is not in a state that can serve the operation.
    #[error("Engine '{engine}' unavailable: {reason}")]
    Unavailable {
        /// Engine name
        engine: String,
        /// Why it cannot serve
        reason: String,
    },

    /// Cache backend failure.
    #[error("Cache error: {0}")]
    Cache(String),

    /// I/O error with the offending path.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Returns whether this error is retryable.
    ///
    /// Transport failures and cache hiccups are transient; configuration and
    /// decoding problems are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::Cache(_) => true,
            Error::Unavailable { .. } => true,
            Error::Io { .. } => true,
            Error::Config { .. } => false,
            Error::MalformedResponse(_) => false,
            Error::Json(_) => false,
            Error::Toml(_) => false,
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a new transport error.
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Error::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new transport error with a source error.
    pub fn transport_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new malformed-response error.
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Error::MalformedResponse(message.into())
    }

    /// Creates a new unavailable-engine error.
    pub fn unavailable<E: Into<String>, R: Into<String>>(engine: E, reason: R) -> Self {
        Error::Unavailable {
            engine: engine.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new cache error.
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Error::Cache(message.into())
    }

    /// Wraps an I/O error with the path it happened on.
    pub fn io_with_path(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
