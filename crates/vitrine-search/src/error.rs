//! Error types for vitrine-search.

/// Result type alias for vitrine-search operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by engines, transports and the engine registry.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Error from vitrine-core (configuration, transport, cache, ...).
    #[error(transparent)]
    Core(#[from] vitrine_core::Error),

    /// HTTP client failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured engine key is not registered.
    #[error("Unknown search engine '{name}' (available: {available})")]
    UnknownEngine {
        /// Requested engine key
        name: String,
        /// Comma-separated registered keys
        available: String,
    },
}

impl Error {
    /// Returns whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Core(e) => e.is_retryable(),
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::UnknownEngine { .. } => false,
        }
    }

    /// Creates an unknown-engine error listing the registered keys.
    pub fn unknown_engine<S: Into<String>>(name: S, available: &[&str]) -> Self {
        Error::UnknownEngine {
            name: name.into(),
            available: available.join(", "),
        }
    }

    /// Creates a transport error.
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Error::Core(vitrine_core::Error::transport(message))
    }

    /// Creates a malformed-response error.
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Error::Core(vitrine_core::Error::malformed(message))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Core(e.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_engine_lists_available() {
        let err = Error::unknown_engine("solr", &["elasticsearch"]);
        assert_eq!(
            err.to_string(),
            "Unknown search engine 'solr' (available: elasticsearch)"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_core_errors_keep_classification() {
        assert!(Error::transport("refused").is_retryable());
        assert!(!Error::malformed("no hits").is_retryable());

        let config: Error = vitrine_core::Error::config("no index").into();
        assert!(config.to_string().contains("no index"));
    }
}
