//! Error types for vitrine-layer.
//!
//! Navigation never fails because of a bad filter value or a failed search;
//! those are absorbed where they happen. What remains are failures of the
//! collaborators this crate is handed (category repository, fixtures).

/// Result type alias for vitrine-layer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by layered navigation collaborators.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Error from the search layer.
    #[error(transparent)]
    Search(#[from] vitrine_search::Error),

    /// Error from vitrine-core.
    #[error(transparent)]
    Core(#[from] vitrine_core::Error),

    /// Category lookup failed.
    #[error("Category {id} could not be loaded: {message}")]
    Category {
        /// Requested category id
        id: u64,
        /// What went wrong
        message: String,
    },
}

impl Error {
    /// Creates a category lookup error.
    pub fn category<S: Into<String>>(id: u64, message: S) -> Self {
        Error::Category {
            id,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Core(e.into())
    }
}
