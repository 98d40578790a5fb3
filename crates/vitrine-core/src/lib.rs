//! Vitrine Core: shared errors, configuration, caching and lifecycle types.
//!
//! This crate has no internal Vitrine dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`config`]: TOML-backed engine configuration
//! - [`cache`]: Tagged cache service and its backends
//! - [`service`]: Engine lifecycle state handle
//! - [`util`]: Digest helpers

pub mod cache;
pub mod config;
pub mod error;
pub mod service;
pub mod util;

// Re-export key types at crate root for convenience
pub use cache::{CacheService, MemoryCache};
pub use config::{EngineConfig, PriceRangeCalculation, ServerAddr};
pub use error::{Error, Result};
pub use service::{EngineState, StateHandle};
pub use util::digest::{digest_bytes, digest_json};
