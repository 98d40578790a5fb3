//! Utility modules.
//!
//! - [`digest`]: stable digests used to partition cache keys

pub mod digest;
