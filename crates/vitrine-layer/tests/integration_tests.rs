//! Integration test suite for vitrine-layer.
//!
//! Drives whole navigation cycles through the engine registry, a mock index
//! transport and the in-memory cache.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
mod integration;
