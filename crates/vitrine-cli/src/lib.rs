//! # vitrine-cli
//!
//! Operator tools for Vitrine search engines:
//! - Probe the index service and inspect the engine configuration
//! - Print the analysis settings and the product mapping
//! - Prepare, refresh and delete the index
//! - Run a search or a layered navigation cycle and print the result

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config_handlers;
pub mod error;

pub use cli::{Cli, Command, ConfigAction};
pub use commands::{App, NavigateRequest, run};
pub use error::{Error, Result};
