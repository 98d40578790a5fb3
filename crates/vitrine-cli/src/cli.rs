//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use vitrine_search::StoreLocale;

/// Vitrine - catalog search and layered navigation
#[derive(Parser, Debug)]
#[command(name = "vitrine", author, version, about, long_about = None)]
pub struct Cli {
    /// Engine configuration file (TOML)
    #[arg(short, long, env = "VITRINE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Attribute catalog (JSON array of attributes)
    #[arg(long, env = "VITRINE_CATALOG", global = true)]
    pub catalog: Option<PathBuf>,

    /// Store served by the engine, as `<store id>:<locale>`; repeatable
    #[arg(long = "store", value_parser = parse_store, global = true)]
    pub stores: Vec<StoreLocale>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the index service answers
    Ping,
    /// Print the index analysis settings
    Settings,
    /// Print the product mapping
    Schema,
    /// Create or update the index and push the mapping
    Prepare,
    /// Make recent writes visible to search
    Refresh,
    /// Run a fulltext search
    Search {
        /// Query text
        query: String,
        /// Store to search in
        #[arg(long = "store-id", default_value_t = 1)]
        store: u32,
        /// Page size
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Term facet to count; repeatable
        #[arg(long = "facet")]
        facets: Vec<String>,
    },
    /// Build the layered navigation of a category
    Navigate {
        /// Category tree (JSON array of categories)
        #[arg(long)]
        categories: PathBuf,
        /// Category to navigate in
        #[arg(long)]
        category: u64,
        /// Applied filters, as a query string (`color=12&price=10-20`)
        #[arg(long, default_value = "")]
        filters: String,
        /// Search text; navigates a search result page instead
        #[arg(long)]
        query: Option<String>,
        /// Store to navigate in
        #[arg(long = "store-id", default_value_t = 1)]
        store: u32,
        /// Website of the store
        #[arg(long, default_value_t = 1)]
        website: u32,
        /// Customer group of the visitor
        #[arg(long, default_value_t = 0)]
        customer_group: u32,
    },
    /// Delete the whole index
    DeleteIndex {
        /// Skip the confirmation guard
        #[arg(long)]
        yes: bool,
    },
    /// Inspect the engine configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved configuration
    Show,
    /// Print one value by dotted key
    Get {
        /// Dotted key, e.g. `languages.fr`
        key: String,
    },
    /// Write a configuration file with every default
    Init {
        /// Target file
        file: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Parse `<store id>:<locale>`.
pub fn parse_store(input: &str) -> std::result::Result<StoreLocale, String> {
    let (id, locale) = input
        .split_once(':')
        .ok_or_else(|| format!("expected <store id>:<locale>, got '{input}'"))?;
    let store_id = id
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid store id '{id}': {e}"))?;
    let locale = locale.trim();
    if locale.is_empty() {
        return Err(format!("missing locale in '{input}'"));
    }
    Ok(StoreLocale::new(store_id, locale))
}

// ============================================================================
// Tests
// ============================================================================
