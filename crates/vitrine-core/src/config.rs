//! Engine configuration.
//!
//! Configuration is read from TOML. Every key has a default except `index`,
//! which [`EngineConfig::validate`] requires: an engine cannot be built
//! without an index name.
//!
//! ```rust
//! use vitrine_core::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     index = "catalog"
//!     servers = "es1:9200, es2:9201"
//!     enable_fuzzy_query = true
//! "#).unwrap();
//!
//! assert_eq!(config.server_addrs().len(), 2);
//! assert!(config.enable_fuzzy_query);
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default port for the search index service.
pub const DEFAULT_PORT: u16 = 9200;

/// How the width of price buckets is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceRangeCalculation {
    /// Fixed width from `price_range`.
    #[default]
    Auto,
    /// Width derived from the maximum price statistic.
    Improved,
}

/// A single `host:port` entry of the server list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddr {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl ServerAddr {
    /// Base URL of this server.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Search engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Registry key of the engine implementation.
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Index name. Required.
    #[serde(default)]
    pub index: Option<String>,

    /// Comma-separated `host:port` list.
    #[serde(default = "default_servers")]
    pub servers: String,

    /// Transport timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Shard count used when the index is created.
    #[serde(default = "default_shards")]
    pub number_of_shards: u32,

    /// Replica count.
    #[serde(default)]
    pub number_of_replicas: u32,

    /// Add a fuzzy clause to fulltext queries.
    #[serde(default)]
    pub enable_fuzzy_query: bool,

    /// Fuzzy minimum similarity, clamped to `[0, 0.99]` when read.
    #[serde(default = "default_fuzzy_min_similarity")]
    pub fuzzy_min_similarity: f64,

    /// Number of leading characters that must match exactly.
    #[serde(default)]
    pub fuzzy_prefix_length: u32,

    /// Maximum number of query terms considered by the fuzzy clause.
    #[serde(default = "default_fuzzy_max_query_terms")]
    pub fuzzy_max_query_terms: u32,

    /// Boost of the fuzzy clause.
    #[serde(default = "default_boost")]
    pub fuzzy_query_boost: f64,

    /// Prepend `icu_folding` to every analyzer.
    #[serde(default)]
    pub enable_icu_folding: bool,

    /// Size of term facets.
    #[serde(default = "default_facets_max_size")]
    pub facets_max_size: u32,

    /// Also search option labels through the virtual `_options` field.
    #[serde(default)]
    pub enable_options_search: bool,

    /// Echo contained search errors to the operator channel.
    #[serde(default)]
    pub enable_debug_mode: bool,

    /// Lifetime of cache entries in seconds.
    #[serde(default = "default_cache_lifetime_secs")]
    pub cache_lifetime_secs: u64,

    /// Width of a price bucket.
    #[serde(default = "default_price_range")]
    pub price_range: f64,

    /// How bucket widths are chosen.
    #[serde(default)]
    pub price_range_calculation: PriceRangeCalculation,

    /// Bucket cap for the improved width computation.
    #[serde(default = "default_max_price_intervals")]
    pub max_price_intervals: u32,

    /// Fallback maximum price when the statistic is not numeric.
    #[serde(default)]
    pub default_max_price: f64,

    /// Override of the language → locales table (empty: built-in table).
    #[serde(default)]
    pub languages: BTreeMap<String, Vec<String>>,
}

fn default_engine() -> String {
    "elasticsearch".to_string()
}

fn default_servers() -> String {
    format!("localhost:{DEFAULT_PORT}")
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_shards() -> u32 {
    1
}

fn default_fuzzy_min_similarity() -> f64 {
    0.5
}

fn default_fuzzy_max_query_terms() -> u32 {
    25
}

fn default_boost() -> f64 {
    1.0
}

fn default_facets_max_size() -> u32 {
    10_000
}

fn default_cache_lifetime_secs() -> u64 {
    7200
}

fn default_price_range() -> f64 {
    10.0
}

fn default_max_price_intervals() -> u32 {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            index: None,
            servers: default_servers(),
            timeout_secs: default_timeout_secs(),
            number_of_shards: default_shards(),
            number_of_replicas: 0,
            enable_fuzzy_query: false,
            fuzzy_min_similarity: default_fuzzy_min_similarity(),
            fuzzy_prefix_length: 0,
            fuzzy_max_query_terms: default_fuzzy_max_query_terms(),
            fuzzy_query_boost: default_boost(),
            enable_icu_folding: false,
            facets_max_size: default_facets_max_size(),
            enable_options_search: false,
            enable_debug_mode: false,
            cache_lifetime_secs: default_cache_lifetime_secs(),
            price_range: default_price_range(),
            price_range_calculation: PriceRangeCalculation::default(),
            max_price_intervals: default_max_price_intervals(),
            default_max_price: 0.0,
            languages: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parse configuration from a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("Loaded engine configuration from {}", path.display());
        Ok(config)
    }

    /// Check the settings an engine cannot start without.
    pub fn validate(&self) -> Result<()> {
        self.index_name()?;
        if self.server_addrs().is_empty() {
            return Err(Error::config("At least one search server must be defined"));
        }
        Ok(())
    }

    /// The configured index name.
    pub fn index_name(&self) -> Result<&str> {
        match self.index.as_deref().map(str::trim) {
            Some(index) if !index.is_empty() => Ok(index),
            _ => Err(Error::config("Index must be defined for search engine client")),
        }
    }

    /// Parse the server list. Entries without a port use [`DEFAULT_PORT`];
    /// entries with an unparsable port are skipped.
    pub fn server_addrs(&self) -> Vec<ServerAddr> {
        self.servers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|server| {
                let (host, port) = match server.split_once(':') {
                    Some((host, port)) => match port.trim().parse() {
                        Ok(port) => (host, port),
                        Err(_) => {
                            log::warn!("Ignoring search server with invalid port: {server}");
                            return None;
                        }
                    },
                    None => (server, DEFAULT_PORT),
                };
                Some(ServerAddr {
                    host: host.trim().to_string(),
                    port,
                })
            })
            .collect()
    }

    /// Transport timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Cache entry lifetime.
    pub fn cache_lifetime(&self) -> Duration {
        Duration::from_secs(self.cache_lifetime_secs)
    }

    /// Fuzzy minimum similarity clamped to `[0, 0.99]`.
    pub fn fuzzy_min_similarity(&self) -> f64 {
        self.fuzzy_min_similarity.clamp(0.0, 0.99)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.engine, "elasticsearch");
        assert!(config.index.is_none());
        assert_eq!(config.facets_max_size, 10_000);
        assert_eq!(config.price_range_calculation, PriceRangeCalculation::Auto);
        assert_eq!(config.cache_lifetime(), Duration::from_secs(7200));
    }

    #[test]
    fn test_missing_index_is_config_error() {
        let config = EngineConfig::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let blank = EngineConfig {
            index: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_server_list_parsing() {
        let config = EngineConfig {
            servers: "es1:9200, es2 : 9300,es3,bad:port".to_string(),
            ..Default::default()
        };
        let addrs = config.server_addrs();
        assert_eq!(addrs.len(), 3);
        assert_eq!(addrs[0].base_url(), "http://es1:9200");
        assert_eq!(addrs[1].host, "es2");
        assert_eq!(addrs[1].port, 9300);
        assert_eq!(addrs[2].port, DEFAULT_PORT);
    }

    #[test]
    fn test_fuzzy_similarity_is_clamped() {
        let high = EngineConfig {
            fuzzy_min_similarity: 3.0,
            ..Default::default()
        };
        assert_eq!(high.fuzzy_min_similarity(), 0.99);

        let low = EngineConfig {
            fuzzy_min_similarity: -1.0,
            ..Default::default()
        };
        assert_eq!(low.fuzzy_min_similarity(), 0.0);
    }

    #[test]
    fn test_from_toml_with_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            index = "catalog"
            price_range_calculation = "improved"

            [languages]
            en = ["en_US"]
            "#,
        )
        .unwrap();
        assert_eq!(config.index_name().unwrap(), "catalog");
        assert_eq!(config.price_range_calculation, PriceRangeCalculation::Improved);
        assert_eq!(config.languages["en"], vec!["en_US".to_string()]);
        assert_eq!(config.price_range, 10.0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vitrine.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "index = \"products\"\nfacets_max_size = 50").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.index.as_deref(), Some("products"));
        assert_eq!(config.facets_max_size, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/vitrine.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
