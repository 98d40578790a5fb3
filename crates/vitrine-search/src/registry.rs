//! Engine registry.
//!
//! Maps the configured `engine` key to a constructor. Construction validates
//! the configuration first, so a missing index name or an unknown key fails
//! at startup instead of at the first search.
//!
//! ```rust,ignore
//! let registry = EngineRegistry::with_defaults();
//! let engine = registry.create(context)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use vitrine_core::{CacheService, EngineConfig, MemoryCache};

use crate::attribute::AttributeCatalog;
use crate::elasticsearch::ElasticsearchEngine;
use crate::engine::{Engine, SearchEngine};
use crate::error::{Error, Result};
use crate::locale::LanguageTable;
use crate::naming::FieldNamer;
use crate::schema::StoreLocale;
use crate::transport::{HttpTransport, IndexTransport};

/// Everything an engine constructor needs.
#[derive(Clone)]
pub struct EngineContext {
    /// Engine configuration.
    pub config: EngineConfig,
    /// Transport override; `None` builds an HTTP transport from the config.
    pub transport: Option<Arc<dyn IndexTransport>>,
    /// Cache service.
    pub cache: Arc<dyn CacheService>,
    /// Attribute catalog.
    pub catalog: Arc<AttributeCatalog>,
    /// Stores and their locales.
    pub stores: Vec<StoreLocale>,
    /// Locale of the current store.
    pub default_locale: Option<String>,
}

impl EngineContext {
    /// Context with an in-memory cache, an empty catalog and no store.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            transport: None,
            cache: Arc::new(MemoryCache::new()),
            catalog: Arc::new(AttributeCatalog::default()),
            stores: Vec::new(),
            default_locale: None,
        }
    }

    /// Use this transport instead of HTTP.
    pub fn with_transport(mut self, transport: Arc<dyn IndexTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use this cache.
    pub fn with_cache(mut self, cache: Arc<dyn CacheService>) -> Self {
        self.cache = cache;
        self
    }

    /// Use this attribute catalog.
    pub fn with_catalog(mut self, catalog: AttributeCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    /// Serve these stores.
    pub fn with_stores(mut self, stores: Vec<StoreLocale>) -> Self {
        self.stores = stores;
        self
    }

    /// Set the current store's locale.
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    /// Field namer over the catalog and the configured language table.
    pub fn field_namer(&self) -> FieldNamer {
        let namer = FieldNamer::new(
            Arc::clone(&self.catalog),
            Arc::new(LanguageTable::from_config(&self.config)),
        );
        match &self.default_locale {
            Some(locale) => namer.with_default_locale(locale.clone()),
            None => namer,
        }
    }

    /// The transport override, or an HTTP transport.
    pub fn transport(&self) -> Result<Arc<dyn IndexTransport>> {
        match &self.transport {
            Some(transport) => Ok(Arc::clone(transport)),
            None => Ok(Arc::new(HttpTransport::from_config(&self.config)?)),
        }
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("engine", &self.config.engine)
            .field("index", &self.config.index)
            .field("cache", &self.cache.name())
            .field("attributes", &self.catalog.len())
            .field("stores", &self.stores)
            .finish()
    }
}

/// Engine constructor.
pub type EngineFactory = fn(&EngineContext) -> Result<Arc<dyn SearchEngine>>;

/// Registry of engine constructors by key.
#[derive(Debug, Clone, Default)]
pub struct EngineRegistry {
    factories: BTreeMap<String, EngineFactory>,
}

impl EngineRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in engines.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ElasticsearchEngine::NAME, create_elasticsearch);
        registry
    }

    /// Register (or replace) a constructor.
    pub fn register(&mut self, key: impl Into<String>, factory: EngineFactory) {
        self.factories.insert(key.into(), factory);
    }

    /// Registered keys.
    pub fn keys(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Build the backend selected by `context.config.engine`.
    pub fn create_backend(&self, context: &EngineContext) -> Result<Arc<dyn SearchEngine>> {
        context.config.validate()?;
        let key = context.config.engine.as_str();
        let factory = self
            .factories
            .get(key)
            .ok_or_else(|| Error::unknown_engine(key, &self.keys()))?;
        log::info!("Creating search engine '{key}'");
        factory(context)
    }

    /// Build the engine front selected by `context.config.engine`.
    pub fn create(&self, context: &EngineContext) -> Result<Engine> {
        Ok(Engine::new(self.create_backend(context)?))
    }
}

fn create_elasticsearch(context: &EngineContext) -> Result<Arc<dyn SearchEngine>> {
    Ok(Arc::new(ElasticsearchEngine::new(
        context.config.clone(),
        context.transport()?,
        Arc::clone(&context.cache),
        context.field_namer(),
        context.stores.clone(),
    )?))
}

// ============================================================================
// Tests
// ============================================================================
