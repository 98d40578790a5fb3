//! Command implementations.
//!
//! [`App`] resolves configuration, catalog and stores once; each command
//! builds what it needs from it and returns a printable value so the
//! handlers can be exercised without a terminal.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Value, json};
use vitrine_core::{CacheService, EngineConfig, MemoryCache};
use vitrine_layer::{
    FilterRequest, Layer, LayerScope, LayoutBuilder, MemoryCategories, NavigationLayout,
};
use vitrine_search::{
    AttributeCatalog, ElasticsearchEngine, Engine, EngineContext, EngineRegistry, IndexTransport,
    PRODUCT_TYPE, QueryParams, StoreLocale,
};

use crate::cli::{Cli, Command};
use crate::config_handlers::handle_config_command;
use crate::error::{Error, Result};

/// Store served when none is given on the command line.
pub const DEFAULT_STORE: (u32, &str) = (1, "en_US");

/// Resolved command-line environment.
pub struct App {
    config: EngineConfig,
    catalog: AttributeCatalog,
    stores: Vec<StoreLocale>,
    cache: Arc<MemoryCache>,
    transport: Option<Arc<dyn IndexTransport>>,
}

impl App {
    /// Environment over an explicit configuration.
    pub fn new(config: EngineConfig, catalog: AttributeCatalog, stores: Vec<StoreLocale>) -> Self {
        let stores = if stores.is_empty() {
            vec![StoreLocale::new(DEFAULT_STORE.0, DEFAULT_STORE.1)]
        } else {
            stores
        };
        Self {
            config,
            catalog,
            stores,
            cache: Arc::new(MemoryCache::new()),
            transport: None,
        }
    }

    /// Resolve the environment from command-line flags.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        let catalog = match &cli.catalog {
            Some(path) => load_catalog(path)?,
            None => AttributeCatalog::default(),
        };
        Ok(Self::new(config, catalog, cli.stores.clone()))
    }

    /// Talk to the index through `transport` instead of HTTP.
    pub fn with_transport(mut self, transport: Arc<dyn IndexTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Served stores.
    pub fn stores(&self) -> &[StoreLocale] {
        &self.stores
    }

    fn locale_of(&self, store_id: u32) -> Result<&str> {
        self.stores
            .iter()
            .find(|s| s.store_id == store_id)
            .map(|s| s.locale_code.as_str())
            .ok_or_else(|| {
                Error::usage(format!(
                    "Store {store_id} is not served; add --store {store_id}:<locale>"
                ))
            })
    }

    fn context(&self, locale: Option<&str>) -> EngineContext {
        let mut context = EngineContext::new(self.config.clone())
            .with_cache(self.cache.clone())
            .with_catalog(self.catalog.clone())
            .with_stores(self.stores.clone());
        if let Some(transport) = &self.transport {
            context = context.with_transport(Arc::clone(transport));
        }
        match locale {
            Some(locale) => context.with_default_locale(locale),
            None => context,
        }
    }

    /// Engine selected by the configured registry key.
    pub fn engine(&self, locale: Option<&str>) -> Result<Engine> {
        Ok(EngineRegistry::with_defaults().create(&self.context(locale))?)
    }

    /// Elasticsearch engine, for schema inspection.
    pub fn elasticsearch(&self) -> Result<ElasticsearchEngine> {
        let context = self.context(None);
        Ok(ElasticsearchEngine::new(
            self.config.clone(),
            context.transport()?,
            self.cache.clone(),
            context.field_namer(),
            self.stores.clone(),
        )?)
    }

    /// Probe the index service.
    pub async fn ping(&self) -> Result<bool> {
        let engine = self.engine(None)?;
        let ready = engine.initialize().await;
        log::info!("Engine {} ready: {ready}", engine.name());
        Ok(ready)
    }

    /// Analysis settings as JSON.
    pub fn settings(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.elasticsearch()?.settings())?)
    }

    /// Product mapping as JSON.
    pub async fn schema(&self) -> Result<Value> {
        let properties = self.elasticsearch()?.properties().await;
        Ok(serde_json::to_value(properties)?)
    }

    /// Create or update the index and push the mapping.
    ///
    /// The index service is pinged first; an unreachable service fails the
    /// command instead of half-writing the mapping.
    pub async fn prepare(&self) -> Result<()> {
        let engine = self.engine(None)?;
        engine.initialize().await;
        engine.wait_ready(self.config.timeout()).await?;
        engine.prepare_index().await?;
        log::info!("Prepared index in {:?}", engine.uptime());
        Ok(())
    }

    /// Refresh the index.
    pub async fn refresh(&self) -> Result<()> {
        Ok(self.engine(None)?.refresh_index().await?)
    }

    /// Delete the index. Refuses without confirmation.
    pub async fn delete_index(&self, confirmed: bool) -> Result<()> {
        if !confirmed {
            return Err(Error::usage("Refusing to delete the index without --yes"));
        }
        self.engine(None)?.delete_index().await?;
        log::info!("Deleted index {}", self.config.index_name()?);
        Ok(())
    }

    /// Fulltext search in one store. Failed searches come back empty.
    pub async fn search(
        &self,
        query: &str,
        store_id: u32,
        limit: usize,
        facets: &[String],
    ) -> Result<Value> {
        let locale = self.locale_of(store_id)?;
        let engine = self.engine(Some(locale))?;

        let mut params = QueryParams::for_store(store_id, locale);
        params.limit = limit;
        params.facets.fields.extend(facets.iter().cloned());

        let result = engine.search(query, &params, PRODUCT_TYPE).await;
        let facets: serde_json::Map<String, Value> = result
            .facets
            .iter()
            .map(|(field, counts)| {
                let buckets: serde_json::Map<String, Value> = counts
                    .iter()
                    .map(|b| (b.key.clone(), json!(b.count)))
                    .collect();
                (field.clone(), Value::Object(buckets))
            })
            .collect();

        Ok(json!({
            "total_count": result.total_count,
            "ids": result.entity_ids(),
            "facets": facets,
        }))
    }

    /// Layered navigation of a category page, or of a search page when
    /// `query` is given.
    pub async fn navigate(&self, request: NavigateRequest<'_>) -> Result<NavigationLayout> {
        let locale = self.locale_of(request.store_id)?.to_string();
        let engine = Arc::new(self.engine(Some(&locale))?);

        let builder = LayoutBuilder::new(Arc::new(request.categories));
        let category = builder.category(request.category_id, request.store_id).await?;

        let scope = LayerScope::new(request.store_id, locale, request.website_id)
            .with_customer_group(request.customer_group_id);
        let cache: Arc<dyn CacheService> = self.cache.clone();
        let mut layer = Layer::new(engine, cache, scope, category);
        if let Some(query) = request.query {
            layer = layer.with_query(query);
        }

        Ok(builder
            .build(&mut layer, &FilterRequest::parse_query(request.filters))
            .await)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("engine", &self.config.engine)
            .field("index", &self.config.index)
            .field("attributes", &self.catalog.len())
            .field("stores", &self.stores)
            .finish_non_exhaustive()
    }
}

/// Inputs of a navigation cycle.
#[derive(Debug)]
pub struct NavigateRequest<'a> {
    /// Category tree.
    pub categories: MemoryCategories,
    /// Category to navigate in.
    pub category_id: u64,
    /// Applied filters as a query string.
    pub filters: &'a str,
    /// Search text, for a search page.
    pub query: Option<&'a str>,
    /// Store id.
    pub store_id: u32,
    /// Website of the store.
    pub website_id: u32,
    /// Customer group of the visitor.
    pub customer_group_id: u32,
}

/// Read an attribute catalog from a JSON file.
pub fn load_catalog(path: &Path) -> Result<AttributeCatalog> {
    let content =
        std::fs::read_to_string(path).map_err(|e| vitrine_core::Error::io_with_path(e, path))?;
    let catalog = AttributeCatalog::from_json_str(&content)?;
    log::debug!("Loaded {} attributes from {}", catalog.len(), path.display());
    Ok(catalog)
}

/// Read a category tree from a JSON file.
pub fn load_categories(path: &Path) -> Result<MemoryCategories> {
    let content =
        std::fs::read_to_string(path).map_err(|e| vitrine_core::Error::io_with_path(e, path))?;
    Ok(MemoryCategories::from_json_str(&content)?)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run the parsed command.
pub async fn run(cli: Cli) -> Result<()> {
    let app = App::from_cli(&cli)?;
    log::debug!("{app:?}");

    match cli.command {
        Command::Ping => {
            if app.ping().await? {
                println!("ok");
                Ok(())
            } else {
                Err(Error::usage("Search engine is not reachable"))
            }
        }
        Command::Settings => print_json(&app.settings()?),
        Command::Schema => print_json(&app.schema().await?),
        Command::Prepare => app.prepare().await,
        Command::Refresh => app.refresh().await,
        Command::Search {
            query,
            store,
            limit,
            facets,
        } => print_json(&app.search(&query, store, limit, &facets).await?),
        Command::Navigate {
            categories,
            category,
            filters,
            query,
            store,
            website,
            customer_group,
        } => {
            let request = NavigateRequest {
                categories: load_categories(&categories)?,
                category_id: category,
                filters: &filters,
                query: query.as_deref(),
                store_id: store,
                website_id: website,
                customer_group_id: customer_group,
            };
            print_json(&app.navigate(request).await?)
        }
        Command::DeleteIndex { yes } => app.delete_index(yes).await,
        Command::Config { action } => handle_config_command(app.config(), action),
    }
}

// ============================================================================
// Tests
// ============================================================================
