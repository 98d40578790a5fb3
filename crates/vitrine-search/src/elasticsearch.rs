//! Elasticsearch engine.
//!
//! Implements [`SearchEngine`] over an [`IndexTransport`]: one index named by
//! the configuration, holding one `product` document per (product, store).
//! The index properties are derived from the attribute catalog and cached
//! under the `config` tag.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use vitrine_core::cache::{self, tags};
use vitrine_core::{CacheService, EngineConfig};

use crate::document::{Document, DocumentPreparer, RawAttributes};
use crate::engine::{PRODUCT_TYPE, SearchEngine};
use crate::error::Result;
use crate::naming::FieldNamer;
use crate::query::{QueryCompiler, QueryParams};
use crate::response::SearchResult;
use crate::schema::{IndexProperties, IndexSettings, SchemaBuilder, StoreLocale};
use crate::transport::IndexTransport;

/// Cache key of the index properties. Independent of store and session.
const PROPERTIES_CACHE_KEY: &str = "vitrine_index_properties";

/// Engine backed by an Elasticsearch index.
pub struct ElasticsearchEngine {
    config: EngineConfig,
    index: String,
    transport: Arc<dyn IndexTransport>,
    cache: Arc<dyn CacheService>,
    namer: FieldNamer,
    stores: Vec<StoreLocale>,
}

impl ElasticsearchEngine {
    /// Registry key.
    pub const NAME: &'static str = "elasticsearch";

    /// Create the engine. Fails when no index name is configured.
    pub fn new(
        config: EngineConfig,
        transport: Arc<dyn IndexTransport>,
        cache: Arc<dyn CacheService>,
        namer: FieldNamer,
        stores: Vec<StoreLocale>,
    ) -> Result<Self> {
        let index = config.index_name()?.to_string();
        log::debug!(
            "Elasticsearch engine on index '{index}' via {} ({} stores)",
            transport.name(),
            stores.len()
        );
        Ok(Self {
            config,
            index,
            transport,
            cache,
            namer,
            stores,
        })
    }

    /// Index name.
    pub fn index_name(&self) -> &str {
        &self.index
    }

    /// Stores served by this engine.
    pub fn stores(&self) -> &[StoreLocale] {
        &self.stores
    }

    /// Analysis settings.
    pub fn settings(&self) -> IndexSettings {
        SchemaBuilder::new(&self.config, &self.namer).index_settings(&self.stores)
    }

    /// Index properties, from cache when possible.
    pub async fn properties(&self) -> IndexProperties {
        if let Some(properties) =
            cache::load_as::<IndexProperties>(self.cache.as_ref(), PROPERTIES_CACHE_KEY).await
        {
            return properties;
        }

        let properties = SchemaBuilder::new(&self.config, &self.namer).build(&self.stores);
        cache::save_as(
            self.cache.as_ref(),
            PROPERTIES_CACHE_KEY,
            &properties,
            &[tags::CONFIG.to_string()],
            Some(self.config.cache_lifetime()),
        )
        .await;
        properties
    }

    fn locale_of(&self, store_id: u32) -> Option<&str> {
        self.stores
            .iter()
            .find(|s| s.store_id == store_id)
            .map(|s| s.locale_code.as_str())
    }
}

impl std::fmt::Debug for ElasticsearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchEngine")
            .field("index", &self.index)
            .field("transport", &self.transport.name())
            .field("cache", &self.cache.name())
            .field("stores", &self.stores)
            .finish()
    }
}

#[async_trait]
impl SearchEngine for ElasticsearchEngine {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn field_namer(&self) -> &FieldNamer {
        &self.namer
    }

    async fn test(&self) -> bool {
        match self.transport.ping().await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Search index service is unavailable: {e}");
                false
            }
        }
    }

    async fn raw_search(&self, query: &str, params: &QueryParams, doc_type: &str) -> Result<SearchResult> {
        if !self.transport.index_exists(&self.index).await? {
            log::debug!("Index '{}' does not exist, returning no results", self.index);
            return Ok(SearchResult::empty());
        }
        let properties = self.properties().await;
        let body = QueryCompiler::new(&self.config).compile(query, params, &properties);
        let raw = self.transport.search(&self.index, doc_type, &body).await?;
        SearchResult::decode(&raw)
    }

    async fn prepare_index(&self) -> Result<()> {
        let mut settings = self.settings();
        if self.transport.index_exists(&self.index).await? {
            self.transport
                .update_settings(&self.index, &serde_json::to_value(&settings)?)
                .await?;
        } else {
            settings.number_of_shards = Some(self.config.number_of_shards);
            self.transport
                .create_index(&self.index, &serde_json::to_value(&settings)?)
                .await?;
            log::info!("Created index '{}'", self.index);
        }

        let properties = self.properties().await;
        self.transport
            .put_mapping(&self.index, PRODUCT_TYPE, &serde_json::to_value(&properties)?)
            .await
    }

    async fn refresh_index(&self) -> Result<()> {
        if self.transport.index_exists(&self.index).await? {
            self.transport.refresh(&self.index).await?;
        }
        Ok(())
    }

    async fn clean_index(&self, store_id: Option<u32>, entity_ids: &[u64]) -> Result<()> {
        self.prepare_index().await?;
        if !self.transport.index_exists(&self.index).await? {
            return Ok(());
        }

        match (store_id, entity_ids.is_empty()) {
            (None, true) => {
                self.transport.delete_type(&self.index, PRODUCT_TYPE).await?;
            }
            (None, false) => {
                let ids: Vec<String> = self
                    .stores
                    .iter()
                    .flat_map(|store| {
                        entity_ids
                            .iter()
                            .map(move |id| Document::unique_key_for(*id, store.store_id))
                    })
                    .collect();
                self.transport.delete_ids(&self.index, PRODUCT_TYPE, &ids).await?;
            }
            (Some(store_id), true) => {
                let query = json!({ "term": { "store_id": store_id } });
                self.transport
                    .delete_by_query(&self.index, PRODUCT_TYPE, &query)
                    .await?;
            }
            (Some(store_id), false) => {
                let ids: Vec<String> = entity_ids
                    .iter()
                    .map(|id| Document::unique_key_for(*id, store_id))
                    .collect();
                self.transport.delete_ids(&self.index, PRODUCT_TYPE, &ids).await?;
            }
        }
        log::debug!(
            "Cleaned index '{}' (store {store_id:?}, {} ids)",
            self.index,
            entity_ids.len()
        );
        Ok(())
    }

    async fn delete_index(&self) -> Result<()> {
        if self.transport.index_exists(&self.index).await? {
            self.transport.delete_index(&self.index).await?;
            log::info!("Deleted index '{}'", self.index);
        }
        Ok(())
    }

    async fn save_entity_indexes(
        &self,
        store_id: u32,
        indexes: &BTreeMap<u64, RawAttributes>,
        doc_type: &str,
    ) -> Result<usize> {
        self.prepare_index().await?;
        let documents =
            DocumentPreparer::new(&self.namer).prepare_all(indexes, store_id, self.locale_of(store_id));
        if documents.is_empty() {
            return Ok(0);
        }
        self.transport
            .bulk_index(&self.index, doc_type, &documents)
            .await?;
        log::debug!(
            "Indexed {} documents of store {store_id} into '{}'",
            documents.len(),
            self.index
        );
        Ok(documents.len())
    }

    async fn clean_cache(&self) -> Result<()> {
        let removed = self
            .cache
            .clean_tags(&[tags::CONFIG.to_string(), tags::SEARCH_INDEX.to_string()])
            .await?;
        log::debug!("Removed {removed} cached search entries");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
