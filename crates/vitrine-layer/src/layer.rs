//! The layer context of one navigation cycle.
//!
//! A [`Layer`] is created per request and passed explicitly to every filter.
//! It holds the scope (store, category, customer group, website), the query
//! parameters being built (the product collection), the applied filter
//! state, and the facet results once they are fetched.
//!
//! Facet results are fetched lazily, once, with every facet condition the
//! filters registered. Any change to the parameters drops them.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use vitrine_core::cache::{self, tags};
use vitrine_core::{CacheService, EngineConfig, digest_bytes};
use vitrine_search::query::{FilterValue, Interval, QueryParams, SearchParam};
use vitrine_search::response::{FacetCounts, FieldStats, SearchResult};
use vitrine_search::{Engine, FieldNamer, PRODUCT_TYPE};

use crate::category::Category;
use crate::state::{FilterItem, FilterState};

/// Where the navigation happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerScope {
    /// Store id.
    pub store_id: u32,
    /// Locale of the store.
    pub locale_code: String,
    /// Customer group of the visitor.
    pub customer_group_id: u32,
    /// Website of the store.
    pub website_id: u32,
}

impl LayerScope {
    /// Scope of a store for guests (customer group 0).
    pub fn new(store_id: u32, locale_code: impl Into<String>, website_id: u32) -> Self {
        Self {
            store_id,
            locale_code: locale_code.into(),
            customer_group_id: 0,
            website_id,
        }
    }

    /// Set the customer group.
    pub fn with_customer_group(mut self, customer_group_id: u32) -> Self {
        self.customer_group_id = customer_group_id;
        self
    }
}

/// Request-scoped navigation context.
pub struct Layer {
    engine: Arc<Engine>,
    cache: Arc<dyn CacheService>,
    scope: LayerScope,
    category: Category,
    query: String,
    params: QueryParams,
    state: FilterState,
    result: Option<SearchResult>,
}

impl Layer {
    /// Catalog browsing layer on `category`. Always scoped to the store.
    pub fn new(
        engine: Arc<Engine>,
        cache: Arc<dyn CacheService>,
        scope: LayerScope,
        category: Category,
    ) -> Self {
        let params = QueryParams::for_store(scope.store_id, scope.locale_code.clone());
        Self {
            engine,
            cache,
            scope,
            category,
            query: String::new(),
            params,
            state: FilterState::new(),
            result: None,
        }
    }

    /// Turn this into a search result layer for `query`, restricted to the
    /// visibilities eligible for search.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        let visibility = self
            .engine
            .backend()
            .allowed_visibility()
            .iter()
            .map(u32::to_string)
            .collect();
        self.add_filter(SearchParam::new("visibility", FilterValue::Terms(visibility)));
        self
    }

    /// The engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        self.engine.backend().config()
    }

    /// Field naming rules.
    pub fn namer(&self) -> &FieldNamer {
        self.engine.backend().field_namer()
    }

    /// Navigation scope.
    pub fn scope(&self) -> &LayerScope {
        &self.scope
    }

    /// Locale of the store.
    pub fn locale_code(&self) -> &str {
        &self.scope.locale_code
    }

    /// Current category.
    pub fn current_category(&self) -> &Category {
        &self.category
    }

    /// Fulltext query, empty when browsing.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether this is a search result layer.
    pub fn is_search(&self) -> bool {
        !self.query.is_empty()
    }

    /// Current query parameters.
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Applied filters.
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Record an applied filter.
    pub fn add_state_item(&mut self, item: FilterItem) {
        self.state.add(item);
    }

    // ------------------------------------------------------------------------
    // Product collection
    // ------------------------------------------------------------------------

    /// Constrain the collection.
    pub fn add_filter(&mut self, param: SearchParam) {
        self.params.add_filter(param);
        self.result = None;
    }

    /// Constrain a field to an interval.
    pub fn add_range_filter(&mut self, field: impl Into<String>, interval: Interval) {
        self.params.add_range_filter(field, interval);
        self.result = None;
    }

    /// Request a term facet.
    pub fn add_facet_field(&mut self, field: impl Into<String>) {
        self.params.add_facet_field(field);
        self.result = None;
    }

    /// Request a range facet.
    pub fn add_facet_ranges(&mut self, field: impl Into<String>, buckets: Vec<Interval>) {
        self.params.add_facet_ranges(field, buckets);
        self.result = None;
    }

    /// Request a query facet.
    pub fn add_facet_query(&mut self, query: impl Into<String>) {
        self.params.add_facet_query(query);
        self.result = None;
    }

    /// Run the search once and keep the result.
    pub async fn load(&mut self) -> &SearchResult {
        if self.result.is_none() {
            let result = self
                .engine
                .search(&self.query, &self.params, PRODUCT_TYPE)
                .await;
            self.result = Some(result);
        }
        self.result.get_or_insert_with(SearchResult::empty)
    }

    /// Facet buckets of a field.
    pub async fn faceted_data(&mut self, field: &str) -> FacetCounts {
        self.load().await.facets.get(field).cloned().unwrap_or_default()
    }

    /// Statistics of a field under the current constraints.
    pub async fn stats(&self, field: &str) -> Option<FieldStats> {
        let mut params = self.params.without_facets();
        params.add_stats_field(field);
        self.engine
            .get_stats(&self.query, &params)
            .await
            .remove(field)
    }

    // ------------------------------------------------------------------------
    // Cache partitioning
    // ------------------------------------------------------------------------

    /// Digest of store, category, customer group, query and applied filters.
    pub fn state_key(&self) -> String {
        let mut key = format!(
            "STORE_{}_CAT_{}_CUSTGROUP_{}",
            self.scope.store_id, self.category.id, self.scope.customer_group_id
        );
        if self.is_search() {
            key.push_str("_Q_");
            key.push_str(&self.query);
        }
        for item in self.state.items() {
            key.push('_');
            key.push_str(&item.request_var);
            key.push('=');
            key.push_str(&item.value);
        }
        digest_bytes(key.as_bytes())
    }

    /// Tags of anything cached for this layer, plus `extra`.
    pub fn state_tags(&self, extra: &[String]) -> Vec<String> {
        let mut tags = extra.to_vec();
        tags.push(tags::SEARCH_INDEX.to_string());
        tags.push(tags::category(self.category.id));
        tags
    }

    /// Load cached data.
    pub async fn cache_data<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        cache::load_as(self.cache.as_ref(), key).await
    }

    /// Store data in the cache with the configured lifetime.
    pub async fn save_cache_data<T: Serialize + ?Sized>(&self, key: &str, data: &T, tags: &[String]) {
        let lifetime = self.config().cache_lifetime();
        cache::save_as(self.cache.as_ref(), key, data, tags, Some(lifetime)).await;
    }
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("scope", &self.scope)
            .field("category", &self.category.id)
            .field("query", &self.query)
            .field("state", &self.state)
            .field("loaded", &self.result.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
