//! Search engine contract and the engine front.
//!
//! [`SearchEngine`] is what a concrete engine implements: raw search, index
//! management and capability flags. Callers never hold a backend directly,
//! they go through [`Engine`], which adds:
//!
//! - lifecycle tracking through a [`StateHandle`]
//! - timing instrumentation around every search
//! - error containment: a failed search is logged, optionally reported to
//!   an [`ErrorSink`] in debug mode, and answered with an empty result
//!
//! # Example
//!
//! ```rust,ignore
//! let engine = Engine::new(backend);
//! engine.initialize().await;
//!
//! let result = engine.search("red shoes", &params, PRODUCT_TYPE).await;
//! println!("{} matches", result.total_count);
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveTime;
use vitrine_core::{EngineConfig, EngineState, StateHandle};

use crate::attribute::{Attribute, BackendType};
use crate::document::{RawAttributes, parse_date};
use crate::error::{Error, Result};
use crate::naming::FieldNamer;
use crate::query::{FilterValue, QueryParams, SearchParam};
use crate::response::{FieldStats, IdsResult, SearchResult};

/// Document type of products.
pub const PRODUCT_TYPE: &str = "product";

/// Visibility ids eligible for search ("search" and "catalog, search").
pub const SEARCH_VISIBILITY: &[u32] = &[3, 4];

/// Contract of a concrete search engine.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Registry key of the engine.
    fn name(&self) -> &str;

    /// Engine configuration.
    fn config(&self) -> &EngineConfig;

    /// Field naming rules of this engine.
    fn field_namer(&self) -> &FieldNamer;

    /// Ping the index service.
    async fn test(&self) -> bool;

    /// Search without containment. An absent index is an empty result.
    async fn raw_search(&self, query: &str, params: &QueryParams, doc_type: &str) -> Result<SearchResult>;

    /// Create the index if needed, push settings and the product mapping.
    async fn prepare_index(&self) -> Result<()>;

    /// Make recent writes visible. No-op without an index.
    async fn refresh_index(&self) -> Result<()>;

    /// Remove documents.
    ///
    /// | store | ids   | removes |
    /// |-------|-------|---------|
    /// | none  | none  | every product document |
    /// | none  | some  | those products in every known store |
    /// | some  | none  | every document of the store |
    /// | some  | some  | those products in the store |
    async fn clean_index(&self, store_id: Option<u32>, entity_ids: &[u64]) -> Result<()>;

    /// Delete the whole index. No-op without an index.
    async fn delete_index(&self) -> Result<()>;

    /// Index raw product data of one store. Returns the number of documents
    /// written.
    async fn save_entity_indexes(
        &self,
        store_id: u32,
        indexes: &BTreeMap<u64, RawAttributes>,
        doc_type: &str,
    ) -> Result<usize>;

    /// Drop everything this engine cached.
    async fn clean_cache(&self) -> Result<()>;

    /// Whether layered navigation may use this engine.
    fn is_layered_navigation_allowed(&self) -> bool {
        true
    }

    /// Whether computed category and price fields are merged into documents.
    fn allow_advanced_index(&self) -> bool {
        true
    }

    /// Visibility ids eligible for search.
    fn allowed_visibility(&self) -> &[u32] {
        SEARCH_VISIBILITY
    }
}

// ============================================================================
// Error sink
// ============================================================================

/// Operator-visible channel for contained errors (debug mode only).
pub trait ErrorSink: Send + Sync {
    /// Report an error contained by `engine`.
    fn report(&self, engine: &str, error: &Error);
}

/// Sink writing to the log at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report(&self, engine: &str, error: &Error) {
        log::warn!("[debug] search engine '{engine}': {error}");
    }
}

/// Sink keeping messages in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<String>>,
}

impl CollectingSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages reported so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl ErrorSink for CollectingSink {
    fn report(&self, engine: &str, error: &Error) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(format!("{engine}: {error}"));
        }
    }
}

// ============================================================================
// Timing
// ============================================================================

/// Logs the time spent in a scope at debug level.
struct Timer {
    label: &'static str,
    started: Instant,
}

impl Timer {
    fn start(label: &'static str) -> Self {
        Self {
            label,
            started: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::debug!("[{}] {:?}", self.label, self.started.elapsed());
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Front of a search engine backend.
pub struct Engine {
    backend: Arc<dyn SearchEngine>,
    state: StateHandle,
    sink: Arc<dyn ErrorSink>,
    last_num_found: AtomicU64,
}

impl Engine {
    /// Wrap a backend. The engine starts uninitialized.
    pub fn new(backend: Arc<dyn SearchEngine>) -> Self {
        let state = StateHandle::new(backend.name());
        Self {
            backend,
            state,
            sink: Arc::new(LogSink),
            last_num_found: AtomicU64::new(0),
        }
    }

    /// Replace the debug-mode error sink.
    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The backend.
    pub fn backend(&self) -> &dyn SearchEngine {
        self.backend.as_ref()
    }

    /// Lifecycle handle.
    pub fn state_handle(&self) -> &StateHandle {
        &self.state
    }

    /// Engine name.
    pub fn name(&self) -> &str {
        self.backend.name()
    }

    /// Probe the backend and move to `Ready` or `Failed`.
    pub async fn initialize(&self) -> bool {
        if self.backend.test().await {
            self.state.set_state(EngineState::Ready);
            true
        } else {
            self.state
                .set_state(EngineState::Failed("index service unavailable".to_string()));
            false
        }
    }

    /// Search with containment: failures yield an empty result.
    pub async fn search(&self, query: &str, params: &QueryParams, doc_type: &str) -> SearchResult {
        let _timer = Timer::start("SEARCH");
        let _guard = self
            .state
            .state()
            .is_ready()
            .then(|| self.state.enter(EngineState::Querying));

        let outcome = {
            let _timer = Timer::start("ENGINE_SEARCH");
            self.backend.raw_search(query, params, doc_type).await
        };

        match outcome {
            Ok(result) => {
                self.last_num_found.store(result.total_count, Ordering::Relaxed);
                result
            }
            Err(e) => {
                self.contain(&e);
                SearchResult::empty()
            }
        }
    }

    /// Statistics of the fields requested in `params`.
    pub async fn get_stats(&self, query: &str, params: &QueryParams) -> BTreeMap<String, FieldStats> {
        let params = QueryParams {
            limit: 1,
            ..params.clone()
        };
        self.search(query, &params, PRODUCT_TYPE).await.stats
    }

    /// Ids, total count and facets of a query.
    pub async fn get_ids_by_query(&self, query: &str, params: &QueryParams) -> IdsResult {
        let params = QueryParams {
            fields: vec!["id".to_string()],
            ..params.clone()
        };
        self.search(query, &params, PRODUCT_TYPE).await.into()
    }

    /// Total count of the last successful search.
    pub fn last_num_found(&self) -> u64 {
        self.last_num_found.load(Ordering::Relaxed)
    }

    /// Whether the engine may serve search right now: initialized, not rebuilding
    /// the index, and answering its ping.
    pub async fn is_active(&self) -> bool {
        let state = self.state.state();
        if !state.is_available() || state.is_indexing() {
            return false;
        }
        self.backend.test().await
    }

    /// Wait until the engine is ready, see [`StateHandle::wait_ready`].
    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        Ok(self.state.wait_ready(timeout).await?)
    }

    /// Time since the engine was built.
    pub fn uptime(&self) -> Duration {
        self.state.elapsed()
    }

    /// Hook run before a full reindex: drop caches and the index.
    ///
    /// Refused while another indexing operation holds the engine.
    pub async fn before_full_reindex(&self) -> Result<()> {
        if self.state.state().is_indexing() {
            log::warn!("Engine {} is already indexing, full reindex refused", self.name());
            return Err(vitrine_core::Error::unavailable(self.name(), "indexing in progress").into());
        }
        let _guard = self.state.enter(EngineState::Indexing);
        self.backend.clean_cache().await?;
        self.backend.delete_index().await
    }

    /// Whether a search weight change requires a reindex.
    pub fn requires_reindex(old_weight: u32, new_weight: u32) -> bool {
        old_weight != new_weight
    }

    /// Create or update the index.
    pub async fn prepare_index(&self) -> Result<()> {
        let _guard = self.state.enter(EngineState::Indexing);
        self.backend.prepare_index().await
    }

    /// Refresh the index.
    pub async fn refresh_index(&self) -> Result<()> {
        self.backend.refresh_index().await
    }

    /// Remove documents, see [`SearchEngine::clean_index`].
    pub async fn clean_index(&self, store_id: Option<u32>, entity_ids: &[u64]) -> Result<()> {
        let _guard = self.state.enter(EngineState::Indexing);
        self.backend.clean_index(store_id, entity_ids).await
    }

    /// Delete the index.
    pub async fn delete_index(&self) -> Result<()> {
        let _guard = self.state.enter(EngineState::Indexing);
        self.backend.delete_index().await
    }

    /// Index raw product data of one store.
    pub async fn save_entity_indexes(
        &self,
        store_id: u32,
        indexes: &BTreeMap<u64, RawAttributes>,
        doc_type: &str,
    ) -> Result<usize> {
        let _guard = self.state.enter(EngineState::Indexing);
        self.backend
            .save_entity_indexes(store_id, indexes, doc_type)
            .await
    }

    fn contain(&self, error: &Error) {
        log::error!("Search engine '{}' failed: {error}", self.name());
        if self.backend.config().enable_debug_mode {
            self.sink.report(self.name(), error);
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.name())
            .field("state", &self.state.state())
            .field("last_num_found", &self.last_num_found())
            .finish()
    }
}

// ============================================================================
// Search params
// ============================================================================

/// Constraint for a selected filter value of an attribute.
///
/// Empty values yield nothing, as do ranges with both bounds empty.
/// Datetime values are sent as ISO-8601 instants in UTC.
pub fn search_param(
    namer: &FieldNamer,
    attribute: &Attribute,
    value: FilterValue,
    locale_code: Option<&str>,
) -> Option<SearchParam> {
    let is_date = attribute.backend_type == BackendType::Datetime;
    let convert = |v: String| if is_date { iso_date(&v).unwrap_or(v) } else { v };

    let value = match value {
        FilterValue::Terms(terms) => {
            let terms: Vec<String> = terms
                .into_iter()
                .filter(|t| !t.is_empty())
                .map(convert)
                .collect();
            if terms.is_empty() {
                return None;
            }
            FilterValue::Terms(terms)
        }
        FilterValue::Range { from, to } => {
            let from = from.filter(|f| !f.is_empty()).map(convert);
            let to = to.filter(|t| !t.is_empty()).map(convert);
            if from.is_none() && to.is_none() {
                return None;
            }
            FilterValue::Range { from, to }
        }
    };

    Some(SearchParam::new(namer.field_name(attribute, locale_code), value))
}

/// `2024-03-01` or `03/01/2024` → `2024-03-01T00:00:00Z`.
fn iso_date(value: &str) -> Option<String> {
    let date = parse_date(value.trim())?;
    Some(
        date.and_time(NaiveTime::MIN)
            .and_utc()
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string(),
    )
}

// ============================================================================
// Tests
// ============================================================================
