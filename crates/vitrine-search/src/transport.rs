//! Transport to the external index service.
//!
//! [`IndexTransport`] is the boundary of everything that goes over the wire.
//! [`HttpTransport`] talks JSON over HTTP with `reqwest`, rotating through
//! the configured servers. [`MockTransport`] keeps indexes in memory for
//! tests (enabled by the `test-support` feature outside this crate).

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::{Method, StatusCode, header};
use serde_json::{Value, json};
use vitrine_core::{EngineConfig, ServerAddr};

use crate::document::Document;
use crate::error::{Error, Result};

/// Operations the engine needs from the index service.
#[async_trait]
pub trait IndexTransport: Send + Sync {
    /// Transport name, for logs.
    fn name(&self) -> &str;

    /// Check that the service answers.
    async fn ping(&self) -> Result<()>;

    /// Whether the index exists.
    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// Create an index with settings.
    async fn create_index(&self, index: &str, settings: &Value) -> Result<()>;

    /// Replace the settings of an existing index.
    async fn update_settings(&self, index: &str, settings: &Value) -> Result<()>;

    /// Put the mapping of a document type.
    async fn put_mapping(&self, index: &str, doc_type: &str, properties: &Value) -> Result<()>;

    /// Index documents, keyed by their unique key.
    async fn bulk_index(&self, index: &str, doc_type: &str, documents: &[Document]) -> Result<()>;

    /// Delete documents by id.
    async fn delete_ids(&self, index: &str, doc_type: &str, ids: &[String]) -> Result<()>;

    /// Delete the documents matching a query.
    async fn delete_by_query(&self, index: &str, doc_type: &str, query: &Value) -> Result<()>;

    /// Delete every document of a type.
    async fn delete_type(&self, index: &str, doc_type: &str) -> Result<()>;

    /// Delete the index.
    async fn delete_index(&self, index: &str) -> Result<()>;

    /// Make recent writes visible to search.
    async fn refresh(&self, index: &str) -> Result<()>;

    /// Run a search and return the raw response.
    async fn search(&self, index: &str, doc_type: &str, body: &Value) -> Result<Value>;
}

// ============================================================================
// HTTP
// ============================================================================

/// JSON-over-HTTP transport.
pub struct HttpTransport {
    client: reqwest::Client,
    servers: Vec<ServerAddr>,
    next: AtomicUsize,
}

impl HttpTransport {
    /// Build a transport from the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let servers = config.server_addrs();
        if servers.is_empty() {
            return Err(vitrine_core::Error::config("At least one search server must be defined").into());
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            servers,
            next: AtomicUsize::new(0),
        })
    }

    /// Configured servers.
    pub fn servers(&self) -> &[ServerAddr] {
        &self.servers
    }

    fn base_url(&self) -> String {
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.servers.len();
        self.servers[i].base_url()
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}/{}", self.base_url(), path.trim_start_matches('/'));
        log::debug!("{method} {url}");

        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        Self::read(method, &url, response).await
    }

    async fn read(method: Method, url: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::transport(format!(
                "{method} {url} failed (HTTP {status}): {text}"
            )));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| Error::malformed(format!("{method} {url} returned invalid JSON: {e}")))
    }

    async fn bulk(&self, lines: Vec<Value>) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let mut payload = String::new();
        for line in &lines {
            payload.push_str(&serde_json::to_string(line)?);
            payload.push('\n');
        }

        let url = format!("{}/_bulk", self.base_url());
        log::debug!("POST {url} ({} lines)", lines.len());
        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/x-ndjson")
            .body(payload)
            .send()
            .await?;
        let body = Self::read(Method::POST, &url, response).await?;

        if body.get("errors").and_then(Value::as_bool) == Some(true) {
            let first = body
                .get("items")
                .and_then(Value::as_array)
                .and_then(|items| {
                    items.iter().find_map(|item| {
                        item.as_object()?
                            .values()
                            .find_map(|action| action.get("error").cloned())
                    })
                })
                .unwrap_or(Value::Null);
            return Err(Error::transport(format!("Bulk request had failures: {first}")));
        }
        Ok(())
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("servers", &self.servers)
            .finish()
    }
}

#[async_trait]
impl IndexTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn ping(&self) -> Result<()> {
        self.send(Method::GET, "/", None).await.map(|_| ())
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        let url = format!("{}/{index}", self.base_url());
        let response = self.client.head(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(Error::transport(format!("HEAD {url} failed (HTTP {status})"))),
        }
    }

    async fn create_index(&self, index: &str, settings: &Value) -> Result<()> {
        let body = json!({ "settings": settings });
        self.send(Method::PUT, index, Some(&body)).await.map(|_| ())
    }

    async fn update_settings(&self, index: &str, settings: &Value) -> Result<()> {
        // Analysis settings can only change on a closed index.
        self.send(Method::POST, &format!("{index}/_close"), None).await?;
        let updated = self
            .send(Method::PUT, &format!("{index}/_settings"), Some(settings))
            .await;
        self.send(Method::POST, &format!("{index}/_open"), None).await?;
        updated.map(|_| ())
    }

    async fn put_mapping(&self, index: &str, doc_type: &str, properties: &Value) -> Result<()> {
        let body = json!({ doc_type: { "properties": properties } });
        self.send(Method::PUT, &format!("{index}/{doc_type}/_mapping"), Some(&body))
            .await
            .map(|_| ())
    }

    async fn bulk_index(&self, index: &str, doc_type: &str, documents: &[Document]) -> Result<()> {
        let mut lines = Vec::with_capacity(documents.len() * 2);
        for document in documents {
            lines.push(json!({
                "index": { "_index": index, "_type": doc_type, "_id": document.unique_key }
            }));
            lines.push(Value::Object(document.fields.clone()));
        }
        self.bulk(lines).await
    }

    async fn delete_ids(&self, index: &str, doc_type: &str, ids: &[String]) -> Result<()> {
        let lines = ids
            .iter()
            .map(|id| json!({ "delete": { "_index": index, "_type": doc_type, "_id": id } }))
            .collect();
        self.bulk(lines).await
    }

    async fn delete_by_query(&self, index: &str, doc_type: &str, query: &Value) -> Result<()> {
        let body = json!({ "query": query });
        self.send(Method::DELETE, &format!("{index}/{doc_type}/_query"), Some(&body))
            .await
            .map(|_| ())
    }

    async fn delete_type(&self, index: &str, doc_type: &str) -> Result<()> {
        self.send(Method::DELETE, &format!("{index}/{doc_type}"), None)
            .await
            .map(|_| ())
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        self.send(Method::DELETE, index, None).await.map(|_| ())
    }

    async fn refresh(&self, index: &str) -> Result<()> {
        self.send(Method::POST, &format!("{index}/_refresh"), None)
            .await
            .map(|_| ())
    }

    async fn search(&self, index: &str, doc_type: &str, body: &Value) -> Result<Value> {
        self.send(Method::POST, &format!("{index}/{doc_type}/_search"), Some(body))
            .await
    }
}

// ============================================================================
// In-memory mock
// ============================================================================

#[cfg(any(test, feature = "test-support"))]
pub use mock::{MockIndex, MockTransport};

#[cfg(any(test, feature = "test-support"))]
mod mock {
    use std::collections::{BTreeMap, HashMap, VecDeque};
    use std::sync::Mutex;

    use super::*;

    /// State of one in-memory index.
    #[derive(Debug, Clone, Default)]
    pub struct MockIndex {
        /// Last settings written.
        pub settings: Value,
        /// Properties by document type.
        pub mappings: BTreeMap<String, Value>,
        /// Documents by id.
        pub documents: BTreeMap<String, Value>,
        /// Number of refreshes.
        pub refreshes: usize,
    }

    #[derive(Debug, Default)]
    struct State {
        indexes: HashMap<String, MockIndex>,
        responses: VecDeque<Value>,
        searches: Vec<Value>,
        calls: Vec<String>,
        failure: Option<String>,
    }

    /// In-memory transport recording every call.
    ///
    /// Searches answer with the next scripted response, or with every stored
    /// document as a hit when none is scripted.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        state: Mutex<State>,
    }

    impl MockTransport {
        /// Empty transport.
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a raw search response.
        pub fn push_response(&self, response: Value) {
            self.lock().responses.push_back(response);
        }

        /// Fail every following call with a transport error.
        pub fn fail_with(&self, message: impl Into<String>) {
            self.lock().failure = Some(message.into());
        }

        /// Stop failing.
        pub fn recover(&self) {
            self.lock().failure = None;
        }

        /// Snapshot of an index.
        pub fn index(&self, name: &str) -> Option<MockIndex> {
            self.lock().indexes.get(name).cloned()
        }

        /// Bodies of every search so far.
        pub fn searches(&self) -> Vec<Value> {
            self.lock().searches.clone()
        }

        /// Names of every call so far, e.g. `create_index:catalog`.
        pub fn calls(&self) -> Vec<String> {
            self.lock().calls.clone()
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, State> {
            self.state.lock().unwrap_or_else(|e| e.into_inner())
        }

        fn enter(&self, call: String) -> Result<std::sync::MutexGuard<'_, State>> {
            let mut state = self.lock();
            if let Some(message) = &state.failure {
                return Err(Error::transport(message.clone()));
            }
            state.calls.push(call);
            Ok(state)
        }
    }

    fn missing(index: &str) -> Error {
        Error::transport(format!("index '{index}' does not exist"))
    }

    fn matches_term(document: &Value, query: &Value) -> bool {
        let Some(term) = query.get("term").and_then(Value::as_object) else {
            return true;
        };
        term.iter().all(|(field, expected)| {
            document
                .get(field)
                .is_some_and(|v| v == expected || v.to_string() == expected.to_string().trim_matches('"'))
        })
    }

    #[async_trait]
    impl IndexTransport for MockTransport {
        fn name(&self) -> &str {
            "mock"
        }

        async fn ping(&self) -> Result<()> {
            self.enter("ping".into()).map(|_| ())
        }

        async fn index_exists(&self, index: &str) -> Result<bool> {
            let state = self.enter(format!("index_exists:{index}"))?;
            Ok(state.indexes.contains_key(index))
        }

        async fn create_index(&self, index: &str, settings: &Value) -> Result<()> {
            let mut state = self.enter(format!("create_index:{index}"))?;
            let entry = state.indexes.entry(index.to_string()).or_default();
            entry.settings = settings.clone();
            Ok(())
        }

        async fn update_settings(&self, index: &str, settings: &Value) -> Result<()> {
            let mut state = self.enter(format!("update_settings:{index}"))?;
            let entry = state.indexes.get_mut(index).ok_or_else(|| missing(index))?;
            entry.settings = settings.clone();
            Ok(())
        }

        async fn put_mapping(&self, index: &str, doc_type: &str, properties: &Value) -> Result<()> {
            let mut state = self.enter(format!("put_mapping:{index}/{doc_type}"))?;
            let entry = state.indexes.get_mut(index).ok_or_else(|| missing(index))?;
            entry.mappings.insert(doc_type.to_string(), properties.clone());
            Ok(())
        }

        async fn bulk_index(&self, index: &str, _doc_type: &str, documents: &[Document]) -> Result<()> {
            let mut state = self.enter(format!("bulk_index:{index}"))?;
            let entry = state.indexes.get_mut(index).ok_or_else(|| missing(index))?;
            for document in documents {
                entry
                    .documents
                    .insert(document.unique_key.clone(), Value::Object(document.fields.clone()));
            }
            Ok(())
        }

        async fn delete_ids(&self, index: &str, _doc_type: &str, ids: &[String]) -> Result<()> {
            let mut state = self.enter(format!("delete_ids:{index}"))?;
            let entry = state.indexes.get_mut(index).ok_or_else(|| missing(index))?;
            for id in ids {
                entry.documents.remove(id);
            }
            Ok(())
        }

        async fn delete_by_query(&self, index: &str, _doc_type: &str, query: &Value) -> Result<()> {
            let mut state = self.enter(format!("delete_by_query:{index}"))?;
            let entry = state.indexes.get_mut(index).ok_or_else(|| missing(index))?;
            entry.documents.retain(|_, doc| !matches_term(doc, query));
            Ok(())
        }

        async fn delete_type(&self, index: &str, _doc_type: &str) -> Result<()> {
            let mut state = self.enter(format!("delete_type:{index}"))?;
            let entry = state.indexes.get_mut(index).ok_or_else(|| missing(index))?;
            entry.documents.clear();
            Ok(())
        }

        async fn delete_index(&self, index: &str) -> Result<()> {
            let mut state = self.enter(format!("delete_index:{index}"))?;
            state.indexes.remove(index).map(|_| ()).ok_or_else(|| missing(index))
        }

        async fn refresh(&self, index: &str) -> Result<()> {
            let mut state = self.enter(format!("refresh:{index}"))?;
            let entry = state.indexes.get_mut(index).ok_or_else(|| missing(index))?;
            entry.refreshes += 1;
            Ok(())
        }

        async fn search(&self, index: &str, _doc_type: &str, body: &Value) -> Result<Value> {
            let mut state = self.enter(format!("search:{index}"))?;
            state.searches.push(body.clone());
            if let Some(response) = state.responses.pop_front() {
                return Ok(response);
            }
            let hits: Vec<Value> = state
                .indexes
                .get(index)
                .map(|entry| {
                    entry
                        .documents
                        .iter()
                        .map(|(id, doc)| json!({ "_id": id, "_source": doc }))
                        .collect()
                })
                .unwrap_or_default();
            Ok(json!({ "hits": { "total": hits.len(), "hits": hits } }))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
