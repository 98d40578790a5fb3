//! Common test utilities for vitrine-layer integration tests.

use std::sync::Arc;

use serde_json::{Value, json};
use vitrine_core::{EngineConfig, MemoryCache};
use vitrine_layer::{Category, Layer, LayerScope, LayoutBuilder, MemoryCategories};
use vitrine_search::{
    Attribute, AttributeCatalog, AttributeOption, AttributeSource, BackendType, Engine,
    EngineContext, EngineRegistry, Filterable, IndexTransport, MockTransport, StoreLocale,
};

/// Engine, cache and category tree over a mock index.
pub struct TestHarness {
    /// Scripted index service.
    pub transport: Arc<MockTransport>,
    /// Cache shared by the engine and the layers.
    pub cache: Arc<MemoryCache>,
    /// Engine built through the registry.
    pub engine: Arc<Engine>,
    /// Layout builder over the category tree.
    pub layout: LayoutBuilder,
}

impl TestHarness {
    /// Harness on an existing `catalog` index.
    pub async fn new() -> Self {
        let transport = Arc::new(MockTransport::new());
        transport
            .create_index("catalog", &json!({}))
            .await
            .expect("mock index");
        let cache = Arc::new(MemoryCache::new());

        let config = EngineConfig {
            index: Some("catalog".to_string()),
            price_range: 25.0,
            ..Default::default()
        };
        let context = EngineContext::new(config)
            .with_transport(transport.clone())
            .with_cache(cache.clone())
            .with_catalog(catalog())
            .with_stores(vec![StoreLocale::new(1, "en_US")])
            .with_default_locale("en_US");
        let engine = EngineRegistry::with_defaults()
            .create(&context)
            .expect("engine");

        Self {
            transport,
            cache,
            engine: Arc::new(engine),
            layout: LayoutBuilder::new(Arc::new(categories())),
        }
    }

    /// Guest layer on category `Shoes` of store 1.
    pub fn shoes_layer(&self) -> Layer {
        Layer::new(
            Arc::clone(&self.engine),
            self.cache.clone(),
            LayerScope::new(1, "en_US", 1),
            Category::new(3, "Shoes"),
        )
    }
}

/// Attribute catalog of the test shop.
pub fn catalog() -> AttributeCatalog {
    AttributeCatalog::from_attributes([
        Attribute::new(81, "brand", BackendType::Varchar)
            .with_frontend_input("text")
            .filterable(Filterable::OptionsWithResults)
            .filterable_in_search(),
        Attribute::new(92, "color", BackendType::Int)
            .with_frontend_input("select")
            .with_source(AttributeSource::Table)
            .with_options(vec![
                AttributeOption::new("12", "Red"),
                AttributeOption::new("13", "Blue"),
            ])
            .filterable(Filterable::OptionsWithResults),
        Attribute::new(105, "is_new", BackendType::Int)
            .with_frontend_input("boolean")
            .with_source(AttributeSource::Boolean)
            .filterable(Filterable::AllOptions),
        Attribute::new(75, "price", BackendType::Decimal)
            .with_frontend_input("price")
            .filterable(Filterable::OptionsWithResults),
        Attribute::new(70, "weight", BackendType::Decimal).filterable(Filterable::OptionsWithResults),
        Attribute::new(73, "name", BackendType::Varchar).searchable(),
    ])
}

/// Category tree of the test shop.
pub fn categories() -> MemoryCategories {
    MemoryCategories::new([
        Category::new(2, "Root"),
        Category::new(3, "Shoes").with_parent(2),
        Category::new(4, "Boots").with_parent(3),
        Category::new(5, "Sandals").with_parent(3),
        Category::new(6, "Slippers").with_parent(3).inactive(),
    ])
}

/// Stats response carrying the maximum of `field`.
pub fn stats(field: &str, max: f64) -> Value {
    json!({
        "hits": {"total": 3, "hits": []},
        "facets": {field: {"_type": "statistical", "count": 3, "min": 1.0, "max": max}}
    })
}

/// Hits for entity ids of store 1.
pub fn hits(ids: &[u64]) -> Value {
    let hits: Vec<Value> = ids
        .iter()
        .map(|id| json!({"_id": format!("{id}|1"), "_score": 1.0, "_source": {"id": id}}))
        .collect();
    json!({"total": ids.len(), "hits": hits})
}
