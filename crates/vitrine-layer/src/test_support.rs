//! Fixtures shared by the unit tests.

use std::sync::Arc;

use vitrine_core::{EngineConfig, MemoryCache};
use vitrine_search::{
    Attribute, AttributeCatalog, AttributeOption, AttributeSource, BackendType, ElasticsearchEngine,
    Engine, FieldNamer, Filterable, IndexTransport, LanguageTable, MockTransport, StoreLocale,
};

use crate::category::Category;
use crate::layer::{Layer, LayerScope};

pub(crate) fn config() -> EngineConfig {
    EngineConfig {
        index: Some("catalog".to_string()),
        price_range: 25.0,
        ..Default::default()
    }
}

pub(crate) fn color() -> Attribute {
    Attribute::new(92, "color", BackendType::Int)
        .with_frontend_input("select")
        .with_source(AttributeSource::Table)
        .with_options(vec![
            AttributeOption::new("12", "Red"),
            AttributeOption::new("13", "Blue"),
            AttributeOption::new("14", "Green"),
        ])
        .filterable(Filterable::OptionsWithResults)
}

pub(crate) fn brand() -> Attribute {
    Attribute::new(81, "brand", BackendType::Varchar)
        .with_frontend_input("text")
        .filterable(Filterable::AllOptions)
}

pub(crate) fn is_new() -> Attribute {
    Attribute::new(105, "is_new", BackendType::Int)
        .with_frontend_input("boolean")
        .with_source(AttributeSource::Boolean)
        .filterable(Filterable::AllOptions)
}

pub(crate) fn weight() -> Attribute {
    Attribute::new(70, "weight", BackendType::Decimal).filterable(Filterable::OptionsWithResults)
}

pub(crate) fn price() -> Attribute {
    Attribute::new(75, "price", BackendType::Decimal)
        .with_frontend_input("price")
        .filterable(Filterable::OptionsWithResults)
}

pub(crate) fn catalog() -> AttributeCatalog {
    AttributeCatalog::from_attributes([color(), brand(), is_new(), weight(), price()])
}

pub(crate) fn engine_with_config(transport: Arc<MockTransport>, config: EngineConfig) -> Arc<Engine> {
    let namer = FieldNamer::new(Arc::new(catalog()), Arc::new(LanguageTable::default()))
        .with_default_locale("en_US");
    let backend = ElasticsearchEngine::new(
        config,
        transport,
        Arc::new(MemoryCache::new()),
        namer,
        vec![StoreLocale::new(1, "en_US")],
    )
    .unwrap();
    Arc::new(Engine::new(Arc::new(backend)))
}

pub(crate) fn engine_with(transport: Arc<MockTransport>) -> Arc<Engine> {
    engine_with_config(transport, config())
}

/// A mock transport on which the `catalog` index exists.
pub(crate) async fn indexed_transport() -> Arc<MockTransport> {
    let transport = Arc::new(MockTransport::new());
    transport
        .create_index("catalog", &serde_json::json!({}))
        .await
        .unwrap();
    transport
}

pub(crate) fn layer_on(engine: Arc<Engine>, category: Category) -> Layer {
    Layer::new(
        engine,
        Arc::new(MemoryCache::new()),
        LayerScope::new(1, "en_US", 1),
        category,
    )
}
