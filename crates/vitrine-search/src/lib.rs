//! Search engine layer for Vitrine.
//!
//! Turns catalog attributes into index fields, builds the index schema,
//! prepares documents, compiles queries and decodes responses, and defines
//! the engine contract that layered navigation talks to.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       vitrine-search                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Engine (containment, timing, lifecycle)                     │
//! │  └── SearchEngine trait                                      │
//! │      └── ElasticsearchEngine ── IndexTransport               │
//! │                                 ├── HttpTransport (reqwest)  │
//! │                                 └── MockTransport (tests)    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  FieldNamer      attribute × locale → field name             │
//! │  SchemaBuilder   analysis settings + properties              │
//! │  DocumentPreparer / AdvancedIndex                            │
//! │  QueryCompiler / SearchResult                                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Features
//!
//! - `test-support`: export [`transport::MockTransport`] for downstream tests

pub mod attribute;
pub mod document;
pub mod elasticsearch;
pub mod engine;
pub mod error;
pub mod locale;
pub mod naming;
pub mod query;
pub mod registry;
pub mod response;
pub mod schema;
pub mod transport;

pub use attribute::{Attribute, AttributeCatalog, AttributeOption, AttributeSource, BackendType, Filterable};
pub use document::{AdvancedIndex, Document, DocumentPreparer, RawAttributes};
pub use elasticsearch::ElasticsearchEngine;
pub use engine::{
    CollectingSink, Engine, ErrorSink, LogSink, PRODUCT_TYPE, SearchEngine, search_param,
};
pub use error::{Error, Result};
pub use locale::LanguageTable;
pub use naming::FieldNamer;
pub use query::{FilterValue, Interval, QueryCompiler, QueryParams, SearchParam, SortDirection, SortField};
pub use registry::{EngineContext, EngineRegistry};
pub use response::{FacetCounts, FieldStats, IdsResult, SearchResult};
pub use schema::{IndexProperties, IndexSettings, SchemaBuilder, StoreLocale};
pub use transport::{HttpTransport, IndexTransport};

#[cfg(any(test, feature = "test-support"))]
pub use transport::MockTransport;
