//! Layered navigation for Vitrine.
//!
//! Builds the filter sidebar of a category page or a search result page on
//! top of the search engine: facet counts per attribute, price ranges,
//! child categories, and the constraints of the filters a visitor applied.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      vitrine-layer                       │
//! ├──────────────────────────────────────────────────────────┤
//! │  LayoutBuilder ── FilterRequest                          │
//! │  └── LayerFilter                                         │
//! │      ├── AttributeFilter / BooleanFilter  (term facets)  │
//! │      ├── PriceFilter / DecimalFilter      (range facets) │
//! │      └── CategoryFilter ── CategoryRepository            │
//! ├──────────────────────────────────────────────────────────┤
//! │  Layer: scope, QueryParams, FilterState, cached facets   │
//! │  └── vitrine_search::Engine + vitrine_core::CacheService │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Failed searches never surface here: the engine answers with an empty
//! result and the layout simply has no items.

pub mod category;
pub mod error;
pub mod filter;
pub mod layer;
pub mod layout;
pub mod request;
pub mod state;

#[cfg(test)]
mod test_support;

pub use category::{Category, CategoryRepository, MemoryCategories};
pub use error::{Error, Result};
pub use filter::{FacetItem, LayerFilter};
pub use layer::{Layer, LayerScope};
pub use layout::{FilterBlock, LayoutBuilder, NavigationLayout};
pub use request::{FilterRequest, RequestValue};
pub use state::{FilterItem, FilterState};
