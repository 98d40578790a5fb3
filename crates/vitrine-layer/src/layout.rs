//! Navigation layout.
//!
//! One navigation cycle: pick a filter per filterable attribute plus the
//! category filter, apply the request's selections, register the facets of
//! every filter that is still open, then collect the items.
//!
//! ```rust,ignore
//! let builder = LayoutBuilder::new(categories);
//! let mut layer = Layer::new(engine, cache, scope, category);
//! let layout = builder.build(&mut layer, &FilterRequest::parse_query("color=12")).await;
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::category::{Category, CategoryRepository};
use crate::error::{Error, Result};
use crate::filter::{CategoryFilter, FacetItem, LayerFilter};
use crate::layer::Layer;
use crate::request::FilterRequest;
use crate::state::FilterItem;

/// Items of one filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterBlock {
    /// Filter name.
    pub name: String,
    /// Request variable selecting an item.
    pub request_var: String,
    /// Selectable items.
    pub items: Vec<FacetItem>,
}

/// Result of a navigation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationLayout {
    /// Applied filters.
    pub state: Vec<FilterItem>,
    /// Filters with at least one item.
    pub filters: Vec<FilterBlock>,
    /// Number of matching products.
    pub total_count: u64,
    /// Matching product ids, in rank order.
    pub product_ids: Vec<u64>,
}

impl NavigationLayout {
    /// Items of a filter by request variable.
    pub fn block(&self, request_var: &str) -> Option<&FilterBlock> {
        self.filters.iter().find(|b| b.request_var == request_var)
    }
}

/// Builds navigation layouts over a category tree.
pub struct LayoutBuilder {
    categories: Arc<dyn CategoryRepository>,
}

impl LayoutBuilder {
    /// Builder reading categories from `categories`.
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }

    /// Load an active category to navigate in.
    pub async fn category(&self, id: u64, store_id: u32) -> Result<Category> {
        match self.categories.load(id, store_id).await? {
            Some(category) if category.is_active => Ok(category),
            Some(_) => Err(Error::category(id, "category is disabled")),
            None => Err(Error::category(id, "no such category")),
        }
    }

    /// Filters of the layer: the category filter, then one per attribute
    /// filterable in this kind of layer.
    pub fn filters(&self, layer: &Layer) -> Vec<LayerFilter> {
        let search = layer.is_search();
        let attributes = layer
            .namer()
            .catalog()
            .iter()
            .filter(|a| {
                if search {
                    a.is_filterable_in_search
                } else {
                    a.is_filterable()
                }
            })
            .cloned()
            .map(LayerFilter::for_attribute);

        std::iter::once(LayerFilter::Category(CategoryFilter::new(Arc::clone(
            &self.categories,
        ))))
        .chain(attributes)
        .collect()
    }

    /// Run a navigation cycle on `layer`.
    ///
    /// Engines without layered navigation yield an empty layout.
    pub async fn build(&self, layer: &mut Layer, request: &FilterRequest) -> NavigationLayout {
        if !layer.engine().backend().is_layered_navigation_allowed() {
            log::debug!("Layered navigation is not available on {}", layer.engine().name());
            return NavigationLayout::default();
        }

        let mut filters = self.filters(layer);
        for filter in &mut filters {
            filter.apply_selection(request, layer).await;
        }

        for filter in &filters {
            let open = matches!(filter, LayerFilter::Category(_)) || !filter.is_applied(layer);
            if open {
                filter.add_facet_condition(layer).await;
            }
        }

        let result = layer.load().await;
        let total_count = result.total_count;
        let product_ids = result.entity_ids();

        let mut blocks = Vec::new();
        for filter in &mut filters {
            let items = filter.items(layer).await;
            if items.is_empty() {
                continue;
            }
            blocks.push(FilterBlock {
                name: filter.name().to_string(),
                request_var: filter.request_var().to_string(),
                items,
            });
        }
        log::debug!(
            "Navigation layout with {} filters over {total_count} products",
            blocks.len()
        );

        NavigationLayout {
            state: layer.state().items().to_vec(),
            filters: blocks,
            total_count,
            product_ids,
        }
    }
}

impl std::fmt::Debug for LayoutBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutBuilder").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::category::MemoryCategories;
    use crate::test_support::{engine_with, layer_on};
    use vitrine_search::MockTransport;

    fn builder() -> LayoutBuilder {
        LayoutBuilder::new(Arc::new(MemoryCategories::new([
            Category::new(3, "Shoes"),
            Category::new(4, "Boots").with_parent(3),
            Category::new(8, "Archive").inactive(),
        ])))
    }

    #[tokio::test]
    async fn test_category_lookup() {
        let builder = builder();
        assert_eq!(builder.category(3, 1).await.unwrap().name, "Shoes");
        assert!(matches!(builder.category(8, 1).await, Err(Error::Category { id: 8, .. })));
        assert!(matches!(builder.category(99, 1).await, Err(Error::Category { id: 99, .. })));
    }

    #[test]
    fn test_catalog_layer_filters() {
        let layer = layer_on(engine_with(Arc::new(MockTransport::new())), Category::new(3, "Shoes"));
        let vars: Vec<String> = builder()
            .filters(&layer)
            .iter()
            .map(|f| f.request_var().to_string())
            .collect();
        assert_eq!(vars[0], "cat");
        for var in ["brand", "color", "is_new", "price", "weight"] {
            assert!(vars.iter().any(|v| v == var), "missing {var}");
        }
    }

    #[test]
    fn test_search_layer_uses_search_flag() {
        let layer = layer_on(engine_with(Arc::new(MockTransport::new())), Category::new(3, "Shoes"))
            .with_query("boots");
        let filters = builder().filters(&layer);
        assert_eq!(filters.len(), 1);
        assert!(matches!(filters[0], LayerFilter::Category(_)));
    }
}
