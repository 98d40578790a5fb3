//! Category filter.
//!
//! Facets are query facets `categories:<child id>` over the children of the
//! current category, or of the selected one once a selection is applied.

use std::sync::Arc;

use vitrine_search::{FilterValue, SearchParam};

use super::FacetItem;
use crate::category::{Category, CategoryRepository};
use crate::layer::Layer;
use crate::request::FilterRequest;
use crate::state::FilterItem;

/// Request variable of the category filter.
pub const REQUEST_VAR: &str = "cat";

/// Index field holding the category ids of a product.
pub const CATEGORY_FIELD: &str = "categories";

/// Query facet counting the products of a category.
pub fn facet_query(category_id: u64) -> String {
    format!("{CATEGORY_FIELD}:{category_id}")
}

/// Filter on child categories.
pub struct CategoryFilter {
    categories: Arc<dyn CategoryRepository>,
    applied: Option<Category>,
    items: Option<Vec<FacetItem>>,
}

impl CategoryFilter {
    /// Filter reading the tree from `categories`.
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self {
            categories,
            applied: None,
            items: None,
        }
    }

    /// Selected category, if any.
    pub fn applied(&self) -> Option<&Category> {
        self.applied.as_ref()
    }

    /// A non-zero category id.
    pub fn is_valid_value(value: &str) -> bool {
        value.parse::<u64>().is_ok_and(|id| id != 0)
    }

    fn effective<'a>(&'a self, layer: &'a Layer) -> &'a Category {
        self.applied.as_ref().unwrap_or(layer.current_category())
    }

    async fn children(&self, layer: &Layer) -> Vec<Category> {
        let parent = self.effective(layer).id;
        match self.categories.children(parent, layer.scope().store_id).await {
            Ok(children) => children,
            Err(e) => {
                log::warn!("Cannot list children of category {parent}: {e}");
                Vec::new()
            }
        }
    }

    /// Request one query facet per child category.
    pub async fn add_facet_condition(&self, layer: &mut Layer) {
        let children = self.children(layer).await;
        for child in children {
            layer.add_facet_query(facet_query(child.id));
        }
    }

    /// Apply the `cat` selection. Without a valid selection the layer is
    /// constrained to its current category.
    pub async fn apply_selection(&mut self, request: &FilterRequest, layer: &mut Layer) -> bool {
        let selected = request
            .single(REQUEST_VAR)
            .filter(|value| Self::is_valid_value(value))
            .and_then(|value| value.parse::<u64>().ok());

        let category = match selected {
            Some(id) => match self.categories.load(id, layer.scope().store_id).await {
                Ok(Some(category)) if category.is_active => Some(category),
                Ok(_) => {
                    log::debug!("Category {id} is missing or disabled");
                    None
                }
                Err(e) => {
                    log::warn!("Cannot load category {id}: {e}");
                    None
                }
            },
            None => None,
        };

        let Some(category) = category else {
            let current = layer.current_category().id;
            layer.add_filter(category_param(current));
            return false;
        };

        layer.add_filter(category_param(category.id));
        layer.add_state_item(FilterItem::new(
            category.name.clone(),
            REQUEST_VAR,
            category.id.to_string(),
        ));
        self.applied = Some(category);
        self.items = None;
        true
    }

    /// Active children with products, from cache when possible.
    pub async fn items(&mut self, layer: &mut Layer) -> Vec<FacetItem> {
        if let Some(items) = &self.items {
            return items.clone();
        }

        let key = format!("{}_SUBCATEGORIES", layer.state_key());
        if let Some(items) = layer.cache_data::<Vec<FacetItem>>(&key).await {
            self.items = Some(items.clone());
            return items;
        }

        let children = self.children(layer).await;
        let counts = layer.faceted_data(CATEGORY_FIELD).await;
        let items: Vec<FacetItem> = children
            .into_iter()
            .filter(|child| child.is_active)
            .filter_map(|child| {
                let value = child.id.to_string();
                let count = counts.get(&value).unwrap_or(0);
                (count > 0).then(|| FacetItem::new(child.name, value, count))
            })
            .collect();

        let tags = layer.state_tags(&[]);
        layer.save_cache_data(&key, &items, &tags).await;
        self.items = Some(items.clone());
        items
    }
}

impl std::fmt::Debug for CategoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryFilter")
            .field("applied", &self.applied.as_ref().map(|c| c.id))
            .field("items", &self.items.as_ref().map(Vec::len))
            .finish()
    }
}

fn category_param(category_id: u64) -> SearchParam {
    SearchParam::new(CATEGORY_FIELD, FilterValue::term(category_id.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
