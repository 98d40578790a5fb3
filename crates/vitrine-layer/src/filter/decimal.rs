//! Decimal attribute range filter.

use vitrine_search::{Attribute, Interval};

use super::FacetItem;
use super::range::{self, improved_width, items_from_counts, price_buckets};
use crate::layer::Layer;
use crate::request::FilterRequest;

/// Range filter on a decimal attribute other than price.
#[derive(Debug, Clone)]
pub struct DecimalFilter {
    attribute: Attribute,
    applied: Option<Interval>,
    items: Option<Vec<FacetItem>>,
}

impl DecimalFilter {
    /// Filter on `attribute`.
    pub fn new(attribute: Attribute) -> Self {
        Self {
            attribute,
            applied: None,
            items: None,
        }
    }

    /// The attribute.
    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    /// Applied interval, if any.
    pub fn applied(&self) -> Option<Interval> {
        self.applied
    }

    /// Request variable: the attribute code.
    pub fn request_var(&self) -> &str {
        &self.attribute.code
    }

    /// Index field of the attribute.
    pub fn filter_field(&self, layer: &Layer) -> String {
        layer
            .namer()
            .field_name(&self.attribute, Some(layer.locale_code()))
    }

    /// Request power-of-ten buckets up to the attribute's maximum.
    pub async fn add_facet_condition(&self, layer: &mut Layer) {
        if self.applied.is_some() {
            return;
        }
        let field = self.filter_field(layer);
        let max = range::max_value(layer, &field).await;
        if max <= 0.0 {
            return;
        }
        let cap = layer.config().max_price_intervals;
        layer.add_facet_ranges(field, price_buckets(max, improved_width(max, cap), cap));
    }

    /// Apply a `from-to` selection.
    pub async fn apply_selection(&mut self, request: &FilterRequest, layer: &mut Layer) -> bool {
        let field = self.filter_field(layer);
        match range::apply_range(layer, &field, &self.attribute.code, request).await {
            Some(interval) => {
                self.applied = Some(interval);
                self.items = Some(Vec::new());
                true
            }
            None => false,
        }
    }

    /// Range items of the non-empty buckets.
    pub async fn items(&mut self, layer: &mut Layer) -> Vec<FacetItem> {
        if let Some(items) = &self.items {
            return items.clone();
        }
        let field = self.filter_field(layer);
        let items = items_from_counts(&layer.faceted_data(&field).await);
        self.items = Some(items.clone());
        items
    }
}

// ============================================================================
// Tests
// ============================================================================
