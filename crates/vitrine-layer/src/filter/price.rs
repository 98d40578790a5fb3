//! Price range filter.
//!
//! Prices are indexed per customer group and website, so the field depends
//! on the layer scope. The bucket width is either the configured range or,
//! in improved mode, derived from the maximum price.

use vitrine_core::PriceRangeCalculation;
use vitrine_search::document::price_field;
use vitrine_search::{Attribute, Interval};

use super::FacetItem;
use super::range::{self, improved_width, items_from_counts, price_buckets};
use crate::layer::Layer;
use crate::request::FilterRequest;

/// Request variable and attribute code of the price filter.
pub const REQUEST_VAR: &str = "price";

/// Filter on the price of the visitor's customer group.
#[derive(Debug, Clone)]
pub struct PriceFilter {
    attribute: Attribute,
    applied: Option<Interval>,
    items: Option<Vec<FacetItem>>,
}

impl PriceFilter {
    /// Price filter of the `price` attribute.
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

    /// `price_<customer group>_<website>`.
    pub fn filter_field(&self, layer: &Layer) -> String {
        let scope = layer.scope();
        price_field(scope.customer_group_id, scope.website_id)
    }

    /// Largest price under the layer's constraints.
    pub async fn max_price(&self, layer: &Layer) -> f64 {
        range::max_value(layer, &self.filter_field(layer)).await
    }

    /// Bucket width for `max`.
    pub fn range_width(layer: &Layer, max: f64) -> f64 {
        let config = layer.config();
        match config.price_range_calculation {
            PriceRangeCalculation::Auto if config.price_range > 0.0 => config.price_range,
            _ => improved_width(max, config.max_price_intervals),
        }
    }

    /// Request range buckets up to the maximum price. Nothing is requested
    /// once an interval is applied or when there is no positive price.
    pub async fn add_facet_condition(&self, layer: &mut Layer) {
        if self.applied.is_some() {
            return;
        }
        let max = self.max_price(layer).await;
        if max <= 0.0 {
            log::debug!("No price facets, maximum price is {max}");
            return;
        }
        let buckets = price_buckets(
            max,
            Self::range_width(layer, max),
            layer.config().max_price_intervals,
        );
        let field = self.filter_field(layer);
        layer.add_facet_ranges(field, buckets);
    }

    /// Apply the `price=from-to` selection.
    pub async fn apply_selection(&mut self, request: &FilterRequest, layer: &mut Layer) -> bool {
        let field = self.filter_field(layer);
        match range::apply_range(layer, &field, REQUEST_VAR, request).await {
            Some(interval) => {
                self.applied = Some(interval);
                self.items = None;
                true
            }
            None => false,
        }
    }

    /// Range items. In basic mode an applied interval hides them.
    pub async fn items(&mut self, layer: &mut Layer) -> Vec<FacetItem> {
        if let Some(items) = &self.items {
            return items.clone();
        }
        let improved = layer.config().price_range_calculation == PriceRangeCalculation::Improved;
        let items = if self.applied.is_some() && !improved {
            Vec::new()
        } else {
            let field = self.filter_field(layer);
            items_from_counts(&layer.faceted_data(&field).await)
        };
        self.items = Some(items.clone());
        items
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::layer::LayerScope;
    use crate::test_support::{config, engine_with, engine_with_config, indexed_transport, layer_on, price};
    use serde_json::json;
    use std::sync::Arc;
    use vitrine_core::MemoryCache;
    use vitrine_search::MockTransport;

    fn stats_response(max: f64) -> serde_json::Value {
        json!({
            "hits": {"total": 1, "hits": []},
            "facets": {"price_0_1": {"_type": "statistical", "count": 9, "min": 4.0, "max": max}}
        })
    }

    #[test]
    fn test_field_follows_scope() {
        let engine = engine_with(Arc::new(MockTransport::new()));
        let layer = Layer::new(
            engine,
            Arc::new(MemoryCache::new()),
            LayerScope::new(1, "en_US", 2).with_customer_group(3),
            Category::new(3, "Shoes"),
        );
        assert_eq!(PriceFilter::new(price()).filter_field(&layer), "price_3_2");
    }

    #[tokio::test]
    async fn test_facet_condition_buckets_up_to_max() {
        let transport = indexed_transport().await;
        transport.push_response(stats_response(100.0));
        let mut layer = layer_on(engine_with(transport.clone()), Category::new(3, "Shoes"));

        PriceFilter::new(price()).add_facet_condition(&mut layer).await;
        let buckets = &layer.params().facets.ranges["price_0_1"];
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[3], Interval::new(Some(75.0), None, true));
    }

    #[tokio::test]
    async fn test_tiny_configured_step_is_capped() {
        let transport = indexed_transport().await;
        transport.push_response(stats_response(9_999.0));
        let engine = engine_with_config(
            transport,
            vitrine_core::EngineConfig {
                price_range: 0.5,
                ..config()
            },
        );
        let mut layer = layer_on(engine, Category::new(3, "Shoes"));

        PriceFilter::new(price()).add_facet_condition(&mut layer).await;
        let buckets = &layer.params().facets.ranges["price_0_1"];
        assert_eq!(buckets.len(), 10);
        assert_eq!(buckets[0], Interval::new(None, Some(1000.0), false));
    }

    #[tokio::test]
    async fn test_max_price_is_cached() {
        let transport = indexed_transport().await;
        transport.push_response(stats_response(100.0));
        let layer = layer_on(engine_with(transport.clone()), Category::new(3, "Shoes"));
        let filter = PriceFilter::new(price());

        assert_eq!(filter.max_price(&layer).await, 100.0);
        assert_eq!(filter.max_price(&layer).await, 100.0);
        assert_eq!(transport.searches().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_statistic_falls_back_to_default() {
        let transport = indexed_transport().await;
        transport.push_response(json!({"hits": {"total": 0, "hits": []}}));
        let engine = engine_with_config(
            transport,
            vitrine_core::EngineConfig {
                default_max_price: 500.0,
                ..config()
            },
        );
        let layer = layer_on(engine, Category::new(3, "Shoes"));
        assert_eq!(PriceFilter::new(price()).max_price(&layer).await, 500.0);
    }

    #[tokio::test]
    async fn test_no_facets_without_prices() {
        let transport = indexed_transport().await;
        transport.push_response(stats_response(0.0));
        let mut layer = layer_on(engine_with(transport), Category::new(3, "Shoes"));

        PriceFilter::new(price()).add_facet_condition(&mut layer).await;
        assert!(layer.params().facets.ranges.is_empty());
    }

    #[tokio::test]
    async fn test_apply_degenerate_range() {
        let transport = indexed_transport().await;
        transport.push_response(stats_response(100.0));
        let mut layer = layer_on(engine_with(transport), Category::new(3, "Shoes"));
        let mut filter = PriceFilter::new(price());

        let request = FilterRequest::new().with("price", "50-50");
        assert!(filter.apply_selection(&request, &mut layer).await);
        assert_eq!(
            layer.params().range_filters["price_0_1"],
            Interval::new(Some(50.0), Some(50.01), false)
        );
        assert_eq!(layer.state().items()[0].label, "50 - 50");
        assert!(filter.items(&mut layer).await.is_empty());
    }

    #[tokio::test]
    async fn test_applied_interval_skips_facets() {
        let transport = indexed_transport().await;
        transport.push_response(stats_response(100.0));
        let mut layer = layer_on(engine_with(transport.clone()), Category::new(3, "Shoes"));
        let mut filter = PriceFilter::new(price());

        let request = FilterRequest::new().with("price", "75-");
        assert!(filter.apply_selection(&request, &mut layer).await);
        assert!(layer.params().range_filters["price_0_1"].include_upper);

        filter.add_facet_condition(&mut layer).await;
        assert!(layer.params().facets.ranges.is_empty());
        assert_eq!(transport.searches().len(), 1);
    }

    #[tokio::test]
    async fn test_items_from_range_facets() {
        let transport = indexed_transport().await;
        transport.push_response(json!({
            "hits": {"total": 5, "hits": []},
            "facets": {"price_0_1": {"_type": "range", "ranges": [
                {"to": 25.0, "count": 3},
                {"from": 25.0, "to": 50.0, "count": 2},
                {"from": 50.0, "count": 0}
            ]}}
        }));
        let mut layer = layer_on(engine_with(transport), Category::new(3, "Shoes"));

        let items = PriceFilter::new(price()).items(&mut layer).await;
        assert_eq!(
            items,
            vec![
                FacetItem::new("0 - 25", "-25", 3),
                FacetItem::new("25 and above", "25-", 2),
            ]
        );
    }

    #[test]
    fn test_range_width_modes() {
        let layer = layer_on(engine_with(Arc::new(MockTransport::new())), Category::new(3, "Shoes"));
        assert_eq!(PriceFilter::range_width(&layer, 1234.0), 25.0);

        let engine = engine_with_config(
            Arc::new(MockTransport::new()),
            vitrine_core::EngineConfig {
                price_range_calculation: PriceRangeCalculation::Improved,
                ..config()
            },
        );
        let layer = layer_on(engine, Category::new(3, "Shoes"));
        assert_eq!(PriceFilter::range_width(&layer, 1234.0), 1000.0);
    }
}
