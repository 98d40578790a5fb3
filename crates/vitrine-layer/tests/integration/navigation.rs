//! Full navigation cycles on a category page and a search page.

use serde_json::json;
use vitrine_core::CacheService;
use vitrine_core::cache::tags;
use vitrine_layer::{FacetItem, FilterItem, FilterRequest};

use crate::common::{TestHarness, hits, stats};

fn category_page_facets() -> serde_json::Value {
    json!({
        "hits": hits(&[12, 15, 18]),
        "facets": {
            "categories:4": {"_type": "query", "count": 2},
            "categories:5": {"_type": "query", "count": 0},
            "categories:6": {"_type": "query", "count": 1},
            "brand_en": {"_type": "terms", "terms": [
                {"term": "Acme", "count": 2},
                {"term": "Zeta", "count": 1}
            ]},
            "color": {"_type": "terms", "terms": [{"term": "12", "count": 3}]},
            "is_new": {"_type": "terms", "terms": [
                {"term": "T", "count": 1},
                {"term": "F", "count": 2}
            ]},
            "price_0_1": {"_type": "range", "ranges": [
                {"to": 25.0, "count": 1},
                {"from": 25.0, "to": 50.0, "count": 2},
                {"from": 50.0, "to": 75.0, "count": 0},
                {"from": 75.0, "count": 0}
            ]},
            "weight": {"_type": "range", "ranges": [
                {"to": 10.0, "count": 3},
                {"from": 10.0, "count": 0}
            ]}
        }
    })
}

#[tokio::test]
async fn test_category_page_without_selection() {
    let harness = TestHarness::new().await;
    harness.transport.push_response(stats("price_0_1", 100.0));
    harness.transport.push_response(stats("weight", 12.0));
    harness.transport.push_response(category_page_facets());

    let mut layer = harness.shoes_layer();
    let layout = harness.layout.build(&mut layer, &FilterRequest::new()).await;

    assert_eq!(layout.total_count, 3);
    assert_eq!(layout.product_ids, vec![12, 15, 18]);
    assert!(layout.state.is_empty());

    assert_eq!(
        layout.block("cat").unwrap().items,
        vec![FacetItem::new("Boots", "4", 2)]
    );
    assert_eq!(
        layout.block("brand").unwrap().items,
        vec![FacetItem::new("Acme", "Acme", 2), FacetItem::new("Zeta", "Zeta", 1)]
    );
    assert_eq!(
        layout.block("color").unwrap().items,
        vec![FacetItem::new("Red", "12", 3)]
    );
    assert_eq!(
        layout.block("is_new").unwrap().items,
        vec![FacetItem::new("Yes", "1", 1), FacetItem::new("No", "0", 2)]
    );
    assert_eq!(
        layout.block("price").unwrap().items,
        vec![FacetItem::new("0 - 25", "-25", 1), FacetItem::new("25 and above", "25-", 2)]
    );
    assert_eq!(
        layout.block("weight").unwrap().items,
        vec![FacetItem::new("0 - 10", "-10", 3)]
    );

    let searches = harness.transport.searches();
    assert_eq!(searches.len(), 3);
    let facets = &searches[2]["facets"];
    assert!(facets.get("categories:4").is_some());
    assert!(facets.get("price_0_1").is_some());
}

#[tokio::test]
async fn test_selected_filters_constrain_and_close() {
    let harness = TestHarness::new().await;
    harness.transport.push_response(stats("price_0_1", 100.0));
    harness.transport.push_response(stats("weight", 12.0));
    harness.transport.push_response(category_page_facets());

    let request = FilterRequest::parse_query("color=12&price=25-50&cat=4&page=2");
    let mut layer = harness.shoes_layer();
    let layout = harness.layout.build(&mut layer, &request).await;

    assert_eq!(
        layout.state,
        vec![
            FilterItem::new("Boots", "cat", "4"),
            FilterItem::new("Red", "color", "12"),
            FilterItem::new("25 - 50", "price", "25-50"),
        ]
    );
    assert!(layout.block("color").is_none());
    assert!(layout.block("price").is_none());
    assert!(layout.block("brand").is_some());

    assert_eq!(
        layer.params().filter_expression(),
        "store_id:\"1\" AND categories:\"4\" AND color:\"12\""
    );
    let price = layer.params().range_filters["price_0_1"];
    assert_eq!((price.from, price.to, price.include_upper), (Some(25.0), Some(50.0), false));
    assert!(layer.params().facets.ranges.get("price_0_1").is_none());
    assert!(!layer.params().facets.fields.contains("color"));
}

#[tokio::test]
async fn test_invalid_values_are_ignored() {
    let harness = TestHarness::new().await;
    harness.transport.push_response(stats("price_0_1", 100.0));
    harness.transport.push_response(stats("weight", 12.0));
    harness.transport.push_response(category_page_facets());

    let request = FilterRequest::parse_query("color=99&is_new=yes&price=cheap&cat=6&brand[]=Acme");
    let mut layer = harness.shoes_layer();
    let layout = harness.layout.build(&mut layer, &request).await;

    assert!(layout.state.is_empty());
    assert_eq!(
        layer.params().filter_expression(),
        "store_id:\"1\" AND categories:\"3\""
    );
    assert!(layer.params().range_filters.is_empty());
}

#[tokio::test]
async fn test_failing_index_degrades_to_empty_layout() {
    let harness = TestHarness::new().await;
    harness.transport.fail_with("connection refused");

    let mut layer = harness.shoes_layer();
    let layout = harness
        .layout
        .build(&mut layer, &FilterRequest::parse_query("color=12"))
        .await;

    assert_eq!(layout.total_count, 0);
    assert!(layout.product_ids.is_empty());
    assert!(layout.filters.is_empty());
    assert_eq!(layout.state, vec![FilterItem::new("Red", "color", "12")]);
}

#[tokio::test]
async fn test_search_page_uses_search_filters_and_visibility() {
    let harness = TestHarness::new().await;
    harness.transport.push_response(json!({
        "hits": hits(&[15]),
        "facets": {
            "brand_en": {"_type": "terms", "terms": [{"term": "Acme", "count": 1}]}
        }
    }));

    let mut layer = harness.shoes_layer().with_query("boots");
    let layout = harness.layout.build(&mut layer, &FilterRequest::new()).await;

    assert_eq!(layout.product_ids, vec![15]);
    assert_eq!(
        layout.filters.iter().map(|b| b.request_var.as_str()).collect::<Vec<_>>(),
        vec!["brand"]
    );
    assert!(
        layer
            .params()
            .filter_expression()
            .contains("(visibility:\"3\" OR visibility:\"4\")")
    );
}

#[tokio::test]
async fn test_facet_items_are_cached_until_reindex() {
    let harness = TestHarness::new().await;
    for _ in 0..2 {
        harness.transport.push_response(stats("price_0_1", 100.0));
        harness.transport.push_response(stats("weight", 12.0));
        harness.transport.push_response(category_page_facets());
    }

    let mut layer = harness.shoes_layer();
    harness.layout.build(&mut layer, &FilterRequest::new()).await;
    assert!(!harness.cache.is_empty());

    // Max values come from the cache on the second cycle.
    let mut layer = harness.shoes_layer();
    let layout = harness.layout.build(&mut layer, &FilterRequest::new()).await;
    assert_eq!(harness.transport.searches().len(), 4);
    assert_eq!(layout.block("color").unwrap().items, vec![FacetItem::new("Red", "12", 3)]);

    let removed = harness
        .cache
        .clean_tags(&[tags::SEARCH_INDEX.to_string()])
        .await
        .unwrap();
    assert!(removed > 0);
}
