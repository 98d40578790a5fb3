//! Layered navigation filters.
//!
//! Every filter shares one protocol:
//!
//! - `add_facet_condition` registers the facets it needs on the layer
//! - `apply_selection` reads its request variable, validates it and
//!   constrains the layer
//! - `items` turns facet counts into selectable [`FacetItem`]s
//!
//! The variant is chosen once per attribute by [`LayerFilter::for_attribute`].

pub mod attribute;
pub mod boolean;
pub mod category;
pub mod decimal;
pub mod price;
pub mod range;

use serde::{Deserialize, Serialize};
use vitrine_search::{Attribute, BackendType};

use crate::layer::Layer;
use crate::request::FilterRequest;

pub use attribute::AttributeFilter;
pub use boolean::BooleanFilter;
pub use category::CategoryFilter;
pub use decimal::DecimalFilter;
pub use price::PriceFilter;

/// One selectable facet value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetItem {
    /// Display text.
    pub label: String,
    /// Request value selecting this item.
    pub value: String,
    /// Number of matching products.
    pub count: u64,
}

impl FacetItem {
    /// Create an item.
    pub fn new(label: impl Into<String>, value: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            count,
        }
    }
}

/// A filter of the navigation layout.
#[derive(Debug)]
pub enum LayerFilter {
    /// Option or free-text attribute.
    Attribute(AttributeFilter),
    /// Yes/no attribute.
    Boolean(BooleanFilter),
    /// Child categories.
    Category(CategoryFilter),
    /// Decimal attribute ranges.
    Decimal(DecimalFilter),
    /// Price ranges.
    Price(PriceFilter),
}

impl LayerFilter {
    /// Filter variant for an attribute.
    pub fn for_attribute(attribute: Attribute) -> Self {
        if attribute.code == price::REQUEST_VAR {
            Self::Price(PriceFilter::new(attribute))
        } else if attribute.backend_type == BackendType::Decimal {
            Self::Decimal(DecimalFilter::new(attribute))
        } else if attribute.is_boolean_source() {
            Self::Boolean(BooleanFilter::new(attribute))
        } else {
            Self::Attribute(AttributeFilter::new(attribute))
        }
    }

    /// Display name of the filter.
    pub fn name(&self) -> &str {
        match self {
            Self::Attribute(f) => &f.attribute().code,
            Self::Boolean(f) => &f.attribute().code,
            Self::Category(_) => "category",
            Self::Decimal(f) => &f.attribute().code,
            Self::Price(f) => &f.attribute().code,
        }
    }

    /// Request variable carrying the selection.
    pub fn request_var(&self) -> &str {
        match self {
            Self::Attribute(f) => f.request_var(),
            Self::Boolean(f) => f.request_var(),
            Self::Category(_) => category::REQUEST_VAR,
            Self::Decimal(f) => f.request_var(),
            Self::Price(_) => price::REQUEST_VAR,
        }
    }

    /// Index field the filter constrains.
    pub fn filter_field(&self, layer: &Layer) -> String {
        match self {
            Self::Attribute(f) => f.filter_field(layer),
            Self::Boolean(f) => f.filter_field(layer),
            Self::Category(_) => category::CATEGORY_FIELD.to_string(),
            Self::Decimal(f) => f.filter_field(layer),
            Self::Price(f) => f.filter_field(layer),
        }
    }

    /// Whether a raw request value is acceptable.
    pub fn is_valid_value(&self, value: &str) -> bool {
        match self {
            Self::Attribute(_) => AttributeFilter::is_valid_value(value),
            Self::Boolean(_) => BooleanFilter::is_valid_value(value),
            Self::Category(_) => CategoryFilter::is_valid_value(value),
            Self::Decimal(_) | Self::Price(_) => range::parse_interval(value).is_some(),
        }
    }

    /// Whether a selection is applied to the layer.
    pub fn is_applied(&self, layer: &Layer) -> bool {
        match self {
            Self::Category(f) => f.applied().is_some(),
            Self::Price(f) => f.applied().is_some(),
            Self::Decimal(f) => f.applied().is_some(),
            other => layer.state().is_applied(other.request_var()),
        }
    }

    /// Register the facets this filter needs.
    pub async fn add_facet_condition(&self, layer: &mut Layer) {
        match self {
            Self::Attribute(f) => f.add_facet_condition(layer),
            Self::Boolean(f) => f.add_facet_condition(layer),
            Self::Category(f) => f.add_facet_condition(layer).await,
            Self::Decimal(f) => f.add_facet_condition(layer).await,
            Self::Price(f) => f.add_facet_condition(layer).await,
        }
    }

    /// Apply the request's selection. Returns whether a constraint was added.
    pub async fn apply_selection(&mut self, request: &FilterRequest, layer: &mut Layer) -> bool {
        match self {
            Self::Attribute(f) => f.apply_selection(request, layer),
            Self::Boolean(f) => f.apply_selection(request, layer),
            Self::Category(f) => f.apply_selection(request, layer).await,
            Self::Decimal(f) => f.apply_selection(request, layer).await,
            Self::Price(f) => f.apply_selection(request, layer).await,
        }
    }

    /// Selectable items under the current constraints.
    pub async fn items(&mut self, layer: &mut Layer) -> Vec<FacetItem> {
        match self {
            Self::Attribute(f) => f.items(layer).await,
            Self::Boolean(f) => f.items(layer).await,
            Self::Category(f) => f.items(layer).await,
            Self::Decimal(f) => f.items(layer).await,
            Self::Price(f) => f.items(layer).await,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{brand, color, is_new, price, weight};

    #[test]
    fn test_variant_selection() {
        assert!(matches!(LayerFilter::for_attribute(price()), LayerFilter::Price(_)));
        assert!(matches!(LayerFilter::for_attribute(weight()), LayerFilter::Decimal(_)));
        assert!(matches!(LayerFilter::for_attribute(is_new()), LayerFilter::Boolean(_)));
        assert!(matches!(LayerFilter::for_attribute(color()), LayerFilter::Attribute(_)));
        assert!(matches!(LayerFilter::for_attribute(brand()), LayerFilter::Attribute(_)));
    }

    #[test]
    fn test_value_validation_per_variant() {
        let color = LayerFilter::for_attribute(color());
        assert!(color.is_valid_value("12"));
        assert!(!color.is_valid_value("0"));
        assert!(!color.is_valid_value(""));

        let flag = LayerFilter::for_attribute(is_new());
        assert!(flag.is_valid_value("0"));
        assert!(flag.is_valid_value("1"));
        assert!(!flag.is_valid_value("yes"));

        let price = LayerFilter::for_attribute(price());
        assert!(price.is_valid_value("10-20"));
        assert!(price.is_valid_value("-20"));
        assert!(!price.is_valid_value("-"));
        assert!(!price.is_valid_value("cheap"));
    }

    #[test]
    fn test_request_vars() {
        assert_eq!(LayerFilter::for_attribute(price()).request_var(), "price");
        assert_eq!(LayerFilter::for_attribute(color()).request_var(), "color");
    }
}
