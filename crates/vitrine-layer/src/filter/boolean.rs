//! Yes/no attribute filter.
//!
//! Index values of boolean attributes come back in several shapes (`1`,
//! `"T"`, `true`). Buckets are folded onto `1` and `0` before they are
//! matched against the options.

use vitrine_search::response::FacetCounts;
use vitrine_search::{Attribute, AttributeOption};

use super::{AttributeFilter, FacetItem};
use crate::layer::Layer;
use crate::request::FilterRequest;

/// Bucket key of a raw index value: `1` for truthy values, else `0`.
pub fn bucket_key(raw: &str) -> &'static str {
    match raw {
        "true" | "T" | "1" => "1",
        _ => "0",
    }
}

/// Fold raw buckets onto `1` and `0`, summing their counts.
pub fn fold_counts(counts: FacetCounts) -> FacetCounts {
    let mut folded = FacetCounts::default();
    for bucket in counts.iter() {
        folded.add(bucket_key(&bucket.key), bucket.count);
    }
    folded
}

/// Filter on a yes/no attribute.
#[derive(Debug, Clone)]
pub struct BooleanFilter {
    inner: AttributeFilter,
}

impl BooleanFilter {
    /// Filter on `attribute`; attributes without options get `Yes`/`No`.
    pub fn new(mut attribute: Attribute) -> Self {
        if attribute.options.is_empty() {
            attribute.options = vec![AttributeOption::new("1", "Yes"), AttributeOption::new("0", "No")];
        }
        Self {
            inner: AttributeFilter::new(attribute),
        }
    }

    /// The attribute.
    pub fn attribute(&self) -> &Attribute {
        self.inner.attribute()
    }

    /// Request variable: the attribute code.
    pub fn request_var(&self) -> &str {
        self.inner.request_var()
    }

    /// Index field of the attribute.
    pub fn filter_field(&self, layer: &Layer) -> String {
        self.inner.filter_field(layer)
    }

    /// Only `0` and `1` are accepted.
    pub fn is_valid_value(value: &str) -> bool {
        matches!(value, "0" | "1")
    }

    /// Request a term facet on the attribute's field.
    pub fn add_facet_condition(&self, layer: &mut Layer) {
        self.inner.add_facet_condition(layer);
    }

    /// Apply the attribute's request value.
    pub fn apply_selection(&mut self, request: &FilterRequest, layer: &mut Layer) -> bool {
        self.inner.apply_validated(request, layer, Self::is_valid_value)
    }

    /// Facet items over the folded buckets.
    pub async fn items(&mut self, layer: &mut Layer) -> Vec<FacetItem> {
        self.inner.items_with(layer, fold_counts).await
    }
}

// ============================================================================
// Tests
// ============================================================================
