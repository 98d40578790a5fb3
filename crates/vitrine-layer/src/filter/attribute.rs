//! Option and free-text attribute filter.

use vitrine_core::cache::tags;
use vitrine_search::response::FacetCounts;
use vitrine_search::{Attribute, AttributeOption, Filterable, FilterValue, search_param};

use super::FacetItem;
use crate::layer::Layer;
use crate::request::FilterRequest;
use crate::state::FilterItem;

/// Filter on the values of one attribute.
#[derive(Debug, Clone)]
pub struct AttributeFilter {
    attribute: Attribute,
    items: Option<Vec<FacetItem>>,
}

impl AttributeFilter {
    /// Filter on `attribute`.
    pub fn new(attribute: Attribute) -> Self {
        Self {
            attribute,
            items: None,
        }
    }

    /// The attribute.
    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    /// Request variable: the attribute code.
    pub fn request_var(&self) -> &str {
        &self.attribute.code
    }

    /// Index field of the attribute in the layer's locale.
    pub fn filter_field(&self, layer: &Layer) -> String {
        layer
            .namer()
            .field_name(&self.attribute, Some(layer.locale_code()))
    }

    /// Empty values and `0` select nothing.
    pub fn is_valid_value(value: &str) -> bool {
        !value.is_empty() && value != "0"
    }

    /// Display text of a value. Option-backed attributes only know their
    /// options; other attributes show the value itself.
    pub fn option_text(&self, value: &str) -> Option<String> {
        if self.attribute.options.is_empty() {
            return Some(value.to_string());
        }
        self.attribute.option_label(value).map(str::to_string)
    }

    /// Request a term facet on the attribute's field.
    pub fn add_facet_condition(&self, layer: &mut Layer) {
        let field = self.filter_field(layer);
        layer.add_facet_field(field);
    }

    /// Apply the attribute's request value.
    pub fn apply_selection(&mut self, request: &FilterRequest, layer: &mut Layer) -> bool {
        self.apply_validated(request, layer, Self::is_valid_value)
    }

    /// Facet items, from cache when possible.
    pub async fn items(&mut self, layer: &mut Layer) -> Vec<FacetItem> {
        self.items_with(layer, |counts| counts).await
    }

    pub(crate) fn apply_validated(
        &mut self,
        request: &FilterRequest,
        layer: &mut Layer,
        is_valid: fn(&str) -> bool,
    ) -> bool {
        let Some(value) = request.single(&self.attribute.code) else {
            return false;
        };
        if !is_valid(value) {
            log::debug!("Ignoring invalid value '{value}' for {}", self.attribute.code);
            return false;
        }
        let Some(label) = self.option_text(value) else {
            log::debug!("No option '{value}' for {}", self.attribute.code);
            return false;
        };
        let Some(param) = search_param(
            layer.namer(),
            &self.attribute,
            FilterValue::term(value),
            Some(layer.locale_code()),
        ) else {
            return false;
        };

        layer.add_filter(param);
        layer.add_state_item(FilterItem::new(label, &self.attribute.code, value));
        self.items = Some(Vec::new());
        true
    }

    pub(crate) async fn items_with(
        &mut self,
        layer: &mut Layer,
        normalize: fn(FacetCounts) -> FacetCounts,
    ) -> Vec<FacetItem> {
        if let Some(items) = &self.items {
            return items.clone();
        }

        let key = format!("{}_{}", layer.state_key(), self.request_var());
        if let Some(items) = layer.cache_data::<Vec<FacetItem>>(&key).await {
            self.items = Some(items.clone());
            return items;
        }

        let field = self.filter_field(layer);
        let counts = normalize(layer.faceted_data(&field).await);
        let items = self.build_items(&counts);

        let tags = layer.state_tags(&[tags::attribute(self.attribute.id)]);
        layer.save_cache_data(&key, &items, &tags).await;
        self.items = Some(items.clone());
        items
    }

    fn build_items(&self, counts: &FacetCounts) -> Vec<FacetItem> {
        if counts.total() == 0 {
            return Vec::new();
        }

        let options: Vec<AttributeOption> = if self.attribute.is_text_input() {
            counts
                .iter()
                .map(|b| AttributeOption::new(b.key.clone(), b.key.clone()))
                .collect()
        } else {
            self.attribute.options.clone()
        };

        let only_with_results = self.attribute.filterable == Filterable::OptionsWithResults;
        options
            .into_iter()
            .filter(|option| !option.value.is_empty())
            .filter_map(|option| {
                let count = counts.get(&option.value).unwrap_or(0);
                if count == 0 && only_with_results {
                    return None;
                }
                Some(FacetItem::new(option.label, option.value, count))
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
