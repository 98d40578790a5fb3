//! Catalog attribute descriptors.
//!
//! Attribute metadata belongs to the host catalog. Vitrine receives an
//! immutable snapshot of it once per request as an [`AttributeCatalog`] and
//! looks attributes up by code.
//!
//! # Example
//!
//! ```rust
//! use vitrine_search::attribute::{Attribute, AttributeCatalog, BackendType};
//!
//! let catalog = AttributeCatalog::from_attributes(vec![
//!     Attribute::new(92, "color", BackendType::Varchar).with_search_weight(3),
//!     Attribute::new(75, "price", BackendType::Decimal).sortable(),
//! ]);
//!
//! assert!(catalog.get("color").is_some());
//! assert!(catalog.sortable().next().is_none()); // price is sorted as a searchable field
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Storage type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// Short string.
    Varchar,
    /// Integer or option id.
    Int,
    /// Decimal number.
    Decimal,
    /// Date and time.
    Datetime,
    /// Long text.
    Text,
    /// Column of the entity table itself.
    Static,
}

impl BackendType {
    /// Text-like types get locale-specific field names.
    pub fn is_text(self) -> bool {
        matches!(self, Self::Text | Self::Varchar)
    }

    /// Types whose sort field is shared across locales.
    pub fn is_locale_invariant(self) -> bool {
        matches!(self, Self::Datetime | Self::Decimal)
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Varchar => "varchar",
            Self::Int => "int",
            Self::Decimal => "decimal",
            Self::Datetime => "datetime",
            Self::Text => "text",
            Self::Static => "static",
        }
    }
}

/// Where an attribute takes its values from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeSource {
    /// Free value.
    #[default]
    None,
    /// Yes/no source.
    Boolean,
    /// Option table.
    Table,
    /// Any other option source.
    Other,
}

/// Layered navigation setting of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filterable {
    /// Not used in layered navigation.
    #[default]
    No,
    /// Show only options that have results.
    OptionsWithResults,
    /// Show every option, with zero counts.
    AllOptions,
}

/// One selectable option of an option-backed attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeOption {
    /// Stored value (usually the option id).
    pub value: String,
    /// Display label.
    pub label: String,
}

impl AttributeOption {
    /// Create an option.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Immutable attribute descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Numeric attribute id, used in cache tags.
    pub id: u32,
    /// Stable attribute code.
    pub code: String,
    /// Storage type.
    pub backend_type: BackendType,
    /// Input widget (`text`, `select`, `multiselect`, `boolean`, `price`, ...).
    #[serde(default)]
    pub frontend_input: String,
    /// Frontend validation class, e.g. `validate-digits`.
    #[serde(default)]
    pub frontend_class: Option<String>,
    /// Value source.
    #[serde(default)]
    pub source: AttributeSource,
    /// Whether a custom backend model handles the value.
    #[serde(default)]
    pub has_backend_model: bool,
    /// Search weight in `[0, 5]`.
    #[serde(default)]
    pub search_weight: u32,
    /// Used in quick search.
    #[serde(default)]
    pub is_searchable: bool,
    /// Layered navigation setting.
    #[serde(default)]
    pub filterable: Filterable,
    /// Used in search result layered navigation.
    #[serde(default)]
    pub is_filterable_in_search: bool,
    /// Used for sorting product listings.
    #[serde(default)]
    pub is_sortable: bool,
    /// Options of option-backed attributes, in display order.
    #[serde(default)]
    pub options: Vec<AttributeOption>,
}

impl Attribute {
    /// Create a plain attribute.
    pub fn new(id: u32, code: impl Into<String>, backend_type: BackendType) -> Self {
        Self {
            id,
            code: code.into(),
            backend_type,
            frontend_input: "text".to_string(),
            frontend_class: None,
            source: AttributeSource::None,
            has_backend_model: false,
            search_weight: 1,
            is_searchable: false,
            filterable: Filterable::No,
            is_filterable_in_search: false,
            is_sortable: false,
            options: Vec::new(),
        }
    }

    /// Set the search weight.
    pub fn with_search_weight(mut self, weight: u32) -> Self {
        self.search_weight = weight.min(5);
        self
    }

    /// Set the frontend input.
    pub fn with_frontend_input(mut self, input: impl Into<String>) -> Self {
        self.frontend_input = input.into();
        self
    }

    /// Set the frontend validation class.
    pub fn with_frontend_class(mut self, class: impl Into<String>) -> Self {
        self.frontend_class = Some(class.into());
        self
    }

    /// Set the value source.
    pub fn with_source(mut self, source: AttributeSource) -> Self {
        self.source = source;
        self
    }

    /// Set the options; the source becomes an option table unless already set.
    pub fn with_options(mut self, options: Vec<AttributeOption>) -> Self {
        if self.source == AttributeSource::None {
            self.source = AttributeSource::Table;
        }
        if self.frontend_input == "text" {
            self.frontend_input = "select".to_string();
        }
        self.options = options;
        self
    }

    /// Mark as handled by a custom backend model.
    pub fn with_backend_model(mut self) -> Self {
        self.has_backend_model = true;
        self
    }

    /// Mark as searchable.
    pub fn searchable(mut self) -> Self {
        self.is_searchable = true;
        self
    }

    /// Set the layered navigation mode.
    pub fn filterable(mut self, mode: Filterable) -> Self {
        self.filterable = mode;
        self
    }

    /// Mark as filterable in search results.
    pub fn filterable_in_search(mut self) -> Self {
        self.is_filterable_in_search = true;
        self
    }

    /// Mark as sortable.
    pub fn sortable(mut self) -> Self {
        self.is_sortable = true;
        self
    }

    /// Whether values come from a source model.
    pub fn uses_source(&self) -> bool {
        self.source != AttributeSource::None
    }

    /// Whether values come from the yes/no source.
    pub fn is_boolean_source(&self) -> bool {
        self.source == AttributeSource::Boolean
    }

    /// Whether values are option ids of an option table.
    pub fn uses_options(&self) -> bool {
        self.source == AttributeSource::Table && self.backend_type == BackendType::Int
    }

    /// Whether layered navigation uses this attribute at all.
    pub fn is_filterable(&self) -> bool {
        self.filterable != Filterable::No
    }

    /// Whether the input is free text (bucket keys are the labels).
    pub fn is_text_input(&self) -> bool {
        self.frontend_input == "text"
    }

    /// Whether the frontend validates values as digits.
    pub fn validates_digits(&self) -> bool {
        self.frontend_class.as_deref() == Some("validate-digits")
    }

    /// Search weight used as field boost; non-positive weights count as 1.
    pub fn boost(&self) -> u32 {
        if self.search_weight > 0 {
            self.search_weight
        } else {
            1
        }
    }

    /// Whether the attribute goes into the index.
    ///
    /// Varchar attributes without a backend model always do. Everything
    /// else, yes/no attributes included, needs to be searchable, filterable
    /// or filterable in search.
    pub fn is_indexable(&self) -> bool {
        if self.backend_type == BackendType::Varchar && !self.has_backend_model {
            return true;
        }
        self.is_searchable || self.is_filterable() || self.is_filterable_in_search
    }

    /// Label of the option with the given value.
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }
}

/// Typed lookup table of attributes, keyed by code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeCatalog {
    attributes: BTreeMap<String, Attribute>,
}

impl AttributeCatalog {
    /// Build a catalog; later duplicates of a code replace earlier ones.
    pub fn from_attributes(attributes: impl IntoIterator<Item = Attribute>) -> Self {
        Self {
            attributes: attributes
                .into_iter()
                .map(|a| (a.code.clone(), a))
                .collect(),
        }
    }

    /// Parse a JSON array of attributes.
    pub fn from_json_str(input: &str) -> crate::Result<Self> {
        let attributes: Vec<Attribute> = serde_json::from_str(input)?;
        Ok(Self::from_attributes(attributes))
    }

    /// Look an attribute up by code.
    pub fn get(&self, code: &str) -> Option<&Attribute> {
        self.attributes.get(code)
    }

    /// All attributes, ordered by code.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Attributes whose backend type is one of `types`.
    pub fn by_backend_types<'a>(
        &'a self,
        types: &'a [BackendType],
    ) -> impl Iterator<Item = &'a Attribute> + 'a {
        self.iter().filter(move |a| types.contains(&a.backend_type))
    }

    /// Sortable attributes. Price is excluded: it is sorted on its
    /// searchable field.
    pub fn sortable(&self) -> impl Iterator<Item = &Attribute> {
        self.iter().filter(|a| a.is_sortable && a.code != "price")
    }

    /// Sortable attribute by code.
    pub fn get_sortable(&self, code: &str) -> Option<&Attribute> {
        self.get(code).filter(|a| a.is_sortable && a.code != "price")
    }

    /// Attributes used by layered navigation.
    pub fn filterable(&self) -> impl Iterator<Item = &Attribute> {
        self.iter().filter(|a| a.is_filterable())
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_varchar_without_backend_is_always_indexable() {
        let attr = Attribute::new(1, "name", BackendType::Varchar);
        assert!(attr.is_indexable());

        let with_backend = attr.with_backend_model();
        assert!(!with_backend.is_indexable());
        assert!(with_backend.clone().searchable().is_indexable());
    }

    #[test]
    fn test_boolean_source_int_follows_usage_flags() {
        let attr = Attribute::new(2, "is_new", BackendType::Int).with_source(AttributeSource::Boolean);
        assert!(!attr.is_indexable());
        assert!(attr.filterable(Filterable::AllOptions).is_indexable());
    }

    #[test]
    fn test_int_needs_usage_flag() {
        let attr = Attribute::new(3, "manufacturer", BackendType::Int);
        assert!(!attr.is_indexable());
        assert!(attr.clone().filterable_in_search().is_indexable());
        assert!(
            attr.filterable(Filterable::OptionsWithResults)
                .is_indexable()
        );
    }

    #[test]
    fn test_other_types_follow_usage_flags() {
        let attr = Attribute::new(4, "news_from_date", BackendType::Datetime);
        assert!(!attr.is_indexable());
        assert!(attr.searchable().is_indexable());
    }

    #[test]
    fn test_boost_defaults_to_one() {
        let attr = Attribute::new(5, "sku", BackendType::Static).with_search_weight(0);
        assert_eq!(attr.boost(), 1);
        assert_eq!(attr.with_search_weight(9).boost(), 5);
    }

    #[test]
    fn test_options_imply_table_source() {
        let attr = Attribute::new(6, "color", BackendType::Int).with_options(vec![
            AttributeOption::new("10", "Red"),
            AttributeOption::new("11", "Blue"),
        ]);
        assert!(attr.uses_options());
        assert!(!attr.is_text_input());
        assert_eq!(attr.option_label("11"), Some("Blue"));
        assert_eq!(attr.option_label("12"), None);
    }

    #[test]
    fn test_catalog_sortable_excludes_price() {
        let catalog = AttributeCatalog::from_attributes(vec![
            Attribute::new(1, "price", BackendType::Decimal).sortable(),
            Attribute::new(2, "name", BackendType::Varchar).sortable(),
        ]);
        let codes: Vec<_> = catalog.sortable().map(|a| a.code.as_str()).collect();
        assert_eq!(codes, vec!["name"]);
        assert!(catalog.get_sortable("price").is_none());
    }

    #[test]
    fn test_catalog_from_json() {
        let catalog = AttributeCatalog::from_json_str(
            r#"[
                {"id": 92, "code": "color", "backend_type": "int",
                 "frontend_input": "select", "source": "table",
                 "filterable": "options_with_results",
                 "options": [{"value": "10", "label": "Red"}]},
                {"id": 71, "code": "description", "backend_type": "text",
                 "is_searchable": true}
            ]"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        let color = catalog.get("color").unwrap();
        assert_eq!(color.filterable, Filterable::OptionsWithResults);
        assert_eq!(color.option_label("10"), Some("Red"));
        let text: Vec<_> = catalog
            .by_backend_types(&[BackendType::Text])
            .map(|a| a.code.as_str())
            .collect();
        assert_eq!(text, vec!["description"]);
    }
}
