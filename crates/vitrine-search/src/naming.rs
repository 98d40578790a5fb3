//! Field naming.
//!
//! [`FieldNamer`] is the single place that decides how an attribute is named
//! in the index. Every other component (schema, documents, queries, layered
//! navigation) asks it.
//!
//! Rules:
//!
//! - text and varchar attributes get a `_<language>` suffix for the locale's
//!   language, when the locale is mapped; `score` is never suffixed
//! - sort fields are prefixed with [`SORT_PREFIX`]; datetime and decimal sort
//!   fields are shared across locales and carry no suffix
//! - a code that is not in the catalog is returned unchanged

use std::sync::Arc;

use crate::attribute::{Attribute, AttributeCatalog};
use crate::locale::LanguageTable;

/// Prefix of dedicated sort fields.
pub const SORT_PREFIX: &str = "sort_by_";

/// Marker prefix of computed (advanced index) fields in raw index data.
pub const ADVANCED_PREFIX: char = '#';

/// An attribute given either as a descriptor or by code.
#[derive(Debug, Clone, Copy)]
pub enum AttributeRef<'a> {
    /// Loaded descriptor.
    Attribute(&'a Attribute),
    /// Bare code, resolved through the catalog.
    Code(&'a str),
}

impl<'a> From<&'a Attribute> for AttributeRef<'a> {
    fn from(attribute: &'a Attribute) -> Self {
        Self::Attribute(attribute)
    }
}

impl<'a> From<&'a str> for AttributeRef<'a> {
    fn from(code: &'a str) -> Self {
        Self::Code(code)
    }
}

impl<'a> From<&'a String> for AttributeRef<'a> {
    fn from(code: &'a String) -> Self {
        Self::Code(code.as_str())
    }
}

/// Resolves attributes to index field names.
#[derive(Debug, Clone)]
pub struct FieldNamer {
    catalog: Arc<AttributeCatalog>,
    languages: Arc<LanguageTable>,
    default_locale: Option<String>,
}

impl FieldNamer {
    /// Create a namer over a catalog and language table.
    pub fn new(catalog: Arc<AttributeCatalog>, languages: Arc<LanguageTable>) -> Self {
        Self {
            catalog,
            languages,
            default_locale: None,
        }
    }

    /// Locale used when a call passes none (the current store's locale).
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    /// The attribute catalog.
    pub fn catalog(&self) -> &AttributeCatalog {
        &self.catalog
    }

    /// The language table.
    pub fn languages(&self) -> &LanguageTable {
        &self.languages
    }

    /// Default locale, if any.
    pub fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }

    /// Language code for `locale`, falling back to the default locale.
    pub fn language_code(&self, locale: Option<&str>) -> Option<&str> {
        locale
            .or(self.default_locale.as_deref())
            .and_then(|l| self.languages.language_of(l))
    }

    /// Index field name of an attribute.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use vitrine_search::attribute::{Attribute, AttributeCatalog, BackendType};
    /// use vitrine_search::locale::LanguageTable;
    /// use vitrine_search::naming::FieldNamer;
    ///
    /// let catalog = AttributeCatalog::from_attributes(vec![
    ///     Attribute::new(92, "color", BackendType::Varchar),
    /// ]);
    /// let namer = FieldNamer::new(Arc::new(catalog), Arc::new(LanguageTable::default()));
    ///
    /// assert_eq!(namer.field_name("color", Some("fr_FR")), "color_fr");
    /// assert_eq!(namer.field_name("color", None), "color");
    /// assert_eq!(namer.field_name("unknown", Some("fr_FR")), "unknown");
    /// ```
    pub fn field_name<'a>(&self, attribute: impl Into<AttributeRef<'a>>, locale: Option<&str>) -> String {
        let attribute = match attribute.into() {
            AttributeRef::Attribute(a) => a,
            AttributeRef::Code(code) => match self.catalog.get(code) {
                Some(a) => a,
                None => return code.to_string(),
            },
        };

        let mut name = attribute.code.clone();
        if attribute.code != "score" && attribute.backend_type.is_text() {
            self.push_language_suffix(&mut name, locale);
        }
        name
    }

    /// Sort field name of an attribute.
    ///
    /// Codes that are not sortable attributes are returned unchanged.
    pub fn sort_field_name<'a>(
        &self,
        attribute: impl Into<AttributeRef<'a>>,
        locale: Option<&str>,
    ) -> String {
        let attribute = match attribute.into() {
            AttributeRef::Attribute(a) => a,
            AttributeRef::Code(code) => match self.catalog.get_sortable(code) {
                Some(a) => a,
                None => return code.to_string(),
            },
        };

        let mut name = attribute.code.clone();
        if attribute.code != "score" && !attribute.backend_type.is_locale_invariant() {
            self.push_language_suffix(&mut name, locale);
        }
        format!("{SORT_PREFIX}{name}")
    }

    fn push_language_suffix(&self, name: &mut String, locale: Option<&str>) {
        if let Some(language) = self.language_code(locale) {
            name.push('_');
            name.push_str(language);
        }
    }
}

/// Strip the advanced index marker from a raw key.
pub fn strip_advanced_prefix(key: &str) -> &str {
    key.strip_prefix(ADVANCED_PREFIX).unwrap_or(key)
}

// ============================================================================
// Tests
// ============================================================================
