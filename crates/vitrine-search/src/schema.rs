//! Index schema and analysis settings.
//!
//! [`SchemaBuilder`] derives the index mapping from the attribute catalog and
//! the store locales, and the analysis settings (analyzers and token filters)
//! from the store languages.
//!
//! Field types:
//!
//! | Attribute | Field type |
//! |-----------|------------|
//! | decimal backend | `double` |
//! | boolean source | `boolean` |
//! | datetime backend | `date` (format `date`, i.e. `yyyy-MM-dd`) |
//! | option source or digit-validated | `integer` |
//! | anything else | `string`, as a multi-field for varchar/int |
//!
//! Output uses ordered maps, so building twice from the same input is
//! byte-identical once serialized.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vitrine_core::EngineConfig;

use crate::attribute::{Attribute, AttributeSource, BackendType};
use crate::locale::LanguageTable;
use crate::naming::FieldNamer;

/// Date format of date fields.
pub const DATE_FORMAT: &str = "date";

/// Name of the exact, not-analyzed sub-field of multi-fields.
pub const UNTOUCHED: &str = "untouched";

/// A store and its locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLocale {
    /// Store id.
    pub store_id: u32,
    /// Locale code, e.g. `fr_FR`.
    pub locale_code: String,
}

impl StoreLocale {
    /// Create a store/locale pair.
    pub fn new(store_id: u32, locale_code: impl Into<String>) -> Self {
        Self {
            store_id,
            locale_code: locale_code.into(),
        }
    }
}

// ============================================================================
// Mapping
// ============================================================================

/// Core field types of the index service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Analyzed string.
    String,
    /// 32-bit integer.
    Integer,
    /// Double precision number.
    Double,
    /// Boolean.
    Boolean,
    /// Date.
    Date,
    /// Several sub-fields indexed from the same value.
    MultiField,
}

/// Mapping of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Field type.
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Query-time boost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<u32>,

    /// `not_analyzed` for exact fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    /// Analyzer name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,

    /// Date format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Sub-fields of a multi-field.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldMapping>,
}

impl FieldMapping {
    /// A bare field of the given type.
    pub fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            boost: None,
            index: None,
            analyzer: None,
            format: None,
            fields: BTreeMap::new(),
        }
    }

    /// Set the boost.
    pub fn with_boost(mut self, boost: u32) -> Self {
        self.boost = Some(boost);
        self
    }

    /// Mark as not analyzed.
    pub fn not_analyzed(mut self) -> Self {
        self.index = Some("not_analyzed".to_string());
        self
    }

    /// Set the analyzer.
    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    /// Set the date format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Whether this is a multi-field.
    pub fn is_multi_field(&self) -> bool {
        self.field_type == FieldType::MultiField
    }

    /// Type of the value stored under `key`: the main sub-field's type for
    /// multi-fields, the field's own type otherwise.
    pub fn value_type(&self, key: &str) -> FieldType {
        match self.field_type {
            FieldType::MultiField => self
                .fields
                .get(key)
                .map(|f| f.field_type)
                .unwrap_or(FieldType::String),
            other => other,
        }
    }
}

/// Field name → mapping of the product document type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexProperties(BTreeMap<String, FieldMapping>);

impl IndexProperties {
    /// Empty properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping of a field.
    pub fn get(&self, field: &str) -> Option<&FieldMapping> {
        self.0.get(field)
    }

    /// Whether a field is mapped.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, field: impl Into<String>, mapping: FieldMapping) {
        self.0.insert(field.into(), mapping);
    }

    /// Insert a field only if it is not mapped yet.
    pub fn insert_if_absent(&mut self, field: impl Into<String>, mapping: FieldMapping) {
        self.0.entry(field.into()).or_insert(mapping);
    }

    /// Iterate in field name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldMapping)> {
        self.0.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no field is mapped.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Analysis settings
// ============================================================================

/// A custom analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analyzer {
    /// `custom` for stemming analyzers.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Tokenizer name.
    pub tokenizer: String,
    /// Token filter chain.
    pub filter: Vec<String>,
}

impl Analyzer {
    fn standard(filters: &[&str]) -> Self {
        Self {
            kind: None,
            tokenizer: "standard".to_string(),
            filter: filters.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Token filter definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TokenFilter {
    /// Word n-grams.
    #[serde(rename = "shingle")]
    Shingle {
        /// Largest shingle.
        max_shingle_size: u32,
        /// Also emit single words.
        output_unigrams: bool,
    },
    /// Regex replacement.
    #[serde(rename = "pattern_replace")]
    PatternReplace {
        /// Pattern.
        pattern: String,
        /// Replacement.
        replacement: String,
    },
    /// Prefix or suffix n-grams.
    #[serde(rename = "edgeNGram")]
    EdgeNGram {
        /// Shortest gram.
        min_gram: u32,
        /// Longest gram.
        max_gram: u32,
        /// `front` or `back`.
        side: String,
    },
    /// Drop short tokens.
    #[serde(rename = "length")]
    Length {
        /// Minimum token length.
        min: u32,
    },
    /// Language stemmer.
    #[serde(rename = "snowball")]
    Snowball {
        /// Stemmer language.
        language: String,
    },
}

/// Analyzers and token filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Analyzers by name.
    pub analyzer: BTreeMap<String, Analyzer>,
    /// Token filters by name.
    pub filter: BTreeMap<String, TokenFilter>,
}

/// Index settings sent on create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Replica count.
    pub number_of_replicas: u32,
    /// Shard count, only sent on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_shards: Option<u32>,
    /// Analysis chain.
    pub analysis: Analysis,
}

impl IndexSettings {
    /// Name of the stemming analyzer of a language.
    pub fn language_analyzer(language: &str) -> String {
        format!("analyzer_{language}")
    }

    /// Whether an analyzer exists.
    pub fn has_analyzer(&self, name: &str) -> bool {
        self.analysis.analyzer.contains_key(name)
    }

    /// Analyzer names.
    pub fn analyzer_names(&self) -> impl Iterator<Item = &str> {
        self.analysis.analyzer.keys().map(String::as_str)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds index settings and properties.
pub struct SchemaBuilder<'a> {
    config: &'a EngineConfig,
    namer: &'a FieldNamer,
}

impl<'a> SchemaBuilder<'a> {
    /// Create a builder.
    pub fn new(config: &'a EngineConfig, namer: &'a FieldNamer) -> Self {
        Self { config, namer }
    }

    /// Analysis settings for the given stores.
    pub fn index_settings(&self, stores: &[StoreLocale]) -> IndexSettings {
        let mut analysis = Analysis::default();

        let analyzers = [
            ("whitespace", Analyzer::standard(&["lowercase"])),
            (
                "edge_ngram_front",
                Analyzer::standard(&["length", "edge_ngram_front", "lowercase"]),
            ),
            (
                "edge_ngram_back",
                Analyzer::standard(&["length", "edge_ngram_back", "lowercase"]),
            ),
            ("shingle", Analyzer::standard(&["shingle", "length", "lowercase"])),
            (
                "shingle_strip_ws",
                Analyzer::standard(&["shingle", "strip_whitespaces", "length", "lowercase"]),
            ),
            (
                "shingle_strip_apos_and_ws",
                Analyzer::standard(&[
                    "shingle",
                    "strip_apostrophes",
                    "strip_whitespaces",
                    "length",
                    "lowercase",
                ]),
            ),
        ];
        for (name, analyzer) in analyzers {
            analysis.analyzer.insert(name.to_string(), analyzer);
        }

        let filters = [
            (
                "shingle",
                TokenFilter::Shingle {
                    max_shingle_size: 20,
                    output_unigrams: true,
                },
            ),
            (
                "strip_whitespaces",
                TokenFilter::PatternReplace {
                    pattern: r"\s".to_string(),
                    replacement: String::new(),
                },
            ),
            (
                "strip_apostrophes",
                TokenFilter::PatternReplace {
                    pattern: "'".to_string(),
                    replacement: String::new(),
                },
            ),
            ("edge_ngram_front", edge_ngram("front")),
            ("edge_ngram_back", edge_ngram("back")),
            ("length", TokenFilter::Length { min: 2 }),
        ];
        for (name, filter) in filters {
            analysis.filter.insert(name.to_string(), filter);
        }

        for store in stores {
            let Some(language) = self.namer.languages().language_of(&store.locale_code) else {
                continue;
            };
            let Some(stemmer) = LanguageTable::stemmer_language(language) else {
                log::debug!("No stemmer for language '{language}', skipping analyzer");
                continue;
            };
            let snowball = format!("snowball_{language}");
            analysis.analyzer.insert(
                IndexSettings::language_analyzer(language),
                Analyzer {
                    kind: Some("custom".to_string()),
                    tokenizer: "standard".to_string(),
                    filter: vec!["length".to_string(), "lowercase".to_string(), snowball.clone()],
                },
            );
            analysis.filter.insert(
                snowball,
                TokenFilter::Snowball {
                    language: stemmer.to_string(),
                },
            );
        }

        if self.config.enable_icu_folding {
            for analyzer in analysis.analyzer.values_mut() {
                analyzer.filter.insert(0, "icu_folding".to_string());
            }
        }

        IndexSettings {
            number_of_replicas: self.config.number_of_replicas,
            number_of_shards: None,
            analysis,
        }
    }

    /// Field type of an attribute's value.
    pub fn attribute_type(attribute: &Attribute) -> FieldType {
        if attribute.backend_type == BackendType::Decimal {
            FieldType::Double
        } else if attribute.source == AttributeSource::Boolean {
            FieldType::Boolean
        } else if attribute.backend_type == BackendType::Datetime {
            FieldType::Date
        } else if attribute.uses_source() || attribute.validates_digits() {
            FieldType::Integer
        } else {
            FieldType::String
        }
    }

    /// Index properties for the given stores.
    pub fn build(&self, stores: &[StoreLocale]) -> IndexProperties {
        let settings = self.index_settings(stores);
        let catalog = self.namer.catalog();
        let mut properties = IndexProperties::new();

        // Localized varchar/int attributes
        for attribute in catalog.by_backend_types(&[BackendType::Varchar, BackendType::Int]) {
            if !attribute.is_indexable() {
                continue;
            }
            for store in stores {
                let key = self.namer.field_name(attribute, Some(&store.locale_code));
                let field_type = Self::attribute_type(attribute);
                let mapping = if field_type != FieldType::String {
                    FieldMapping::of(field_type)
                } else {
                    let mut multi = FieldMapping::of(FieldType::MultiField);
                    multi.fields.insert(
                        key.clone(),
                        FieldMapping::of(FieldType::String).with_boost(attribute.boost()),
                    );
                    multi.fields.insert(
                        UNTOUCHED.to_string(),
                        FieldMapping::of(FieldType::String).not_analyzed(),
                    );
                    for analyzer in settings.analyzer_names() {
                        multi.fields.insert(
                            analyzer.to_string(),
                            FieldMapping::of(FieldType::String)
                                .with_analyzer(analyzer)
                                .with_boost(attribute.search_weight),
                        );
                    }
                    multi
                };
                properties.insert(key, mapping);
            }
        }

        // Long text, analyzed with the store language's stemmer
        for attribute in catalog.by_backend_types(&[BackendType::Text]) {
            for store in stores {
                let key = self.namer.field_name(attribute, Some(&store.locale_code));
                let mut mapping = FieldMapping::of(FieldType::String).with_boost(attribute.boost());
                if let Some(language) = self.namer.languages().language_of(&store.locale_code) {
                    let analyzer = IndexSettings::language_analyzer(language);
                    if settings.has_analyzer(&analyzer) {
                        mapping = mapping.with_analyzer(analyzer);
                    }
                }
                properties.insert(key, mapping);
            }
        }

        // Unlocalized attributes, first writer wins
        for attribute in catalog.by_backend_types(&[
            BackendType::Static,
            BackendType::Varchar,
            BackendType::Decimal,
            BackendType::Datetime,
        ]) {
            if !attribute.is_indexable() {
                continue;
            }
            let key = self.namer.field_name(attribute, None);
            let mut mapping =
                FieldMapping::of(Self::attribute_type(attribute)).with_boost(attribute.boost());
            if attribute.backend_type == BackendType::Datetime {
                mapping = mapping.with_format(DATE_FORMAT);
            }
            properties.insert_if_absent(key, mapping);
        }

        // Sort fields
        for attribute in catalog.sortable() {
            let mapping = match attribute.backend_type {
                BackendType::Decimal => FieldMapping::of(FieldType::Double),
                BackendType::Datetime => FieldMapping::of(FieldType::Date).with_format(DATE_FORMAT),
                _ => FieldMapping::of(FieldType::String),
            }
            .not_analyzed();
            for store in stores {
                let key = self.namer.sort_field_name(attribute, Some(&store.locale_code));
                properties.insert_if_absent(key, mapping.clone());
            }
        }

        properties.insert("visibility", FieldMapping::of(FieldType::Integer));
        properties.insert("store_id", FieldMapping::of(FieldType::Integer));
        properties.insert("in_stock", FieldMapping::of(FieldType::Boolean));

        log::debug!("Built index schema with {} fields", properties.len());
        properties
    }
}

fn edge_ngram(side: &str) -> TokenFilter {
    TokenFilter::EdgeNGram {
        min_gram: 3,
        max_gram: 10,
        side: side.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
