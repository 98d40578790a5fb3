//! Index documents.
//!
//! Raw per-product data arrives keyed by attribute code. [`DocumentPreparer`]
//! turns it into a flat document keyed by index field names, one per
//! (product, store). [`AdvancedIndex`] joins the computed side data
//! (category membership, positions, per-group prices) in beforehand.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::attribute::BackendType;
use crate::naming::{ADVANCED_PREFIX, FieldNamer, strip_advanced_prefix};

/// Raw attribute values of one product, keyed by attribute code.
pub type RawAttributes = Map<String, Value>;

/// Field holding `<entity id>|<store id>`.
pub const UNIQUE_KEY: &str = "unique";

/// Keys copied into documents without renaming.
pub const USED_FIELDS: &[&str] = &[
    UNIQUE_KEY,
    "id",
    "sku",
    "price",
    "store_id",
    "categories",
    "show_in_categories",
    "visibility",
    "in_stock",
    "score",
];

/// Raw key of option labels, consumed by options search and never indexed.
pub const OPTIONS_KEY: &str = "options";

/// A document ready to be sent to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// `<entity id>|<store id>`, used as the document id.
    pub unique_key: String,
    /// Entity id.
    pub id: u64,
    /// Field values, including `unique` and `id`.
    pub fields: Map<String, Value>,
}

impl Document {
    /// Build the unique key of a product in a store.
    pub fn unique_key_for(entity_id: u64, store_id: u32) -> String {
        format!("{entity_id}|{store_id}")
    }

    /// Whether the document carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Normalize a date value to `YYYY-MM-DD`.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, ISO-8601 date-times and
/// `MM/DD/YYYY`. Empty strings become `null`; unparsable values are kept.
pub fn normalize_date(value: &Value) -> Value {
    match value {
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::String(s) => match parse_date(s.trim()) {
            Some(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            None => {
                log::debug!("Keeping unparsable date value '{s}'");
                value.clone()
            }
        },
        Value::Array(values) => Value::Array(values.iter().map(normalize_date).collect()),
        other => other.clone(),
    }
}

pub(crate) fn parse_date(input: &str) -> Option<NaiveDate> {
    const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

    DATE_TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(input, f).ok().map(|dt| dt.date()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(input, f).ok())
        })
}

/// Turns raw product data into index documents.
pub struct DocumentPreparer<'a> {
    namer: &'a FieldNamer,
}

impl<'a> DocumentPreparer<'a> {
    /// Create a preparer.
    pub fn new(namer: &'a FieldNamer) -> Self {
        Self { namer }
    }

    /// Prepare the document of one product in one store.
    ///
    /// Empty input yields a document without fields.
    pub fn prepare(
        &self,
        entity_id: u64,
        raw: &RawAttributes,
        store_id: u32,
        locale_code: Option<&str>,
    ) -> Document {
        let unique_key = Document::unique_key_for(entity_id, store_id);
        if raw.is_empty() {
            return Document {
                unique_key,
                id: entity_id,
                fields: Map::new(),
            };
        }

        let mut fields = Map::new();
        fields.insert(UNIQUE_KEY.to_string(), Value::String(unique_key.clone()));
        fields.insert("id".to_string(), Value::from(entity_id));
        fields.insert("store_id".to_string(), Value::from(store_id));

        for (key, value) in raw {
            if USED_FIELDS.contains(&key.as_str()) {
                fields.entry(key.clone()).or_insert_with(|| value.clone());
                continue;
            }
            if key == OPTIONS_KEY {
                continue;
            }

            let value = match self.namer.catalog().get(key) {
                Some(attribute) if attribute.backend_type == BackendType::Datetime => {
                    normalize_date(value)
                }
                _ => value.clone(),
            };
            let field = self.namer.field_name(key, locale_code);
            fields.insert(strip_advanced_prefix(&field).to_string(), value);
        }

        Document {
            unique_key,
            id: entity_id,
            fields,
        }
    }

    /// Prepare the documents of many products in one store.
    pub fn prepare_all(
        &self,
        indexes: &BTreeMap<u64, RawAttributes>,
        store_id: u32,
        locale_code: Option<&str>,
    ) -> Vec<Document> {
        indexes
            .iter()
            .map(|(id, raw)| self.prepare(*id, raw, store_id, locale_code))
            .filter(|doc| !doc.is_empty())
            .collect()
    }
}

// ============================================================================
// Advanced index
// ============================================================================

/// Category side data of one product in one store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryData {
    /// Categories the product is directly assigned to.
    pub categories: Vec<u64>,
    /// Anchor categories the product shows up in.
    pub show_in_categories: Vec<u64>,
    /// Position of the product per category.
    pub positions: BTreeMap<u64, i64>,
    /// Visibility id.
    pub visibility: u32,
}

/// Minimal price of a product for a customer group on a website.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceData {
    /// Customer group id.
    pub customer_group_id: u32,
    /// Website id.
    pub website_id: u32,
    /// Minimal price.
    pub min_price: f64,
}

/// Name of the price field of a customer group on a website.
pub fn price_field(customer_group_id: u32, website_id: u32) -> String {
    format!("price_{customer_group_id}_{website_id}")
}

/// Computed side data joined into raw index data by entity id.
#[derive(Debug, Clone, Default)]
pub struct AdvancedIndex {
    categories: HashMap<u64, CategoryData>,
    prices: HashMap<u64, Vec<PriceData>>,
}

impl AdvancedIndex {
    /// Create from category and price data keyed by entity id.
    pub fn new(
        categories: HashMap<u64, CategoryData>,
        prices: HashMap<u64, Vec<PriceData>>,
    ) -> Self {
        Self { categories, prices }
    }

    /// Merge the side data into `index`.
    ///
    /// Products lacking either kind of data get empty category lists and a
    /// zero visibility, so every document carries the same fields. Keys
    /// already present in the raw data are never overwritten.
    pub fn merge(&self, index: &mut BTreeMap<u64, RawAttributes>) {
        for (product_id, data) in index.iter_mut() {
            match (self.categories.get(product_id), self.prices.get(product_id)) {
                (Some(category), Some(prices)) => {
                    put(data, "categories", ids_value(&category.categories));
                    put(data, "show_in_categories", ids_value(&category.show_in_categories));
                    for (category_id, position) in &category.positions {
                        put(
                            data,
                            &format!("position_category_{category_id}"),
                            Value::from(*position),
                        );
                    }
                    put(data, "visibility", Value::from(category.visibility));
                    for price in prices {
                        put(
                            data,
                            &price_field(price.customer_group_id, price.website_id),
                            Value::from(round2(price.min_price)),
                        );
                    }
                }
                _ => {
                    put(data, "categories", Value::Array(Vec::new()));
                    put(data, "show_in_categories", Value::Array(Vec::new()));
                    put(data, "visibility", Value::from(0));
                }
            }
        }
    }
}

fn put(data: &mut RawAttributes, key: &str, value: Value) {
    data.entry(format!("{ADVANCED_PREFIX}{key}")).or_insert(value);
}

fn ids_value(ids: &[u64]) -> Value {
    Value::Array(ids.iter().map(|id| Value::from(*id)).collect())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, AttributeCatalog};
    use crate::locale::LanguageTable;
    use serde_json::json;
    use std::sync::Arc;

    fn namer() -> FieldNamer {
        let catalog = AttributeCatalog::from_attributes(vec![
            Attribute::new(92, "color", BackendType::Varchar),
            Attribute::new(80, "news_from_date", BackendType::Datetime).searchable(),
            Attribute::new(81, "weight", BackendType::Decimal),
        ]);
        FieldNamer::new(Arc::new(catalog), Arc::new(LanguageTable::default()))
    }

    fn raw(value: Value) -> RawAttributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_prepare_renames_and_keys() {
        let namer = namer();
        let doc = DocumentPreparer::new(&namer).prepare(
            42,
            &raw(json!({
                "sku": "ABC",
                "color": "Red",
                "weight": 1.5,
                "options": "Red Blue",
                "#categories": [3, 4],
            })),
            1,
            Some("fr_FR"),
        );

        assert_eq!(doc.unique_key, "42|1");
        assert_eq!(doc.fields[UNIQUE_KEY], json!("42|1"));
        assert_eq!(doc.fields["id"], json!(42));
        assert_eq!(doc.fields["store_id"], json!(1));
        assert_eq!(doc.fields["sku"], json!("ABC"));
        assert_eq!(doc.fields["color_fr"], json!("Red"));
        assert_eq!(doc.fields["weight"], json!(1.5));
        assert_eq!(doc.fields["categories"], json!([3, 4]));
        assert!(!doc.fields.contains_key("color"));
        assert!(!doc.fields.contains_key(OPTIONS_KEY));
    }

    #[test]
    fn test_prepare_empty_input() {
        let namer = namer();
        let doc = DocumentPreparer::new(&namer).prepare(7, &RawAttributes::new(), 2, None);
        assert!(doc.is_empty());
        assert_eq!(doc.unique_key, "7|2");
    }

    #[test]
    fn test_dates_are_normalized() {
        let namer = namer();
        let doc = DocumentPreparer::new(&namer).prepare(
            1,
            &raw(json!({"news_from_date": "2024-03-09 00:00:00"})),
            1,
            None,
        );
        assert_eq!(doc.fields["news_from_date"], json!("2024-03-09"));

        assert_eq!(normalize_date(&json!("03/09/2024")), json!("2024-03-09"));
        assert_eq!(normalize_date(&json!("")), Value::Null);
        assert_eq!(normalize_date(&json!("soon")), json!("soon"));
    }

    #[test]
    fn test_prepare_all_skips_empty() {
        let namer = namer();
        let mut indexes = BTreeMap::new();
        indexes.insert(1, raw(json!({"sku": "A"})));
        indexes.insert(2, RawAttributes::new());
        let docs = DocumentPreparer::new(&namer).prepare_all(&indexes, 1, None);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, 1);
    }

    #[test]
    fn test_advanced_index_merge() {
        let mut categories = HashMap::new();
        categories.insert(
            1,
            CategoryData {
                categories: vec![3],
                show_in_categories: vec![2],
                positions: BTreeMap::from([(3, 10)]),
                visibility: 4,
            },
        );
        let mut prices = HashMap::new();
        prices.insert(
            1,
            vec![PriceData {
                customer_group_id: 0,
                website_id: 1,
                min_price: 19.999,
            }],
        );
        let advanced = AdvancedIndex::new(categories, prices);

        let mut index = BTreeMap::new();
        index.insert(1, raw(json!({"sku": "A"})));
        index.insert(2, raw(json!({"sku": "B"})));
        advanced.merge(&mut index);

        let first = &index[&1];
        assert_eq!(first["#categories"], json!([3]));
        assert_eq!(first["#show_in_categories"], json!([2]));
        assert_eq!(first["#position_category_3"], json!(10));
        assert_eq!(first["#visibility"], json!(4));
        assert_eq!(first["#price_0_1"], json!(20.0));

        let second = &index[&2];
        assert_eq!(second["#categories"], json!([]));
        assert_eq!(second["#show_in_categories"], json!([]));
        assert_eq!(second["#visibility"], json!(0));
    }

    #[test]
    fn test_merged_data_prepares_into_plain_fields() {
        let namer = namer();
        let mut index = BTreeMap::new();
        index.insert(5, raw(json!({"sku": "A"})));
        AdvancedIndex::default().merge(&mut index);

        let doc = DocumentPreparer::new(&namer).prepare(5, &index[&5], 1, None);
        assert_eq!(doc.fields["categories"], json!([]));
        assert_eq!(doc.fields["visibility"], json!(0));
    }
}
