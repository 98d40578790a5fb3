//! Search response decoding.
//!
//! The index service answers with hits, a total count and a `facets` object
//! whose entries are tagged by `_type`. [`SearchResult::decode`] flattens it:
//!
//! - `terms` facets become ordered `(term, count)` buckets
//! - `range` facets become buckets keyed by the `[from TO to]` label
//! - `query` facets named `field:value` are grouped under `field`
//! - `statistical` facets become [`FieldStats`]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// One matched document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Entity id.
    pub id: u64,
    /// Document id in the index (`<entity id>|<store id>`).
    pub unique_key: String,
    /// Relevance score, when computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Returned field values.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// A facet bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetBucket {
    /// Term, range label or query value.
    pub key: String,
    /// Number of matching documents.
    pub count: u64,
}

/// Buckets of one facet, in response order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetCounts(Vec<FacetBucket>);

impl FacetCounts {
    /// Build from `(key, count)` pairs.
    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, u64)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(key, count)| FacetBucket {
                    key: key.into(),
                    count,
                })
                .collect(),
        )
    }

    /// Count of a bucket, if present.
    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.iter().find(|b| b.key == key).map(|b| b.count)
    }

    /// Add a bucket, summing with an existing one of the same key.
    pub fn add(&mut self, key: impl Into<String>, count: u64) {
        let key = key.into();
        match self.0.iter_mut().find(|b| b.key == key) {
            Some(bucket) => bucket.count += count,
            None => self.0.push(FacetBucket { key, count }),
        }
    }

    /// Iterate over buckets.
    pub fn iter(&self) -> impl Iterator<Item = &FacetBucket> {
        self.0.iter()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.0.iter().map(|b| b.count).sum()
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there is no bucket.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Numeric statistics of a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    /// Number of values.
    #[serde(default)]
    pub count: u64,
    /// Smallest value.
    #[serde(default)]
    pub min: Option<f64>,
    /// Largest value.
    #[serde(default)]
    pub max: Option<f64>,
    /// Mean value.
    #[serde(default)]
    pub mean: Option<f64>,
    /// Sum of values.
    #[serde(default)]
    pub total: Option<f64>,
}

/// Decoded search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matched documents, in rank order.
    pub ids: Vec<Hit>,
    /// Total number of matches.
    pub total_count: u64,
    /// Facet buckets by field.
    pub facets: BTreeMap<String, FacetCounts>,
    /// Statistics by field.
    pub stats: BTreeMap<String, FieldStats>,
}

impl SearchResult {
    /// The empty result, returned for failures and absent indexes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether nothing matched and nothing was aggregated.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.total_count == 0 && self.facets.is_empty() && self.stats.is_empty()
    }

    /// Entity ids in rank order.
    pub fn entity_ids(&self) -> Vec<u64> {
        self.ids.iter().map(|h| h.id).collect()
    }

    /// Decode a raw response body.
    pub fn decode(raw: &Value) -> Result<Self> {
        let hits = raw
            .get("hits")
            .ok_or_else(|| Error::malformed("response has no 'hits' section"))?;

        let total_count = match hits.get("total") {
            Some(Value::Number(n)) => n.as_u64().unwrap_or_default(),
            Some(Value::Object(o)) => o.get("value").and_then(Value::as_u64).unwrap_or_default(),
            _ => 0,
        };

        let ids = hits
            .get("hits")
            .and_then(Value::as_array)
            .map(|hits| hits.iter().filter_map(decode_hit).collect())
            .unwrap_or_default();

        let mut result = Self {
            ids,
            total_count,
            ..Self::default()
        };

        if let Some(facets) = raw.get("facets").and_then(Value::as_object) {
            for (name, facet) in facets {
                result.decode_facet(name, facet);
            }
        }

        Ok(result)
    }

    fn decode_facet(&mut self, name: &str, facet: &Value) {
        match facet.get("_type").and_then(Value::as_str) {
            Some("terms") => {
                let counts = self.facets.entry(name.to_string()).or_default();
                for term in facet.get("terms").and_then(Value::as_array).into_iter().flatten() {
                    if let Some(key) = term.get("term").and_then(term_key) {
                        counts.add(key, count_of(term));
                    }
                }
            }
            Some("range") => {
                let counts = self.facets.entry(name.to_string()).or_default();
                for range in facet.get("ranges").and_then(Value::as_array).into_iter().flatten() {
                    let label = range_label(
                        range.get("from").and_then(Value::as_f64),
                        range.get("to").and_then(Value::as_f64),
                    );
                    counts.add(label, count_of(range));
                }
            }
            Some("query") => {
                let count = count_of(facet);
                let (field, value) = name.split_once(':').unwrap_or((name, name));
                self.facets
                    .entry(field.to_string())
                    .or_default()
                    .add(value, count);
            }
            Some("statistical") => {
                let stats = serde_json::from_value::<FieldStats>(facet.clone()).unwrap_or_default();
                self.stats.insert(name.to_string(), stats);
            }
            other => {
                log::debug!("Ignoring facet '{name}' of unsupported type {other:?}");
            }
        }
    }
}

/// Projection of a search result to ids, total and facets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdsResult {
    /// Entity ids in rank order.
    pub ids: Vec<u64>,
    /// Total number of matches.
    pub total_count: u64,
    /// Facet buckets by field.
    pub faceted_data: BTreeMap<String, FacetCounts>,
}

impl From<SearchResult> for IdsResult {
    fn from(result: SearchResult) -> Self {
        Self {
            ids: result.entity_ids(),
            total_count: result.total_count,
            faceted_data: result.facets,
        }
    }
}

/// Label of a range bucket: `[from TO to]`, an open bound renders empty.
///
/// ```
/// use vitrine_search::response::range_label;
///
/// assert_eq!(range_label(None, Some(25.0)), "[ TO 25]");
/// assert_eq!(range_label(Some(25.0), Some(50.5)), "[25 TO 50.5]");
/// assert_eq!(range_label(Some(75.0), None), "[75 TO ]");
/// ```
pub fn range_label(from: Option<f64>, to: Option<f64>) -> String {
    format!("[{} TO {}]", format_bound(from), format_bound(to))
}

/// Parse a `[from TO to]` label back into its bounds.
pub fn parse_range_label(label: &str) -> Option<(Option<f64>, Option<f64>)> {
    let inner = label.trim().strip_prefix('[')?.strip_suffix(']')?;
    let (from, to) = inner.split_once("TO")?;
    let bound = |s: &str| -> Option<Option<f64>> {
        match s.trim() {
            "" | "*" => Some(None),
            v => v.parse().ok().map(Some),
        }
    };
    Some((bound(from)?, bound(to)?))
}

/// Render a number without a fractional part when it is integral.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn format_bound(bound: Option<f64>) -> String {
    bound.map(format_number).unwrap_or_default()
}

fn count_of(value: &Value) -> u64 {
    value.get("count").and_then(Value::as_u64).unwrap_or_default()
}

fn term_key(term: &Value) -> Option<String> {
    match term {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn decode_hit(hit: &Value) -> Option<Hit> {
    let unique_key = hit.get("_id").and_then(Value::as_str).unwrap_or_default().to_string();

    let mut fields = Map::new();
    for section in ["_source", "fields"] {
        if let Some(values) = hit.get(section).and_then(Value::as_object) {
            for (key, value) in values {
                fields.insert(key.clone(), unwrap_single(value));
            }
        }
    }

    let id = fields
        .get("id")
        .and_then(entity_id)
        .or_else(|| unique_key.split('|').next().and_then(|id| id.parse().ok()));
    let Some(id) = id else {
        log::warn!("Skipping hit without entity id: {hit}");
        return None;
    };

    Some(Hit {
        id,
        unique_key,
        score: hit.get("_score").and_then(Value::as_f64),
        fields,
    })
}

fn entity_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Requested stored fields come back as one-element arrays.
fn unwrap_single(value: &Value) -> Value {
    match value {
        Value::Array(items) if items.len() == 1 => items[0].clone(),
        other => other.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response() -> Value {
        json!({
            "hits": {
                "total": 3,
                "hits": [
                    {"_id": "12|1", "_score": 2.5, "fields": {"id": [12]}},
                    {"_id": "7|1", "_score": 1.0, "_source": {"id": 7, "sku": "abc"}},
                    {"_id": "9|1"}
                ]
            },
            "facets": {
                "color_en": {
                    "_type": "terms",
                    "terms": [{"term": "red", "count": 4}, {"term": "blue", "count": 0}]
                },
                "in_stock": {
                    "_type": "terms",
                    "terms": [{"term": "T", "count": 2}, {"term": 1, "count": 3}]
                },
                "price": {
                    "_type": "range",
                    "ranges": [
                        {"to": 25.0, "count": 1},
                        {"from": 25.0, "to": 50.0, "count": 0},
                        {"from": 50.0, "count": 2}
                    ]
                },
                "categories:3": {"_type": "query", "count": 5},
                "categories:4": {"_type": "query", "count": 0},
                "price_0_1": {
                    "_type": "statistical",
                    "count": 3, "min": 5.0, "max": 99.5, "mean": 40.0, "total": 120.0
                }
            }
        })
    }

    #[test]
    fn test_decode_hits() {
        let result = SearchResult::decode(&response()).unwrap();
        assert_eq!(result.total_count, 3);
        assert_eq!(result.entity_ids(), vec![12, 7, 9]);
        assert_eq!(result.ids[0].score, Some(2.5));
        assert_eq!(result.ids[1].fields["sku"], json!("abc"));
        assert_eq!(result.ids[0].fields["id"], json!(12));
    }

    #[test]
    fn test_decode_facets() {
        let result = SearchResult::decode(&response()).unwrap();
        let color = &result.facets["color_en"];
        assert_eq!(color.get("red"), Some(4));
        assert_eq!(color.get("blue"), Some(0));

        let stock = &result.facets["in_stock"];
        assert_eq!(stock.get("T"), Some(2));
        assert_eq!(stock.get("1"), Some(3));

        let price: Vec<_> = result.facets["price"].iter().map(|b| b.key.as_str()).collect();
        assert_eq!(price, vec!["[ TO 25]", "[25 TO 50]", "[50 TO ]"]);

        let categories = &result.facets["categories"];
        assert_eq!(categories.get("3"), Some(5));
        assert_eq!(categories.get("4"), Some(0));

        let stats = result.stats["price_0_1"];
        assert_eq!(stats.max, Some(99.5));
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn test_missing_hits_is_malformed() {
        let err = SearchResult::decode(&json!({"error": "boom"})).unwrap_err();
        assert!(err.to_string().contains("hits"));
    }

    #[test]
    fn test_ids_projection() {
        let ids: IdsResult = SearchResult::decode(&response()).unwrap().into();
        assert_eq!(ids.ids, vec![12, 7, 9]);
        assert_eq!(ids.total_count, 3);
        assert!(ids.faceted_data.contains_key("color_en"));
    }

    #[test]
    fn test_range_label_round_trip() {
        assert_eq!(parse_range_label("[ TO 25]"), Some((None, Some(25.0))));
        assert_eq!(parse_range_label("[25 TO 50.5]"), Some((Some(25.0), Some(50.5))));
        assert_eq!(parse_range_label("[* TO *]"), Some((None, None)));
        assert_eq!(parse_range_label("garbage"), None);
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(0.01), "0.01");
    }
}
