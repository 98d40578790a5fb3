//! Query parameters and query compilation.
//!
//! [`QueryParams`] is the structured description of one search: paging,
//! sort, constraints, range filters, facet and stats requests.
//! [`QueryCompiler`] turns a query text plus parameters into the request body
//! of the index service.
//!
//! # Compiled shape
//!
//! ```text
//! { "query": { "filtered": { "query": <base>, "filter": <filter> } },
//!   "from": .., "size": .., "facets": {..}, "sort": [..] }
//! ```
//!
//! The base query is `match_all` for an empty text, otherwise a `bool` with
//! `should` clauses: an optional `fuzzy_like_this` and a field-scoped
//! `query_string`. The filter is the constraint expression as a
//! `query_string` filter, AND-ed with one `range` filter per field.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use vitrine_core::EngineConfig;

use crate::schema::{FieldType, IndexProperties, UNTOUCHED};
use crate::naming::SORT_PREFIX;

/// Hard cap on `offset + limit`.
pub const DEFAULT_ROWS_LIMIT: usize = 9999;

/// Page size when none is given.
pub const DEFAULT_LIMIT: usize = 100;

/// Virtual field holding option labels.
pub const OPTIONS_FIELD: &str = "_options";

// ============================================================================
// Parameters
// ============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl SortDirection {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One sort criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Field name; `relevance` and `score` sort by relevance.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

impl SortField {
    /// Create a sort criterion.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Sort by relevance, best first.
    pub fn relevance() -> Self {
        Self::new("relevance", SortDirection::Desc)
    }
}

/// Numeric interval, used for range filters and range facet buckets.
///
/// A missing bound is open. The lower bound is inclusive, the upper bound
/// is inclusive only when `include_upper` is set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Interval {
    /// Lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    /// Upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
    /// Whether `to` itself is included.
    #[serde(default)]
    pub include_upper: bool,
}

impl Interval {
    /// Create an interval.
    pub fn new(from: Option<f64>, to: Option<f64>, include_upper: bool) -> Self {
        Self {
            from,
            to,
            include_upper,
        }
    }

    /// Whether `value` falls into the interval.
    pub fn contains(&self, value: f64) -> bool {
        let above = self.from.is_none_or(|from| value >= from);
        let below = match self.to {
            None => true,
            Some(to) if self.include_upper => value <= to,
            Some(to) => value < to,
        };
        above && below
    }
}

/// Value of a field constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Any of these terms.
    Terms(Vec<String>),
    /// Bounded range; empty bounds are open.
    Range {
        /// Lower bound.
        from: Option<String>,
        /// Upper bound.
        to: Option<String>,
    },
}

impl FilterValue {
    /// A single term.
    pub fn term(value: impl Into<String>) -> Self {
        Self::Terms(vec![value.into()])
    }
}

/// A `{field: value}` constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParam {
    /// Index field.
    pub field: String,
    /// Constraint value.
    pub value: FilterValue,
}

impl SearchParam {
    /// Create a constraint.
    pub fn new(field: impl Into<String>, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }

    /// Whether the constraint matches nothing to filter on.
    pub fn is_empty(&self) -> bool {
        matches!(&self.value, FilterValue::Terms(terms) if terms.is_empty())
    }

    /// Render as a query-string clause. An empty term list constrains nothing
    /// and renders as `*`.
    pub fn to_query_string(&self) -> String {
        match &self.value {
            FilterValue::Terms(terms) if terms.is_empty() => "*".to_string(),
            FilterValue::Terms(terms) => {
                let clauses: Vec<String> = terms
                    .iter()
                    .map(|t| format!("{}:\"{}\"", self.field, escape_phrase(t)))
                    .collect();
                if clauses.len() == 1 {
                    clauses.concat()
                } else {
                    format!("({})", clauses.join(" OR "))
                }
            }
            FilterValue::Range { from, to } => {
                let bound = |b: &Option<String>| match b.as_deref() {
                    Some(v) if !v.is_empty() => escape_phrase(v),
                    _ => "*".to_string(),
                };
                format!("{}:[{} TO {}]", self.field, bound(from), bound(to))
            }
        }
    }
}

fn escape_phrase(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Facet requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetRequest {
    /// Term facets.
    #[serde(default)]
    pub fields: BTreeSet<String>,
    /// Range facets with their buckets.
    #[serde(default)]
    pub ranges: BTreeMap<String, Vec<Interval>>,
    /// Query-string facets.
    #[serde(default)]
    pub queries: BTreeSet<String>,
}

impl FacetRequest {
    /// Whether nothing is requested.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.ranges.is_empty() && self.queries.is_empty()
    }
}

/// Structured search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    /// First hit to return.
    pub offset: usize,
    /// Page size.
    pub limit: usize,
    /// Sort criteria, in priority order.
    pub sort: Vec<SortField>,
    /// Store scope.
    pub store_id: Option<u32>,
    /// Locale of the store.
    pub locale_code: Option<String>,
    /// Field constraints, AND-ed.
    pub filters: Vec<SearchParam>,
    /// Range filters by field.
    pub range_filters: BTreeMap<String, Interval>,
    /// Facet requests.
    pub facets: FacetRequest,
    /// Fields to compute statistics for.
    pub stats: BTreeSet<String>,
    /// Stored fields to return (empty: everything).
    pub fields: Vec<String>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            sort: vec![SortField::relevance()],
            store_id: None,
            locale_code: None,
            filters: Vec::new(),
            range_filters: BTreeMap::new(),
            facets: FacetRequest::default(),
            stats: BTreeSet::new(),
            fields: Vec::new(),
        }
    }
}

impl QueryParams {
    /// Parameters scoped to a store.
    pub fn for_store(store_id: u32, locale_code: impl Into<String>) -> Self {
        let mut params = Self {
            store_id: Some(store_id),
            locale_code: Some(locale_code.into()),
            ..Self::default()
        };
        params.add_filter(SearchParam::new(
            "store_id",
            FilterValue::term(store_id.to_string()),
        ));
        params
    }

    /// Clamp paging so that `offset + limit` stays within
    /// [`DEFAULT_ROWS_LIMIT`] and `limit` is positive.
    pub fn normalized(mut self) -> Self {
        self.offset = self.offset.min(DEFAULT_ROWS_LIMIT - 1);
        if self.limit == 0 {
            self.limit = DEFAULT_LIMIT;
        }
        self.limit = self.limit.min(DEFAULT_ROWS_LIMIT - self.offset);
        self
    }

    /// Add a field constraint. Empty term lists are skipped.
    pub fn add_filter(&mut self, param: SearchParam) -> &mut Self {
        if param.is_empty() {
            log::debug!("Skipping empty filter on '{}'", param.field);
            return self;
        }
        self.filters.push(param);
        self
    }

    /// Add or replace the range filter of a field.
    pub fn add_range_filter(&mut self, field: impl Into<String>, interval: Interval) -> &mut Self {
        self.range_filters.insert(field.into(), interval);
        self
    }

    /// Request a term facet.
    pub fn add_facet_field(&mut self, field: impl Into<String>) -> &mut Self {
        self.facets.fields.insert(field.into());
        self
    }

    /// Request a range facet.
    pub fn add_facet_ranges(&mut self, field: impl Into<String>, buckets: Vec<Interval>) -> &mut Self {
        self.facets.ranges.insert(field.into(), buckets);
        self
    }

    /// Request a query facet.
    pub fn add_facet_query(&mut self, query: impl Into<String>) -> &mut Self {
        self.facets.queries.insert(query.into());
        self
    }

    /// Request statistics on a field.
    pub fn add_stats_field(&mut self, field: impl Into<String>) -> &mut Self {
        self.stats.insert(field.into());
        self
    }

    /// Copy without any facet or stats request.
    pub fn without_facets(&self) -> Self {
        Self {
            facets: FacetRequest::default(),
            stats: BTreeSet::new(),
            ..self.clone()
        }
    }

    /// The constraint expression, `*` when unconstrained.
    pub fn filter_expression(&self) -> String {
        if self.filters.is_empty() {
            return "*".to_string();
        }
        self.filters
            .iter()
            .map(SearchParam::to_query_string)
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Whether a range filter is set on `field`.
    pub fn has_range_filter(&self, field: &str) -> bool {
        self.range_filters.contains_key(field)
    }

    /// Stable digest of the whole parameter set.
    pub fn search_params_digest(&self) -> crate::Result<String> {
        Ok(vitrine_core::digest_json(self)?)
    }
}

// ============================================================================
// Query terms
// ============================================================================

/// Shape of a query text, deciding which typed fields it may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    /// `true` or `false`.
    Boolean,
    /// Integer literal.
    Integer,
    /// Decimal literal.
    Float,
    /// Anything else.
    Text,
}

impl TermKind {
    /// Classify a query text.
    ///
    /// ```
    /// use vitrine_search::query::TermKind;
    ///
    /// assert_eq!(TermKind::classify("true"), TermKind::Boolean);
    /// assert_eq!(TermKind::classify("42"), TermKind::Integer);
    /// assert_eq!(TermKind::classify("4.5"), TermKind::Float);
    /// assert_eq!(TermKind::classify("red shoes"), TermKind::Text);
    /// ```
    pub fn classify(text: &str) -> Self {
        let text = text.trim();
        if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false") {
            Self::Boolean
        } else if text.parse::<i64>().is_ok() {
            Self::Integer
        } else if text.contains('.') && text.parse::<f64>().is_ok_and(f64::is_finite) {
            Self::Float
        } else {
            Self::Text
        }
    }

    fn admits(self, field_type: FieldType) -> bool {
        match field_type {
            FieldType::Date => false,
            FieldType::Boolean => self == Self::Boolean,
            FieldType::Integer => self == Self::Integer,
            FieldType::Double => self == Self::Float,
            FieldType::String | FieldType::MultiField => true,
        }
    }
}

/// Fields searched by a fulltext query.
///
/// Date fields never match; boolean, integer and double fields only match a
/// term of the same shape; sort fields are skipped. Outside `only_fuzzy`
/// mode, multi-fields contribute every sub-field except the untouched one.
pub fn search_fields(
    properties: &IndexProperties,
    only_fuzzy: bool,
    term: TermKind,
    options_search: bool,
) -> Vec<String> {
    let mut fields = Vec::new();
    for (key, property) in properties.iter() {
        if !term.admits(property.value_type(key)) {
            continue;
        }
        if !only_fuzzy && property.is_multi_field() {
            fields.extend(
                property
                    .fields
                    .keys()
                    .filter(|sub| sub.as_str() != UNTOUCHED)
                    .map(|sub| format!("{key}.{sub}")),
            );
        } else if !key.starts_with(SORT_PREFIX) {
            fields.push(key.clone());
        }
    }
    if options_search {
        fields.push(OPTIONS_FIELD.to_string());
    }
    fields
}

// ============================================================================
// Compiler
// ============================================================================

/// Compiles queries into request bodies.
pub struct QueryCompiler<'a> {
    config: &'a EngineConfig,
}

impl<'a> QueryCompiler<'a> {
    /// Create a compiler.
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Compile a search request body.
    pub fn compile(&self, query: &str, params: &QueryParams, properties: &IndexProperties) -> Value {
        let params = params.clone().normalized();
        let filtered = json!({
            "filtered": {
                "query": self.base_query(query, properties),
                "filter": Self::filter(&params),
            }
        });

        let mut body = Map::new();
        body.insert("query".to_string(), filtered);
        body.insert("from".to_string(), json!(params.offset));
        body.insert("size".to_string(), json!(params.limit));

        let facets = self.facets(&params, properties);
        if !facets.is_empty() {
            body.insert("facets".to_string(), Value::Object(facets));
        }

        if !params.sort.is_empty() {
            let sort: Vec<Value> = params
                .sort
                .iter()
                .map(|s| {
                    let field = match s.field.as_str() {
                        "relevance" | "score" => "_score",
                        other => other,
                    };
                    json!({ field: { "order": s.direction.as_str() } })
                })
                .collect();
            body.insert("sort".to_string(), Value::Array(sort));
        }

        if !params.fields.is_empty() {
            body.insert("fields".to_string(), json!(params.fields));
        }

        Value::Object(body)
    }

    fn base_query(&self, query: &str, properties: &IndexProperties) -> Value {
        let query = query.trim();
        if query.is_empty() {
            return json!({ "match_all": {} });
        }

        let term = TermKind::classify(query);
        let options_search = self.config.enable_options_search;
        let mut should = Vec::new();

        if self.config.enable_fuzzy_query {
            should.push(json!({
                "fuzzy_like_this": {
                    "fields": search_fields(properties, true, term, options_search),
                    "like_text": query,
                    "min_similarity": self.config.fuzzy_min_similarity(),
                    "prefix_length": self.config.fuzzy_prefix_length,
                    "max_query_terms": self.config.fuzzy_max_query_terms,
                    "boost": self.config.fuzzy_query_boost,
                }
            }));
        }

        should.push(json!({
            "query_string": {
                "query": query,
                "fields": search_fields(properties, false, term, options_search),
            }
        }));

        json!({ "bool": { "should": should } })
    }

    fn filter(params: &QueryParams) -> Value {
        let query_filter = json!({
            "query": { "query_string": { "query": params.filter_expression() } }
        });
        if params.range_filters.is_empty() {
            return query_filter;
        }

        let mut filters = vec![query_filter];
        for (field, interval) in &params.range_filters {
            filters.push(json!({ "range": { field.as_str(): interval } }));
        }
        json!({ "and": filters })
    }

    fn facets(&self, params: &QueryParams, properties: &IndexProperties) -> Map<String, Value> {
        let mut facets = Map::new();

        for query in &params.facets.queries {
            facets.insert(
                query.clone(),
                json!({ "query": { "query_string": { "query": query } } }),
            );
        }

        if !params.stats.is_empty() {
            for field in &params.stats {
                facets.insert(field.clone(), json!({ "statistical": { "field": field } }));
            }
            return facets;
        }

        for field in &params.facets.fields {
            let Some(property) = properties.get(field) else {
                log::debug!("Skipping term facet on unmapped field '{field}'");
                continue;
            };
            let target = if property.is_multi_field() {
                format!("{field}.{UNTOUCHED}")
            } else {
                field.clone()
            };
            facets.insert(
                field.clone(),
                json!({
                    "terms": {
                        "field": target,
                        "all_terms": true,
                        "size": self.config.facets_max_size,
                    }
                }),
            );
        }

        for (field, buckets) in &params.facets.ranges {
            facets.insert(
                field.clone(),
                json!({ "range": { "field": field, "ranges": buckets } }),
            );
        }

        facets
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::schema::FieldMapping;

    fn properties() -> IndexProperties {
        let mut props = IndexProperties::new();
        let mut color = FieldMapping::of(FieldType::MultiField);
        color
            .fields
            .insert("color_en".into(), FieldMapping::of(FieldType::String).with_boost(3));
        color
            .fields
            .insert(UNTOUCHED.into(), FieldMapping::of(FieldType::String).not_analyzed());
        color
            .fields
            .insert("shingle".into(), FieldMapping::of(FieldType::String).with_analyzer("shingle"));
        props.insert("color_en", color);
        props.insert("manufacturer", FieldMapping::of(FieldType::Integer));
        props.insert("price", FieldMapping::of(FieldType::Double));
        props.insert("in_stock", FieldMapping::of(FieldType::Boolean));
        props.insert("news_from_date", FieldMapping::of(FieldType::Date));
        props.insert("sku", FieldMapping::of(FieldType::String));
        props.insert(
            "sort_by_name_en",
            FieldMapping::of(FieldType::String).not_analyzed(),
        );
        props
    }

    #[test]
    fn test_normalized_paging() {
        let params = QueryParams {
            offset: 9990,
            limit: 100,
            ..Default::default()
        }
        .normalized();
        assert_eq!(params.offset + params.limit, DEFAULT_ROWS_LIMIT);

        let zero = QueryParams {
            limit: 0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(zero.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_filter_expression() {
        let mut params = QueryParams::default();
        assert_eq!(params.filter_expression(), "*");

        params.add_filter(SearchParam::new("store_id", FilterValue::term("1")));
        params.add_filter(SearchParam::new(
            "color_en",
            FilterValue::Terms(vec!["Red".into(), "Dark \"Blue\"".into()]),
        ));
        params.add_filter(SearchParam::new(
            "news_from_date",
            FilterValue::Range {
                from: Some("2024-01-01T00:00:00Z".into()),
                to: None,
            },
        ));
        assert_eq!(
            params.filter_expression(),
            "store_id:\"1\" AND (color_en:\"Red\" OR color_en:\"Dark \\\"Blue\\\"\") \
             AND news_from_date:[2024-01-01T00:00:00Z TO *]"
        );
    }

    #[test]
    fn test_empty_terms_constrain_nothing() {
        let empty = SearchParam::new("color_en", FilterValue::Terms(Vec::new()));
        assert!(empty.is_empty());
        assert_eq!(empty.to_query_string(), "*");

        let mut params = QueryParams::default();
        params.add_filter(empty.clone());
        assert!(params.filters.is_empty());
        assert_eq!(params.filter_expression(), "*");

        params.add_filter(SearchParam::new("store_id", FilterValue::term("1")));
        params.filters.push(empty);
        assert_eq!(params.filter_expression(), "store_id:\"1\" AND *");
    }

    #[test]
    fn test_for_store_scopes_query() {
        let params = QueryParams::for_store(2, "fr_FR");
        assert_eq!(params.store_id, Some(2));
        assert_eq!(params.filter_expression(), "store_id:\"2\"");
    }

    #[test]
    fn test_search_fields_for_text() {
        let fields = search_fields(&properties(), false, TermKind::Text, false);
        assert_eq!(fields, vec!["color_en.color_en", "color_en.shingle", "sku"]);

        let fuzzy = search_fields(&properties(), true, TermKind::Text, true);
        assert_eq!(fuzzy, vec!["color_en", "sku", OPTIONS_FIELD]);
    }

    #[test]
    fn test_search_fields_for_typed_terms() {
        let ints = search_fields(&properties(), true, TermKind::Integer, false);
        assert!(ints.contains(&"manufacturer".to_string()));
        assert!(!ints.contains(&"price".to_string()));

        let floats = search_fields(&properties(), true, TermKind::Float, false);
        assert!(floats.contains(&"price".to_string()));
        assert!(!floats.contains(&"manufacturer".to_string()));

        let bools = search_fields(&properties(), true, TermKind::Boolean, false);
        assert!(bools.contains(&"in_stock".to_string()));
        assert!(!bools.iter().any(|f| f == "news_from_date"));
    }

    #[test]
    fn test_compile_empty_query_is_match_all() {
        let config = EngineConfig::default();
        let body = QueryCompiler::new(&config).compile("", &QueryParams::default(), &properties());
        assert_eq!(body["query"]["filtered"]["query"], json!({"match_all": {}}));
        assert_eq!(
            body["query"]["filtered"]["filter"]["query"]["query_string"]["query"],
            json!("*")
        );
        assert_eq!(body["from"], json!(0));
        assert_eq!(body["size"], json!(100));
        assert_eq!(body["sort"], json!([{"_score": {"order": "desc"}}]));
    }

    #[test]
    fn test_compile_fulltext_with_fuzzy() {
        let config = EngineConfig {
            enable_fuzzy_query: true,
            fuzzy_min_similarity: 2.0,
            ..Default::default()
        };
        let body = QueryCompiler::new(&config).compile("red", &QueryParams::default(), &properties());
        let should = body["query"]["filtered"]["query"]["bool"]["should"]
            .as_array()
            .unwrap();
        assert_eq!(should.len(), 2);
        assert_eq!(should[0]["fuzzy_like_this"]["like_text"], json!("red"));
        assert_eq!(should[0]["fuzzy_like_this"]["min_similarity"], json!(0.99));
        assert_eq!(should[1]["query_string"]["query"], json!("red"));
    }

    #[test]
    fn test_compile_range_filters() {
        let config = EngineConfig::default();
        let mut params = QueryParams::default();
        params.add_range_filter("price_0_1", Interval::new(Some(50.0), Some(50.01), false));
        let body = QueryCompiler::new(&config).compile("", &params, &properties());
        let and = body["query"]["filtered"]["filter"]["and"].as_array().unwrap();
        assert_eq!(and.len(), 2);
        assert_eq!(
            and[1],
            json!({"range": {"price_0_1": {"from": 50.0, "to": 50.01, "include_upper": false}}})
        );
    }

    #[test]
    fn test_compile_facets() {
        let config = EngineConfig {
            facets_max_size: 50,
            ..Default::default()
        };
        let mut params = QueryParams::default();
        params
            .add_facet_field("color_en")
            .add_facet_field("manufacturer")
            .add_facet_field("unmapped")
            .add_facet_query("categories:3")
            .add_facet_ranges("price", vec![Interval::new(None, Some(25.0), false)]);
        let body = QueryCompiler::new(&config).compile("", &params, &properties());
        let facets = body["facets"].as_object().unwrap();

        assert_eq!(facets["color_en"]["terms"]["field"], json!("color_en.untouched"));
        assert_eq!(facets["color_en"]["terms"]["size"], json!(50));
        assert_eq!(facets["manufacturer"]["terms"]["field"], json!("manufacturer"));
        assert!(!facets.contains_key("unmapped"));
        assert_eq!(
            facets["categories:3"]["query"]["query_string"]["query"],
            json!("categories:3")
        );
        assert_eq!(facets["price"]["range"]["ranges"], json!([{"to": 25.0, "include_upper": false}]));
    }

    #[test]
    fn test_stats_suppress_term_and_range_facets() {
        let config = EngineConfig::default();
        let mut params = QueryParams::default();
        params
            .add_facet_field("manufacturer")
            .add_facet_ranges("price", vec![Interval::default()])
            .add_facet_query("categories:3")
            .add_stats_field("price_0_1");
        let body = QueryCompiler::new(&config).compile("", &params, &properties());
        let facets = body["facets"].as_object().unwrap();
        assert_eq!(facets.len(), 2);
        assert_eq!(facets["price_0_1"]["statistical"]["field"], json!("price_0_1"));
        assert!(facets.contains_key("categories:3"));
    }

    #[test]
    fn test_search_params_digest() {
        let mut a = QueryParams::for_store(1, "en_US");
        let b = a.clone();
        assert_eq!(a.search_params_digest().unwrap(), b.search_params_digest().unwrap());

        a.add_range_filter("price_0_1", Interval::new(Some(10.0), None, true));
        assert_ne!(a.search_params_digest().unwrap(), b.search_params_digest().unwrap());
    }

    #[test]
    fn test_interval_contains() {
        let last = Interval::new(Some(75.0), Some(100.0), true);
        assert!(last.contains(100.0));
        let first = Interval::new(None, Some(25.0), false);
        assert!(first.contains(0.0));
        assert!(!first.contains(25.0));
    }
}
