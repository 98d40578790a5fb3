//! Request parameters of a navigation cycle.
//!
//! Filters read their selection from here by request variable (`color`,
//! `price`, `cat`, ...). A variable given several times (`color[]=1`) is
//! multi-valued and rejected by every filter.

use std::collections::BTreeMap;

/// Value of one request variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestValue {
    /// Plain value.
    Single(String),
    /// Array value.
    Multiple(Vec<String>),
}

/// Request variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRequest {
    params: BTreeMap<String, RequestValue>,
}

impl FilterRequest {
    /// Empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs. Names ending in `[]` collect into
    /// a multi-valued variable.
    pub fn from_pairs<K: AsRef<str>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut request = Self::new();
        for (name, value) in pairs {
            request.push(name.as_ref(), value.into());
        }
        request
    }

    /// Parse an `a=1&b=2` query string. Names and values are form-decoded
    /// (`+` is a space, `%XX` an escaped byte).
    pub fn parse_query(query: &str) -> Self {
        Self::from_pairs(
            query
                .trim_start_matches('?')
                .split('&')
                .filter(|pair| !pair.is_empty())
                .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
                .map(|(name, value)| (form_decode(name), form_decode(value))),
        )
    }

    /// Set a plain variable.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .insert(name.into(), RequestValue::Single(value.into()));
        self
    }

    fn push(&mut self, name: &str, value: String) {
        match name.strip_suffix("[]") {
            Some(name) => match self.params.get_mut(name) {
                Some(RequestValue::Multiple(values)) => values.push(value),
                _ => {
                    self.params
                        .insert(name.to_string(), RequestValue::Multiple(vec![value]));
                }
            },
            None => {
                self.params
                    .insert(name.to_string(), RequestValue::Single(value));
            }
        }
    }

    /// Raw value of a variable.
    pub fn get(&self, name: &str) -> Option<&RequestValue> {
        self.params.get(name)
    }

    /// Plain value of a variable; `None` when absent or multi-valued.
    pub fn single(&self, name: &str) -> Option<&str> {
        match self.params.get(name) {
            Some(RequestValue::Single(value)) => Some(value),
            _ => None,
        }
    }

    /// Whether the variable carries a non-empty plain value.
    pub fn has_value(&self, name: &str) -> bool {
        self.single(name).is_some_and(|v| !v.is_empty())
    }
}

/// Decode one form-encoded component. Invalid UTF-8 is replaced, not rejected.
fn form_decode(component: &str) -> String {
    let spaced = component.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

// ============================================================================
// Tests
// ============================================================================
