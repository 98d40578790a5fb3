//! Applied filter state.

use serde::{Deserialize, Serialize};

/// One applied filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterItem {
    /// Display text of the selection.
    pub label: String,
    /// Request variable of the filter.
    pub request_var: String,
    /// Selected raw value.
    pub value: String,
}

impl FilterItem {
    /// Create an item.
    pub fn new(
        label: impl Into<String>,
        request_var: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            request_var: request_var.into(),
            value: value.into(),
        }
    }
}

/// Filters applied in the current navigation cycle, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    items: Vec<FilterItem>,
}

impl FilterState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an applied filter.
    pub fn add(&mut self, item: FilterItem) {
        log::debug!("Applied filter {}={}", item.request_var, item.value);
        self.items.push(item);
    }

    /// Applied filters.
    pub fn items(&self) -> &[FilterItem] {
        &self.items
    }

    /// Whether a filter with this request variable is applied.
    pub fn is_applied(&self, request_var: &str) -> bool {
        self.items.iter().any(|i| i.request_var == request_var)
    }

    /// Whether nothing is applied.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
