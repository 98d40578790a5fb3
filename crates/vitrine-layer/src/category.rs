//! Categories, as seen by layered navigation.
//!
//! The catalog owns categories; navigation only needs to load one by id and
//! list the children of one. [`CategoryRepository`] is that boundary,
//! [`MemoryCategories`] a fixed in-memory tree.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A category node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Whether the category is enabled.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Parent id, `None` for a root.
    #[serde(default)]
    pub parent_id: Option<u64>,
}

fn default_active() -> bool {
    true
}

impl Category {
    /// An active category.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_active: true,
            parent_id: None,
        }
    }

    /// Set the parent.
    pub fn with_parent(mut self, parent_id: u64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Mark as disabled.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Read access to the category tree of a store.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Load a category.
    async fn load(&self, id: u64, store_id: u32) -> Result<Option<Category>>;

    /// Direct children of a category, in display order.
    async fn children(&self, id: u64, store_id: u32) -> Result<Vec<Category>>;
}

/// In-memory category tree, shared by every store.
#[derive(Debug, Clone, Default)]
pub struct MemoryCategories {
    categories: BTreeMap<u64, Category>,
}

impl MemoryCategories {
    /// Build from categories.
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            categories: categories.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    /// Parse a JSON array of categories.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let categories: Vec<Category> = serde_json::from_str(input)?;
        Ok(Self::new(categories))
    }
}

#[async_trait]
impl CategoryRepository for MemoryCategories {
    async fn load(&self, id: u64, _store_id: u32) -> Result<Option<Category>> {
        Ok(self.categories.get(&id).cloned())
    }

    async fn children(&self, id: u64, _store_id: u32) -> Result<Vec<Category>> {
        Ok(self
            .categories
            .values()
            .filter(|c| c.parent_id == Some(id))
            .cloned()
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_tree() {
        let repo = MemoryCategories::from_json_str(
            r#"[
                {"id": 2, "name": "Root"},
                {"id": 3, "name": "Shoes", "parent_id": 2},
                {"id": 4, "name": "Hats", "parent_id": 2, "is_active": false},
                {"id": 5, "name": "Boots", "parent_id": 3}
            ]"#,
        )
        .unwrap();

        let children = repo.children(2, 1).await.unwrap();
        assert_eq!(children.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3, 4]);
        assert!(!children[1].is_active);
        assert_eq!(repo.load(5, 1).await.unwrap().unwrap().name, "Boots");
        assert!(repo.load(99, 1).await.unwrap().is_none());
    }
}
