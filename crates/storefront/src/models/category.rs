//! Category domain types.

use serde::Serialize;

use gremco_core::{CategoryId, DocumentKey, Searchable};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Store document key.
    pub key: DocumentKey,
    /// Sequential numeric id.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
}

impl Searchable for Category {
    fn field_values(&self) -> Vec<String> {
        vec![self.id.to_string(), self.name.clone()]
    }
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
}

impl NewCategory {
    /// Build from form input, trimming the name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_owned(),
        }
    }
}

/// Partial update for a category. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
