//! Product domain types.

use serde::Serialize;

use gremco_core::{CategoryId, DocumentKey, Price, ProductId, Searchable};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Store document key.
    pub key: DocumentKey,
    /// Sequential numeric id.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Unit price.
    pub price: Price,
    /// Units in stock.
    pub stock: u32,
    /// Optional image URL.
    pub image_url: Option<String>,
    /// Date the product was added, as `dd-MM-yyyy`.
    pub added_on: String,
    /// Informal reference to [`crate::models::Category::id`]. Not enforced.
    pub category_id: CategoryId,
}

impl Product {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

impl Searchable for Product {
    fn field_values(&self) -> Vec<String> {
        let mut values = vec![self.id.to_string(), self.name.clone()];
        if let Some(description) = &self.description {
            values.push(description.clone());
        }
        values.push(self.price.to_string());
        values.push(self.stock.to_string());
        if let Some(image_url) = &self.image_url {
            values.push(image_url.clone());
        }
        values.push(self.added_on.clone());
        values.push(self.category_id.to_string());
        values
    }
}

/// Input for creating a product.
///
/// The numeric id and addition date are assigned by the repository.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: u32,
    pub image_url: Option<String>,
    pub category_id: CategoryId,
}

/// Partial update for a product.
///
/// Outer `None` leaves a field untouched; for the optional fields,
/// `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_patch_serializes_only_supplied_fields() {
        let patch = ProductPatch {
            stock: Some(4),
            description: Some(None),
            ..ProductPatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"description": null, "stock": 4})
        );
    }

    #[test]
    fn test_search_fields_skip_absent_optionals() {
        let product = Product {
            key: DocumentKey::generate(),
            id: ProductId::new(3),
            name: "Teclado".to_owned(),
            description: None,
            price: Price::from_cents(2500),
            stock: 0,
            image_url: None,
            added_on: "01-02-2024".to_owned(),
            category_id: CategoryId::new(9),
        };
        assert_eq!(
            product.field_values(),
            vec!["3", "Teclado", "25.00", "0", "01-02-2024", "9"]
        );
        assert!(!product.in_stock());
    }
}
