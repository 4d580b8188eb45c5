//! Product repository.

use serde::{Deserialize, Serialize};

use gremco_core::{CategoryId, DocumentKey, Price, ProductId};

use super::{Collection, DocumentStore, RepositoryError, StoredDocument, decode, encode};
use crate::models::{NewProduct, Product, ProductPatch, product_date_label, today};

/// Stored shape of a product document.
#[derive(Debug, Serialize, Deserialize)]
struct ProductDocument {
    id: ProductId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: Price,
    #[serde(default)]
    stock: u32,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    added_on: String,
    category_id: CategoryId,
}

impl ProductDocument {
    fn into_product(self, key: DocumentKey) -> Product {
        Product {
            key,
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            image_url: self.image_url,
            added_on: self.added_on,
            category_id: self.category_id,
        }
    }
}

fn to_product(doc: &StoredDocument) -> Result<Product, RepositoryError> {
    decode::<ProductDocument>(doc).map(|body| body.into_product(doc.key))
}

/// Repository for product documents.
pub struct ProductRepository<'a> {
    store: &'a DocumentStore,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// All products, sorted by numeric id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a document is malformed.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let docs = self.store.list(Collection::Products).await?;
        let mut products = docs.iter().map(to_product).collect::<Result<Vec<_>, _>>()?;
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    /// Get a product by document key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the document is malformed.
    pub async fn get(&self, key: DocumentKey) -> Result<Option<Product>, RepositoryError> {
        self.store
            .get(Collection::Products, key)
            .await?
            .as_ref()
            .map(to_product)
            .transpose()
    }

    /// Id the next created product will receive.
    ///
    /// Two callers reading the same collection state get the same id; the
    /// second insert then fails with `RepositoryError::Conflict`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the collection cannot be read.
    /// Returns `RepositoryError::IdExhausted` if no id is left.
    pub async fn next_id(&self) -> Result<ProductId, RepositoryError> {
        super::next_id(self.store, Collection::Products)
            .await
            .map(ProductId::new)
    }

    /// Insert a product with an already-allocated id and date label.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(
        &self,
        id: ProductId,
        new: &NewProduct,
        added_on: String,
    ) -> Result<Product, RepositoryError> {
        let body = ProductDocument {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
            price: new.price,
            stock: new.stock,
            image_url: new.image_url.clone(),
            added_on,
            category_id: new.category_id,
        };
        let key = self
            .store
            .insert(Collection::Products, encode(&body)?)
            .await?;

        tracing::info!(product_id = %id, key = %key, "Product created");
        Ok(body.into_product(key))
    }

    /// Allocate the next id, stamp today's date and insert.
    ///
    /// # Errors
    ///
    /// See [`Self::next_id`] and [`Self::insert`].
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let id = self.next_id().await?;
        self.insert(id, new, product_date_label(today())).await
    }

    /// Apply a partial update and return the updated product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        key: DocumentKey,
        patch: &ProductPatch,
    ) -> Result<Product, RepositoryError> {
        self.store
            .merge(Collection::Products, key, encode(patch)?)
            .await?;
        self.get(key).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, key: DocumentKey) -> Result<(), RepositoryError> {
        self.store.delete(Collection::Products, key).await?;
        tracing::info!(key = %key, "Product deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: Some("Edición limitada".to_owned()),
            price: Price::from_cents(4990),
            stock: 5,
            image_url: None,
            category_id: CategoryId::new(1),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = DocumentStore::memory();
        let repo = ProductRepository::new(&store);

        assert_eq!(repo.next_id().await.unwrap(), ProductId::new(1));
        let first = repo.create(&sample("Consola")).await.unwrap();
        let second = repo.create(&sample("Control")).await.unwrap();

        assert_eq!(first.id, ProductId::new(1));
        assert_eq!(second.id, ProductId::new(2));
        assert_eq!(repo.next_id().await.unwrap(), ProductId::new(3));
    }

    #[tokio::test]
    async fn test_added_on_uses_dashes() {
        let store = DocumentStore::memory();
        let product = ProductRepository::new(&store)
            .create(&sample("Consola"))
            .await
            .unwrap();
        let parts: Vec<_> = product.added_on.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 4);
    }

    #[tokio::test]
    async fn test_list_sorts_by_id_and_gaps_are_not_reused() {
        let store = DocumentStore::memory();
        let repo = ProductRepository::new(&store);
        repo.insert(ProductId::new(10), &sample("B"), "01-01-2024".to_owned())
            .await
            .unwrap();
        repo.insert(ProductId::new(2), &sample("A"), "01-01-2024".to_owned())
            .await
            .unwrap();

        let ids: Vec<_> = repo.list().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![ProductId::new(2), ProductId::new(10)]);
        assert_eq!(repo.next_id().await.unwrap(), ProductId::new(11));
    }

    #[tokio::test]
    async fn test_concurrent_allocations_collide_and_second_insert_conflicts() {
        let store = DocumentStore::memory();
        let repo = ProductRepository::new(&store);
        repo.create(&sample("Existente")).await.unwrap();

        let (a, b) = tokio::join!(repo.next_id(), repo.next_id());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a, b);

        repo.insert(a, &sample("Primero"), "01-01-2024".to_owned())
            .await
            .unwrap();
        let err = repo
            .insert(b, &sample("Segundo"), "01-01-2024".to_owned())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_changes_only_supplied_fields() {
        let store = DocumentStore::memory();
        let repo = ProductRepository::new(&store);
        let created = repo.create(&sample("Consola")).await.unwrap();

        let updated = repo
            .update(
                created.key,
                &ProductPatch {
                    stock: Some(0),
                    description: Some(None),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.stock, 0);
        assert_eq!(updated.description, None);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.price, created.price);
        assert_eq!(updated.added_on, created.added_on);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_are_not_found() {
        let store = DocumentStore::memory();
        let repo = ProductRepository::new(&store);
        let missing = DocumentKey::generate();
        assert!(matches!(
            repo.update(missing, &ProductPatch::default()).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(
            repo.delete(missing).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_malformed_document_is_data_corruption() {
        let store = DocumentStore::memory();
        store
            .insert(Collection::Products, json!({"id": 1, "name": "Sin precio"}))
            .await
            .unwrap();
        assert!(matches!(
            ProductRepository::new(&store).list().await,
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
