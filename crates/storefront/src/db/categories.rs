//! Category repository.

use serde::{Deserialize, Serialize};

use gremco_core::{CategoryId, DocumentKey};

use super::{Collection, DocumentStore, RepositoryError, StoredDocument, decode, encode};
use crate::models::{Category, CategoryPatch, NewCategory};

#[derive(Debug, Serialize, Deserialize)]
struct CategoryDocument {
    id: CategoryId,
    name: String,
}

fn to_category(doc: &StoredDocument) -> Result<Category, RepositoryError> {
    decode::<CategoryDocument>(doc).map(|body| Category {
        key: doc.key,
        id: body.id,
        name: body.name,
    })
}

/// Repository for category documents.
pub struct CategoryRepository<'a> {
    store: &'a DocumentStore,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// All categories, sorted by numeric id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a document is malformed.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let docs = self.store.list(Collection::Categories).await?;
        let mut categories = docs.iter().map(to_category).collect::<Result<Vec<_>, _>>()?;
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    /// Get a category by document key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, key: DocumentKey) -> Result<Option<Category>, RepositoryError> {
        self.store
            .get(Collection::Categories, key)
            .await?
            .as_ref()
            .map(to_category)
            .transpose()
    }

    /// Id the next created category will receive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the collection cannot be read.
    pub async fn next_id(&self) -> Result<CategoryId, RepositoryError> {
        super::next_id(self.store, Collection::Categories)
            .await
            .map(CategoryId::new)
    }

    /// Insert a category with an already-allocated id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id is already taken.
    pub async fn insert(
        &self,
        id: CategoryId,
        new: &NewCategory,
    ) -> Result<Category, RepositoryError> {
        let body = CategoryDocument {
            id,
            name: new.name.clone(),
        };
        let key = self
            .store
            .insert(Collection::Categories, encode(&body)?)
            .await?;

        tracing::info!(category_id = %id, key = %key, "Category created");
        Ok(Category {
            key,
            id,
            name: body.name,
        })
    }

    /// Allocate the next id and insert.
    ///
    /// # Errors
    ///
    /// See [`Self::next_id`] and [`Self::insert`].
    pub async fn create(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let id = self.next_id().await?;
        self.insert(id, new).await
    }

    /// Apply a partial update and return the updated category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn update(
        &self,
        key: DocumentKey,
        patch: &CategoryPatch,
    ) -> Result<Category, RepositoryError> {
        self.store
            .merge(Collection::Categories, key, encode(patch)?)
            .await?;
        self.get(key).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a category.
    ///
    /// Products that reference it keep their `category_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn delete(&self, key: DocumentKey) -> Result<(), RepositoryError> {
        self.store.delete(Collection::Categories, key).await?;
        tracing::info!(key = %key, "Category deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_trims_name_and_starts_at_one() {
        let store = DocumentStore::memory();
        let repo = CategoryRepository::new(&store);
        let category = repo.create(&NewCategory::new("  Accesorios  ")).await.unwrap();

        assert_eq!(category.id, CategoryId::new(1));
        assert_eq!(category.name, "Accesorios");
        assert_eq!(repo.get(category.key).await.unwrap(), Some(category));
    }

    #[tokio::test]
    async fn test_rename() {
        let store = DocumentStore::memory();
        let repo = CategoryRepository::new(&store);
        let category = repo.create(&NewCategory::new("Juegos")).await.unwrap();

        let renamed = repo
            .update(
                category.key,
                &CategoryPatch {
                    name: Some("Videojuegos".to_owned()),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Videojuegos");
        assert_eq!(renamed.id, category.id);
    }

    #[tokio::test]
    async fn test_delete_then_next_id_reuses_top() {
        let store = DocumentStore::memory();
        let repo = CategoryRepository::new(&store);
        repo.create(&NewCategory::new("A")).await.unwrap();
        let b = repo.create(&NewCategory::new("B")).await.unwrap();

        repo.delete(b.key).await.unwrap();
        assert_eq!(repo.next_id().await.unwrap(), CategoryId::new(2));
    }
}
