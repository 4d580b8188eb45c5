//! Document store backends.
//!
//! Two interchangeable backends sit behind [`DocumentStore`]:
//!
//! - `Postgres` keeps every collection in one `documents` table with a JSONB
//!   body. Partial updates use `data || patch`, and a unique expression index
//!   on `(collection, data->>'id')` rejects duplicate numeric ids.
//! - `Memory` keeps ordered per-collection vectors behind a `tokio` lock. It
//!   is used when no database URL is configured and throughout the tests.
//!
//! Both backends give the same answers for the same sequence of calls.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use gremco_core::DocumentKey;

use super::RepositoryError;

/// A named collection of documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Categories,
    Users,
}

impl Collection {
    /// Every collection, in display order.
    pub const ALL: [Self; 3] = [Self::Products, Self::Categories, Self::Users];

    /// Stored collection name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "productos",
            Self::Categories => "categorias",
            Self::Users => "usuarios",
        }
    }
}

/// A document as read back from the store.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// Collection the document belongs to.
    pub collection: Collection,
    /// Store-assigned key.
    pub key: DocumentKey,
    /// JSON body.
    pub data: Value,
}

/// Handle to the document store.
///
/// Cheap to clone: the Postgres variant wraps a pool and the memory variant
/// an `Arc`.
#[derive(Clone)]
pub enum DocumentStore {
    Postgres(PgPool),
    Memory(MemoryStore),
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres(_) => f.write_str("DocumentStore::Postgres"),
            Self::Memory(_) => f.write_str("DocumentStore::Memory"),
        }
    }
}

impl DocumentStore {
    /// An empty in-memory store.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::default())
    }

    /// Name of the active backend, for logging.
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// All documents in a collection, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, collection: Collection) -> Result<Vec<StoredDocument>, RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                let rows: Vec<(Uuid, Json<Value>)> = sqlx::query_as(
                    r"
                    SELECT doc_key, data
                    FROM documents
                    WHERE collection = $1
                    ORDER BY created_at, doc_key
                    ",
                )
                .bind(collection.as_str())
                .fetch_all(pool)
                .await?;

                Ok(rows
                    .into_iter()
                    .map(|(key, Json(data))| StoredDocument {
                        collection,
                        key: DocumentKey::from_uuid(key),
                        data,
                    })
                    .collect())
            }
            Self::Memory(store) => Ok(store.list(collection).await),
        }
    }

    /// A single document by key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        collection: Collection,
        key: DocumentKey,
    ) -> Result<Option<StoredDocument>, RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                let row: Option<(Json<Value>,)> = sqlx::query_as(
                    r"
                    SELECT data
                    FROM documents
                    WHERE collection = $1 AND doc_key = $2
                    ",
                )
                .bind(collection.as_str())
                .bind(key.as_uuid())
                .fetch_optional(pool)
                .await?;

                Ok(row.map(|(Json(data),)| StoredDocument {
                    collection,
                    key,
                    data,
                }))
            }
            Self::Memory(store) => Ok(store.get(collection, key).await),
        }
    }

    /// Insert a new document and return its generated key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another document in the same
    /// collection already carries the same numeric `id`.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(
        &self,
        collection: Collection,
        data: Value,
    ) -> Result<DocumentKey, RepositoryError> {
        let key = DocumentKey::generate();
        match self {
            Self::Postgres(pool) => {
                sqlx::query(
                    r"
                    INSERT INTO documents (collection, doc_key, data)
                    VALUES ($1, $2, $3)
                    ",
                )
                .bind(collection.as_str())
                .bind(key.as_uuid())
                .bind(Json(&data))
                .execute(pool)
                .await
                .map_err(|e| {
                    if let sqlx::Error::Database(ref db_err) = e
                        && db_err.is_unique_violation()
                    {
                        return duplicate_id(collection, &data);
                    }
                    RepositoryError::Database(e)
                })?;
            }
            Self::Memory(store) => store.insert(collection, key, data).await?,
        }
        Ok(key)
    }

    /// Merge `patch` into the top level of an existing document.
    ///
    /// Fields absent from `patch` are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no document has this key.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn merge(
        &self,
        collection: Collection,
        key: DocumentKey,
        patch: Value,
    ) -> Result<(), RepositoryError> {
        if !patch.is_object() {
            return Err(RepositoryError::DataCorruption(
                "patch must be a JSON object".to_owned(),
            ));
        }

        match self {
            Self::Postgres(pool) => {
                let result = sqlx::query(
                    r"
                    UPDATE documents
                    SET data = data || $3, updated_at = now()
                    WHERE collection = $1 AND doc_key = $2
                    ",
                )
                .bind(collection.as_str())
                .bind(key.as_uuid())
                .bind(Json(&patch))
                .execute(pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound);
                }
                Ok(())
            }
            Self::Memory(store) => store.merge(collection, key, patch).await,
        }
    }

    /// Delete a document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no document has this key.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, collection: Collection, key: DocumentKey) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND doc_key = $2")
                    .bind(collection.as_str())
                    .bind(key.as_uuid())
                    .execute(pool)
                    .await?;

                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound);
                }
                Ok(())
            }
            Self::Memory(store) => store.delete(collection, key).await,
        }
    }

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database does not answer.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            Self::Memory(_) => Ok(()),
        }
    }
}

fn duplicate_id(collection: Collection, data: &Value) -> RepositoryError {
    let id = data.get("id").map_or_else(|| "?".to_owned(), ToString::to_string);
    RepositoryError::Conflict(format!("{} already has a document with id {id}", collection.as_str()))
}

// =============================================================================
// In-memory backend
// =============================================================================

#[derive(Debug, Clone)]
struct MemoryEntry {
    key: DocumentKey,
    data: Value,
}

/// In-memory document collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<MemoryEntry>>>>,
}

impl MemoryStore {
    async fn list(&self, collection: Collection) -> Vec<StoredDocument> {
        let collections = self.collections.read().await;
        collections
            .get(&collection)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| StoredDocument {
                        collection,
                        key: entry.key,
                        data: entry.data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn get(&self, collection: Collection, key: DocumentKey) -> Option<StoredDocument> {
        let collections = self.collections.read().await;
        collections
            .get(&collection)?
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| StoredDocument {
                collection,
                key,
                data: entry.data.clone(),
            })
    }

    async fn insert(
        &self,
        collection: Collection,
        key: DocumentKey,
        data: Value,
    ) -> Result<(), RepositoryError> {
        let mut collections = self.collections.write().await;
        let entries = collections.entry(collection).or_default();

        if let Some(id) = data.get("id")
            && entries.iter().any(|entry| entry.data.get("id") == Some(id))
        {
            return Err(duplicate_id(collection, &data));
        }

        entries.push(MemoryEntry { key, data });
        Ok(())
    }

    async fn merge(
        &self,
        collection: Collection,
        key: DocumentKey,
        patch: Value,
    ) -> Result<(), RepositoryError> {
        let mut collections = self.collections.write().await;
        let entry = collections
            .get_mut(&collection)
            .and_then(|entries| entries.iter_mut().find(|entry| entry.key == key))
            .ok_or(RepositoryError::NotFound)?;

        let (Value::Object(target), Value::Object(fields)) = (&mut entry.data, patch) else {
            return Err(RepositoryError::DataCorruption(format!(
                "document {key} in {} is not a JSON object",
                collection.as_str()
            )));
        };
        target.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: Collection, key: DocumentKey) -> Result<(), RepositoryError> {
        let mut collections = self.collections.write().await;
        let entries = collections
            .get_mut(&collection)
            .ok_or(RepositoryError::NotFound)?;
        let before = entries.len();
        entries.retain(|entry| entry.key != key);
        if entries.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
