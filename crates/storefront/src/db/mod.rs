//! Persistence for the storefront.
//!
//! # Collections
//!
//! Every record lives as a JSON document in one of three collections:
//!
//! - `productos` - catalog products
//! - `categorias` - product categories
//! - `usuarios` - storefront accounts (customers and admins)
//!
//! Documents are addressed by a store-assigned [`DocumentKey`]. The numeric
//! `id` inside each document is allocated by the application (see
//! [`gremco_core::next_sequential_id`]) and is checked for uniqueness when the
//! document is written.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p gremco-cli -- migrate
//! ```
//!
//! [`DocumentKey`]: gremco_core::DocumentKey

pub mod categories;
pub mod products;
pub mod store;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use gremco_core::SequenceError;

pub use categories::CategoryRepository;
pub use products::ProductRepository;
pub use store::{Collection, DocumentStore, StoredDocument};
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored document does not have the expected shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested document was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate numeric id).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Another user already has this email address.
    #[error("email already registered")]
    EmailTaken,

    /// No numeric id is left to allocate.
    #[error(transparent)]
    IdExhausted(#[from] SequenceError),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Deserialize a stored document body into its record type.
pub(crate) fn decode<T: DeserializeOwned>(doc: &StoredDocument) -> Result<T, RepositoryError> {
    T::deserialize(&doc.data).map_err(|e| {
        RepositoryError::DataCorruption(format!(
            "document {} in {} is malformed: {e}",
            doc.key,
            doc.collection.as_str()
        ))
    })
}

/// Serialize a record or patch into a JSON object.
pub(crate) fn encode<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("failed to encode document: {e}")))
}

/// Next sequential numeric id for a collection.
///
/// Reads the whole collection. Documents without a usable numeric `id` are
/// ignored rather than failing the allocation.
pub(crate) async fn next_id(
    store: &DocumentStore,
    collection: Collection,
) -> Result<i32, RepositoryError> {
    let docs = store.list(collection).await?;
    let ids = docs.iter().filter_map(|doc| {
        doc.data
            .get("id")
            .and_then(serde_json::Value::as_i64)
            .and_then(|id| i32::try_from(id).ok())
    });
    Ok(gremco_core::next_sequential_id(ids)?)
}
