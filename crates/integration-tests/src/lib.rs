//! Integration tests for Gremco.
//!
//! # Running Tests
//!
//! ```bash
//! # Document store tests need a migrated database
//! export STOREFRONT_DATABASE_URL=postgres://localhost/gremco_test
//! cargo run -p gremco-cli -- migrate
//!
//! # HTTP tests need a running storefront
//! cargo run -p gremco-storefront &
//!
//! cargo test -p gremco-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `document_store` - Postgres backend behavior (id uniqueness, merges)
//! - `storefront_http` - Public pages, headers and the login flow over HTTP

use secrecy::SecretString;
use sqlx::PgPool;

use gremco_storefront::db::{Collection, DocumentStore, create_pool};

/// Base URL of a running storefront.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// HTTP client that keeps cookies and does not follow redirects.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Connect to the test database and wipe every collection.
///
/// # Panics
///
/// Panics if no database URL is set or the database is unreachable.
pub async fn clean_store() -> (PgPool, DocumentStore) {
    let url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("STOREFRONT_DATABASE_URL must be set for integration tests");
    let pool = create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database");

    for collection in Collection::ALL {
        sqlx::query("DELETE FROM documents WHERE collection = $1")
            .bind(collection.as_str())
            .execute(&pool)
            .await
            .expect("Failed to clean collection");
    }

    (pool.clone(), DocumentStore::Postgres(pool))
}
