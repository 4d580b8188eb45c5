//! Session middleware configuration.
//!
//! Sessions live in `PostgreSQL` (tower-sessions-sqlx-store) when a database
//! is configured, otherwise in process memory.

use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;
use crate::db::DocumentStore;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "gremco_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create a session layer over any session store.
///
/// Cookies are signed with a key derived from the session secret.
#[must_use]
pub fn create_session_layer<S>(
    store: S,
    config: &StorefrontConfig,
) -> SessionManagerLayer<S, SignedCookie>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_signed(signing_key(config))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// 64-byte cookie signing key from the configured secret.
fn signing_key(config: &StorefrontConfig) -> Key {
    let digest = Sha512::digest(config.session_secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

/// Session backend matching the document store.
#[derive(Debug, Clone)]
pub enum SessionBackend {
    Postgres(PostgresStore),
    Memory(MemoryStore),
}

impl SessionBackend {
    /// Pick the session backend for a document store.
    ///
    /// The Postgres table must already exist (`gremco-cli migrate`).
    #[must_use]
    pub fn for_store(store: &DocumentStore) -> Self {
        match store {
            DocumentStore::Postgres(pool) => Self::Postgres(PostgresStore::new(pool.clone())),
            DocumentStore::Memory(_) => Self::Memory(MemoryStore::default()),
        }
    }
}
