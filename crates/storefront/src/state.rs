//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::content::{ContentError, ContentStore};
use crate::db::DocumentStore;
use crate::services::oauth::OAuthClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the document store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: DocumentStore,
    content: ContentStore,
    oauth: OAuthClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Loads markdown content from `config.content_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content directory cannot be read.
    pub fn new(config: StorefrontConfig, store: DocumentStore) -> Result<Self, ContentError> {
        let content = ContentStore::load(&config.content_dir)?;
        Ok(Self::with_content(config, store, content))
    }

    /// Create application state with preloaded content.
    #[must_use]
    pub fn with_content(
        config: StorefrontConfig,
        store: DocumentStore,
        content: ContentStore,
    ) -> Self {
        let oauth = OAuthClient::new(&config);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                content,
                oauth,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &DocumentStore {
        &self.inner.store
    }

    /// Get a reference to the markdown content.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Get a reference to the OAuth client.
    #[must_use]
    pub fn oauth(&self) -> &OAuthClient {
        &self.inner.oauth
    }
}
