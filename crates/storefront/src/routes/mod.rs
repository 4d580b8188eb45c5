//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog (?q=, ?category=)
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (store ping)
//! GET  /products/{key}         - Product detail
//! GET  /pages/{slug}           - Markdown content page
//!
//! # Account (requires a signed-in user)
//! GET  /account                - Profile page (anonymous: redirect to login)
//! GET  /api/account            - Profile as JSON (anonymous: 401)
//!
//! # Auth (rate limited)
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! GET  /auth/oauth/{provider}           - Redirect to Google / GitHub
//! GET  /auth/oauth/{provider}/callback  - Complete OAuth sign-in
//!
//! # Admin (requires an admin session)
//! GET  /admin                  - Dashboard
//! GET  /admin/{collection}     - List (?q=), POST creates
//! GET  /admin/{collection}/new - New form
//! GET  /admin/{collection}/{key}/edit   - Edit form
//! POST /admin/{collection}/{key}        - Update
//! POST /admin/{collection}/{key}/delete - Delete
//! GET  /admin/users/{key}      - User detail
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod health;
pub mod home;
pub mod oauth;
pub mod pages;
pub mod products;
pub mod view;

#[cfg(test)]
mod tests;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header::CACHE_CONTROL},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tower_sessions::SessionStore;

use gremco_core::DocumentKey;

use crate::error::AppError;
use crate::middleware::{
    auth_rate_limiter, create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/oauth/{provider}", get(oauth::start))
        .route("/oauth/{provider}/callback", get(oauth::callback))
        .layer(auth_rate_limiter())
}

/// Create all page routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/products/{key}", get(products::show))
        .route("/pages/{slug}", get(pages::show))
        .route("/account", get(account::show))
        .route("/api/account", get(account::summary))
        .nest("/auth", auth_routes())
        .nest("/admin", admin::admin_routes())
}

/// Build the complete application with its middleware stack.
///
/// Sentry layers are added by the binary so tests run without them.
pub fn app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(session_store, state.config());
    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=3600"),
        ))
        .service(ServeDir::new(&state.config().static_dir));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .merge(routes())
        .nest_service("/static", static_files)
        .fallback(not_found)
        .layer(session_layer)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("no route".to_owned())
}

/// Parse a document key from a path segment; malformed keys are a 404.
pub(crate) fn parse_key(raw: &str) -> Result<DocumentKey, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("document {raw}")))
}
