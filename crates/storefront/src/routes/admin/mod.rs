//! Admin console route handlers.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin):
//! anonymous visitors are sent to the login page and signed-in customers get
//! `403 Forbidden`.
//!
//! List screens accept `?q=` and keep the records whose fields contain it
//! (case-insensitive). Writes are form POSTs that redirect back with a
//! `?success=` or `?error=` code.

pub mod categories;
pub mod dashboard;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;

use crate::state::AppState;

/// `?q=` on list screens.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        // Products
        .route("/products", get(products::index).post(products::create))
        .route("/products/new", get(products::new))
        .route("/products/{key}", post(products::update))
        .route("/products/{key}/edit", get(products::edit))
        .route("/products/{key}/delete", post(products::delete))
        // Categories
        .route("/categories", get(categories::index).post(categories::create))
        .route("/categories/new", get(categories::new))
        .route("/categories/{key}", post(categories::update))
        .route("/categories/{key}/edit", get(categories::edit))
        .route("/categories/{key}/delete", post(categories::delete))
        // Users
        .route("/users", get(users::index).post(users::create))
        .route("/users/new", get(users::new))
        .route("/users/{key}", get(users::show).post(users::update))
        .route("/users/{key}/edit", get(users::edit))
        .route("/users/{key}/delete", post(users::delete))
}
