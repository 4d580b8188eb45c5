//! Public product detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{Category, Product};
use crate::routes::{parse_key, view::Layout};
use crate::state::AppState;

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductTemplate {
    pub layout: Layout,
    pub product: Product,
    pub category: Option<Category>,
}

/// Display a single product.
///
/// # Errors
///
/// Returns 404 if the key is malformed or no product has it.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(key): Path<String>,
) -> Result<ProductTemplate> {
    let key = parse_key(&key)?;
    let product = ProductRepository::new(state.store())
        .get(key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {key}")))?;

    // The category reference is informal; a dangling id just hides the link.
    let category = CategoryRepository::new(state.store())
        .list()
        .await?
        .into_iter()
        .find(|c| c.id == product.category_id);

    Ok(ProductTemplate {
        layout: Layout::new(&state, user),
        product,
        category,
    })
}
