//! Admin dashboard.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use tracing::instrument;

use crate::db::{CategoryRepository, ProductRepository, UserRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::view::{Flash, FlashQuery, Layout};
use crate::state::AppState;

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub flash: Flash,
    pub product_count: usize,
    pub out_of_stock_count: usize,
    pub category_count: usize,
    pub user_count: usize,
    pub admin_count: usize,
    pub backend: &'static str,
}

/// Display record counts.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(flash): Query<FlashQuery>,
) -> Result<DashboardTemplate> {
    let products = ProductRepository::new(state.store()).list().await?;
    let categories = CategoryRepository::new(state.store()).list().await?;
    let users = UserRepository::new(state.store()).list().await?;

    Ok(DashboardTemplate {
        layout: Layout::new(&state, Some(admin)),
        flash: flash.into(),
        product_count: products.len(),
        out_of_stock_count: products.iter().filter(|p| !p.in_stock()).count(),
        category_count: categories.len(),
        user_count: users.len(),
        admin_count: users.iter().filter(|u| u.is_admin).count(),
        backend: state.store().backend_name(),
    })
}
