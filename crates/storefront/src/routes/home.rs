//! Home page: the public catalog grid.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use gremco_core::{CategoryId, matches_query};

use crate::db::{CategoryRepository, ProductRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{Category, Product};
use crate::routes::view::{Flash, FlashQuery, Layout};
use crate::state::AppState;

/// Catalog filters.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub q: String,
    /// Category id; blank or unparsable means all categories.
    pub category: Option<String>,
}

impl CatalogQuery {
    fn category_id(&self) -> Option<CategoryId> {
        self.category
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i32>().ok())
            .map(CategoryId::new)
    }
}

/// A product card with its category name resolved.
pub struct ProductCard {
    pub product: Product,
    pub category_name: Option<String>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub flash: Flash,
    pub products: Vec<ProductCard>,
    pub categories: Vec<Category>,
    pub query: String,
    pub selected_category: Option<CategoryId>,
}

impl HomeTemplate {
    fn is_selected(&self, id: CategoryId) -> bool {
        self.selected_category == Some(id)
    }
}

/// Display the catalog.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
#[instrument(skip(state, user))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<CatalogQuery>,
    Query(flash): Query<FlashQuery>,
) -> Result<HomeTemplate> {
    let categories = CategoryRepository::new(state.store()).list().await?;
    let selected_category = query.category_id();

    let products = ProductRepository::new(state.store())
        .list()
        .await?
        .into_iter()
        .filter(|p| selected_category.is_none_or(|id| p.category_id == id))
        .filter(|p| matches_query(p, &query.q))
        .map(|product| ProductCard {
            category_name: categories
                .iter()
                .find(|c| c.id == product.category_id)
                .map(|c| c.name.clone()),
            product,
        })
        .collect();

    Ok(HomeTemplate {
        layout: Layout::new(&state, user),
        flash: flash.into(),
        products,
        categories,
        query: query.q,
        selected_category,
    })
}
