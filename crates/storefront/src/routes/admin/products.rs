//! Product management screens.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use tracing::instrument;

use gremco_core::{CategoryId, Price, ProductId, filter_records};

use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Category, NewProduct, Product, ProductPatch};
use crate::routes::admin::SearchQuery;
use crate::routes::parse_key;
use crate::routes::view::{Flash, FlashKind, FlashQuery, Layout, redirect_with, repository_error_code};
use crate::state::AppState;

const INDEX_PATH: &str = "/admin/products";

// =============================================================================
// Form Types
// =============================================================================

/// Product form data, as typed.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub image_url: String,
    pub category_id: String,
}

impl ProductForm {
    fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.to_string(),
            stock: product.stock.to_string(),
            image_url: product.image_url.clone().unwrap_or_default(),
            category_id: product.category_id.to_string(),
        }
    }

    /// Validate the form, returning a flash error code on failure.
    fn parse(&self) -> std::result::Result<NewProduct, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("missing_name");
        }
        let price = Price::parse(&self.price).map_err(|_| "invalid_price")?;
        let stock = match self.stock.trim() {
            "" => 0,
            raw => raw.parse::<u32>().map_err(|_| "invalid_stock")?,
        };
        let category_id = self
            .category_id
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|id| *id > 0)
            .map(CategoryId::new)
            .ok_or("invalid_category")?;

        Ok(NewProduct {
            name: name.to_owned(),
            description: non_blank(&self.description),
            price,
            stock,
            image_url: non_blank(&self.image_url),
            category_id,
        })
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// Every field replaced; blank optional fields are cleared.
fn full_patch(product: NewProduct) -> ProductPatch {
    ProductPatch {
        name: Some(product.name),
        description: Some(product.description),
        price: Some(product.price),
        stock: Some(product.stock),
        image_url: Some(product.image_url),
        category_id: Some(product.category_id),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// A product row with its category name resolved.
pub struct ProductRow {
    pub product: Product,
    pub category_name: Option<String>,
}

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/index.html")]
pub struct ProductIndexTemplate {
    pub layout: Layout,
    pub flash: Flash,
    pub query: String,
    pub total: usize,
    pub rows: Vec<ProductRow>,
}

/// Product create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub flash: Flash,
    pub heading: String,
    pub action: String,
    /// Id the product will get (new) or has (edit).
    pub id: ProductId,
    pub form: ProductForm,
    pub categories: Vec<Category>,
}

impl ProductFormTemplate {
    fn is_selected(&self, id: CategoryId) -> bool {
        self.form.category_id.trim() == id.to_string()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List products, filtered by `?q=`.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
#[instrument(skip(state, admin, flash))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(search): Query<SearchQuery>,
    Query(flash): Query<FlashQuery>,
) -> Result<ProductIndexTemplate> {
    let products = ProductRepository::new(state.store()).list().await?;
    let categories = CategoryRepository::new(state.store()).list().await?;

    let rows = filter_records(&products, &search.q)
        .into_iter()
        .map(|product| ProductRow {
            category_name: categories
                .iter()
                .find(|c| c.id == product.category_id)
                .map(|c| c.name.clone()),
            product: product.clone(),
        })
        .collect();

    Ok(ProductIndexTemplate {
        layout: Layout::new(&state, Some(admin)),
        flash: flash.into(),
        query: search.q,
        total: products.len(),
        rows,
    })
}

/// Display the new product form.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
#[instrument(skip_all)]
pub async fn new(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(flash): Query<FlashQuery>,
) -> Result<ProductFormTemplate> {
    let id = ProductRepository::new(state.store()).next_id().await?;
    let categories = CategoryRepository::new(state.store()).list().await?;

    Ok(ProductFormTemplate {
        layout: Layout::new(&state, Some(admin)),
        flash: flash.into(),
        heading: "New product".to_owned(),
        action: INDEX_PATH.to_owned(),
        id,
        form: ProductForm::default(),
        categories,
    })
}

/// Handle the new product form.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Form(form): Form<ProductForm>,
) -> Response {
    let new_product = match form.parse() {
        Ok(product) => product,
        Err(code) => return redirect_with("/admin/products/new", FlashKind::Error, code),
    };

    match ProductRepository::new(state.store()).create(&new_product).await {
        Ok(_) => redirect_with(INDEX_PATH, FlashKind::Success, "product_created"),
        Err(e) => {
            tracing::error!("Failed to create product: {}", e);
            redirect_with("/admin/products/new", FlashKind::Error, repository_error_code(&e))
        }
    }
}

/// Display the edit form for a product.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
#[instrument(skip(state, admin, flash))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<String>,
    Query(flash): Query<FlashQuery>,
) -> Result<ProductFormTemplate> {
    let key = parse_key(&key)?;
    let product = ProductRepository::new(state.store())
        .get(key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {key}")))?;
    let categories = CategoryRepository::new(state.store()).list().await?;

    Ok(ProductFormTemplate {
        layout: Layout::new(&state, Some(admin)),
        flash: flash.into(),
        heading: format!("Edit {}", product.name),
        action: format!("{INDEX_PATH}/{key}"),
        id: product.id,
        form: ProductForm::from_product(&product),
        categories,
    })
}

/// Handle the edit form.
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(key): Path<String>,
    Form(form): Form<ProductForm>,
) -> Response {
    let Ok(key) = parse_key(&key) else {
        return redirect_with(INDEX_PATH, FlashKind::Error, "not_found");
    };
    let edit_path = format!("{INDEX_PATH}/{key}/edit");

    let patch = match form.parse() {
        Ok(product) => full_patch(product),
        Err(code) => return redirect_with(&edit_path, FlashKind::Error, code),
    };

    match ProductRepository::new(state.store()).update(key, &patch).await {
        Ok(_) => redirect_with(INDEX_PATH, FlashKind::Success, "product_updated"),
        Err(e) => {
            tracing::error!("Failed to update product {}: {}", key, e);
            redirect_with(INDEX_PATH, FlashKind::Error, repository_error_code(&e))
        }
    }
}

/// Handle product deletion.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(key): Path<String>,
) -> Response {
    let Ok(key) = parse_key(&key) else {
        return redirect_with(INDEX_PATH, FlashKind::Error, "not_found");
    };

    match ProductRepository::new(state.store()).delete(key).await {
        Ok(()) => redirect_with(INDEX_PATH, FlashKind::Success, "product_deleted"),
        Err(e) => {
            tracing::error!("Failed to delete product {}: {}", key, e);
            redirect_with(INDEX_PATH, FlashKind::Error, repository_error_code(&e))
        }
    }
}
