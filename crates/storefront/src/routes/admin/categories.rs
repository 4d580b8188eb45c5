//! Category management screens.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use tracing::instrument;

use gremco_core::{CategoryId, filter_records};

use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Category, CategoryPatch, NewCategory};
use crate::routes::admin::SearchQuery;
use crate::routes::parse_key;
use crate::routes::view::{Flash, FlashKind, FlashQuery, Layout, redirect_with, repository_error_code};
use crate::state::AppState;

const INDEX_PATH: &str = "/admin/categories";

/// Category form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
}

impl CategoryForm {
    fn parse(&self) -> std::result::Result<NewCategory, &'static str> {
        let category = NewCategory::new(&self.name);
        if category.name.is_empty() {
            return Err("missing_name");
        }
        Ok(category)
    }
}

/// A category row with the number of products referencing it.
pub struct CategoryRow {
    pub category: Category,
    pub product_count: usize,
}

/// Category list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/categories/index.html")]
pub struct CategoryIndexTemplate {
    pub layout: Layout,
    pub flash: Flash,
    pub query: String,
    pub total: usize,
    pub rows: Vec<CategoryRow>,
}

/// Category create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/categories/form.html")]
pub struct CategoryFormTemplate {
    pub layout: Layout,
    pub flash: Flash,
    pub heading: String,
    pub action: String,
    pub id: CategoryId,
    pub form: CategoryForm,
}

/// List categories, filtered by `?q=`.
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
) -> Result<CategoryIndexTemplate> {
    let categories = CategoryRepository::new(state.store()).list().await?;
    let products = ProductRepository::new(state.store()).list().await?;

    let rows = filter_records(&categories, &search.q)
        .into_iter()
        .map(|category| CategoryRow {
            product_count: products
                .iter()
                .filter(|p| p.category_id == category.id)
                .count(),
            category: category.clone(),
        })
        .collect();

    Ok(CategoryIndexTemplate {
        layout: Layout::new(&state, Some(admin)),
        flash: flash.into(),
        query: search.q,
        total: categories.len(),
        rows,
    })
}

/// Display the new category form.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
#[instrument(skip_all)]
pub async fn new(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(flash): Query<FlashQuery>,
) -> Result<CategoryFormTemplate> {
    let id = CategoryRepository::new(state.store()).next_id().await?;
    Ok(CategoryFormTemplate {
        layout: Layout::new(&state, Some(admin)),
        flash: flash.into(),
        heading: "New category".to_owned(),
        action: INDEX_PATH.to_owned(),
        id,
        form: CategoryForm::default(),
    })
}

/// Handle the new category form.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Form(form): Form<CategoryForm>,
) -> Response {
    let new_category = match form.parse() {
        Ok(category) => category,
        Err(code) => return redirect_with("/admin/categories/new", FlashKind::Error, code),
    };

    match CategoryRepository::new(state.store()).create(&new_category).await {
        Ok(_) => redirect_with(INDEX_PATH, FlashKind::Success, "category_created"),
        Err(e) => {
            tracing::error!("Failed to create category: {}", e);
            redirect_with("/admin/categories/new", FlashKind::Error, repository_error_code(&e))
        }
    }
}

/// Display the edit form for a category.
///
/// # Errors
///
/// Returns 404 if the category does not exist.
#[instrument(skip(state, admin, flash))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<String>,
    Query(flash): Query<FlashQuery>,
) -> Result<CategoryFormTemplate> {
    let key = parse_key(&key)?;
    let category = CategoryRepository::new(state.store())
        .get(key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {key}")))?;

    Ok(CategoryFormTemplate {
        layout: Layout::new(&state, Some(admin)),
        flash: flash.into(),
        heading: format!("Edit {}", category.name),
        action: format!("{INDEX_PATH}/{key}"),
        id: category.id,
        form: CategoryForm {
            name: category.name,
        },
    })
}

/// Handle the edit form.
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(key): Path<String>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let Ok(key) = parse_key(&key) else {
        return redirect_with(INDEX_PATH, FlashKind::Error, "not_found");
    };

    let patch = match form.parse() {
        Ok(category) => CategoryPatch {
            name: Some(category.name),
        },
        Err(code) => {
            return redirect_with(&format!("{INDEX_PATH}/{key}/edit"), FlashKind::Error, code);
        }
    };

    match CategoryRepository::new(state.store()).update(key, &patch).await {
        Ok(_) => redirect_with(INDEX_PATH, FlashKind::Success, "category_updated"),
        Err(e) => {
            tracing::error!("Failed to update category {}: {}", key, e);
            redirect_with(INDEX_PATH, FlashKind::Error, repository_error_code(&e))
        }
    }
}

/// Handle category deletion.
///
/// Products keep their (now dangling) category id.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(key): Path<String>,
) -> Response {
    let Ok(key) = parse_key(&key) else {
        return redirect_with(INDEX_PATH, FlashKind::Error, "not_found");
    };

    match CategoryRepository::new(state.store()).delete(key).await {
        Ok(()) => redirect_with(INDEX_PATH, FlashKind::Success, "category_deleted"),
        Err(e) => {
            tracing::error!("Failed to delete category {}: {}", key, e);
            redirect_with(INDEX_PATH, FlashKind::Error, repository_error_code(&e))
        }
    }
}
