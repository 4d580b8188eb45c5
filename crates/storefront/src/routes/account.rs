//! Account route handlers.
//!
//! These routes require a signed-in user. `/account` renders the profile
//! page; `/api/account` returns the same data as JSON.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use gremco_core::UserId;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, User};
use crate::routes::view::Layout;
use crate::state::AppState;

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/show.html")]
pub struct AccountTemplate {
    pub layout: Layout,
    pub user: User,
}

/// Account data exposed over JSON. Never includes the password hash.
#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub shipping_address: String,
    pub is_admin: bool,
    pub registered_on: String,
    pub has_password: bool,
}

impl From<User> for AccountSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.into_inner(),
            shipping_address: user.shipping_address,
            is_admin: user.is_admin,
            registered_on: user.registered_on,
            has_password: user.password_hash.is_some(),
        }
    }
}

async fn load(state: &AppState, current: &CurrentUser) -> Result<User> {
    UserRepository::new(state.store())
        .get(current.key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", current.key)))
}

/// Display the signed-in user's account.
///
/// # Errors
///
/// Returns an error if the account cannot be read.
#[instrument(skip(state, current), fields(user_id = %current.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<AccountTemplate> {
    let user = load(&state, &current).await?;
    Ok(AccountTemplate {
        layout: Layout::new(&state, Some(current)),
        user,
    })
}

/// JSON view of the signed-in user's account.
///
/// # Errors
///
/// Returns an error if the account cannot be read.
#[instrument(skip(state, current), fields(user_id = %current.id))]
pub async fn summary(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<AccountSummary>> {
    let user = load(&state, &current).await?;
    Ok(Json(AccountSummary::from(user)))
}
