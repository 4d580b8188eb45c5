//! User management screens.
//!
//! Passwords typed here are hashed before they reach the store. Leaving the
//! password blank on the edit form keeps the current hash.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use tracing::instrument;

use gremco_core::{Email, UserId, filter_records};

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{NewUser, User, UserPatch};
use crate::routes::admin::SearchQuery;
use crate::routes::parse_key;
use crate::routes::view::{Flash, FlashKind, FlashQuery, Layout, redirect_with, repository_error_code};
use crate::services::auth::{AuthError, hash_password, validate_new_password};
use crate::state::AppState;

const INDEX_PATH: &str = "/admin/users";

// =============================================================================
// Form Types
// =============================================================================

/// User form data.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub shipping_address: String,
    /// Checkbox: present (any value) when ticked.
    pub is_admin: Option<String>,
}

/// Validated form fields, with the password still in plaintext.
struct ValidUser {
    name: String,
    email: Email,
    password: Option<String>,
    shipping_address: String,
    is_admin: bool,
}

impl UserForm {
    fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.to_string(),
            password: String::new(),
            shipping_address: user.shipping_address.clone(),
            is_admin: user.is_admin.then(|| "on".to_owned()),
        }
    }

    fn is_admin_checked(&self) -> bool {
        self.is_admin.is_some()
    }

    fn validate(&self) -> std::result::Result<ValidUser, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("missing_name");
        }
        let email = Email::parse(&self.email).map_err(|_| "invalid_email")?;
        let password = if self.password.is_empty() {
            None
        } else {
            validate_new_password(&self.password, &self.password).map_err(|e| e.code())?;
            Some(self.password.clone())
        };

        Ok(ValidUser {
            name: name.to_owned(),
            email,
            password,
            shipping_address: self.shipping_address.trim().to_owned(),
            is_admin: self.is_admin_checked(),
        })
    }
}

fn hash(password: Option<&str>) -> std::result::Result<Option<String>, AuthError> {
    password.map(hash_password).transpose()
}

// =============================================================================
// Templates
// =============================================================================

/// User list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users/index.html")]
pub struct UserIndexTemplate {
    pub layout: Layout,
    pub flash: Flash,
    pub query: String,
    pub total: usize,
    pub users: Vec<User>,
}

/// User detail template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users/show.html")]
pub struct UserShowTemplate {
    pub layout: Layout,
    pub flash: Flash,
    pub user: User,
}

/// User create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users/form.html")]
pub struct UserFormTemplate {
    pub layout: Layout,
    pub flash: Flash,
    pub heading: String,
    pub action: String,
    pub id: UserId,
    pub form: UserForm,
    /// Edit forms may leave the password blank.
    pub password_required: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// List users, filtered by `?q=`.
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
) -> Result<UserIndexTemplate> {
    let users = UserRepository::new(state.store()).list().await?;
    let matching = filter_records(&users, &search.q).into_iter().cloned().collect();

    Ok(UserIndexTemplate {
        layout: Layout::new(&state, Some(admin)),
        flash: flash.into(),
        query: search.q,
        total: users.len(),
        users: matching,
    })
}

/// Display one user.
///
/// # Errors
///
/// Returns 404 if the user does not exist.
#[instrument(skip(state, admin, flash))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<String>,
    Query(flash): Query<FlashQuery>,
) -> Result<UserShowTemplate> {
    let user = load(&state, &key).await?;
    Ok(UserShowTemplate {
        layout: Layout::new(&state, Some(admin)),
        flash: flash.into(),
        user,
    })
}

/// Display the new user form.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
#[instrument(skip_all)]
pub async fn new(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(flash): Query<FlashQuery>,
) -> Result<UserFormTemplate> {
    let id = UserRepository::new(state.store()).next_id().await?;
    Ok(UserFormTemplate {
        layout: Layout::new(&state, Some(admin)),
        flash: flash.into(),
        heading: "New user".to_owned(),
        action: INDEX_PATH.to_owned(),
        id,
        form: UserForm::default(),
        password_required: true,
    })
}

/// Handle the new user form.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Form(form): Form<UserForm>,
) -> Response {
    const NEW_PATH: &str = "/admin/users/new";

    let valid = match form.validate() {
        Ok(valid) if valid.password.is_some() => valid,
        Ok(_) => return redirect_with(NEW_PATH, FlashKind::Error, "weak_password"),
        Err(code) => return redirect_with(NEW_PATH, FlashKind::Error, code),
    };
    let password_hash = match hash(valid.password.as_deref()) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to hash password: {}", e);
            return redirect_with(NEW_PATH, FlashKind::Error, e.code());
        }
    };

    let new_user = NewUser {
        name: valid.name,
        email: valid.email,
        password_hash,
        shipping_address: valid.shipping_address,
        is_admin: valid.is_admin,
    };

    match UserRepository::new(state.store()).create(&new_user).await {
        Ok(_) => redirect_with(INDEX_PATH, FlashKind::Success, "user_created"),
        Err(e) => {
            tracing::warn!("Failed to create user: {}", e);
            redirect_with(NEW_PATH, FlashKind::Error, repository_error_code(&e))
        }
    }
}

/// Display the edit form for a user.
///
/// # Errors
///
/// Returns 404 if the user does not exist.
#[instrument(skip(state, admin, flash))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<String>,
    Query(flash): Query<FlashQuery>,
) -> Result<UserFormTemplate> {
    let user = load(&state, &key).await?;
    Ok(UserFormTemplate {
        layout: Layout::new(&state, Some(admin)),
        flash: flash.into(),
        heading: format!("Edit {}", user.name),
        action: format!("{INDEX_PATH}/{}", user.key),
        id: user.id,
        form: UserForm::from_user(&user),
        password_required: false,
    })
}

/// Handle the edit form.
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(key): Path<String>,
    Form(form): Form<UserForm>,
) -> Response {
    let Ok(key) = parse_key(&key) else {
        return redirect_with(INDEX_PATH, FlashKind::Error, "not_found");
    };
    let edit_path = format!("{INDEX_PATH}/{key}/edit");

    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(code) => return redirect_with(&edit_path, FlashKind::Error, code),
    };
    let password_hash = match hash(valid.password.as_deref()) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to hash password: {}", e);
            return redirect_with(&edit_path, FlashKind::Error, e.code());
        }
    };

    let patch = UserPatch {
        name: Some(valid.name),
        email: Some(valid.email),
        password_hash,
        shipping_address: Some(valid.shipping_address),
        is_admin: Some(valid.is_admin),
    };

    match UserRepository::new(state.store()).update(key, &patch).await {
        Ok(user) => redirect_with(
            &format!("{INDEX_PATH}/{}", user.key),
            FlashKind::Success,
            "user_updated",
        ),
        Err(e) => {
            tracing::warn!("Failed to update user {}: {}", key, e);
            redirect_with(&edit_path, FlashKind::Error, repository_error_code(&e))
        }
    }
}

/// Handle user deletion.
///
/// Admins cannot delete their own account from here.
#[instrument(skip(state, admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<String>,
) -> Response {
    let Ok(key) = parse_key(&key) else {
        return redirect_with(INDEX_PATH, FlashKind::Error, "not_found");
    };
    if key == admin.key {
        return redirect_with(INDEX_PATH, FlashKind::Error, "self_delete");
    }

    match UserRepository::new(state.store()).delete(key).await {
        Ok(()) => redirect_with(INDEX_PATH, FlashKind::Success, "user_deleted"),
        Err(e) => {
            tracing::error!("Failed to delete user {}: {}", key, e);
            redirect_with(INDEX_PATH, FlashKind::Error, repository_error_code(&e))
        }
    }
}

async fn load(state: &AppState, key: &str) -> Result<User> {
    let key = parse_key(key)?;
    UserRepository::new(state.store())
        .get(key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {key}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> UserForm {
        UserForm {
            name: " Ana Torres ".to_owned(),
            email: "ana@example.org".to_owned(),
            password: "correct horse".to_owned(),
            shipping_address: "Calle 5 #12".to_owned(),
            is_admin: None,
        }
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        let valid = form().validate().unwrap();
        assert_eq!(valid.name, "Ana Torres");
        assert_eq!(valid.password.as_deref(), Some("correct horse"));
        assert!(!valid.is_admin);
    }

    #[test]
    fn test_blank_password_is_absent() {
        let valid = UserForm { password: String::new(), ..form() }.validate().unwrap();
        assert!(valid.password.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        assert_eq!(UserForm { name: String::new(), ..form() }.validate().err(), Some("missing_name"));
        assert_eq!(UserForm { email: "nope".to_owned(), ..form() }.validate().err(), Some("invalid_email"));
        assert_eq!(UserForm { password: "short".to_owned(), ..form() }.validate().err(), Some("weak_password"));
    }

    #[test]
    fn test_checkbox_sets_admin() {
        let valid = UserForm { is_admin: Some("on".to_owned()), ..form() }.validate().unwrap();
        assert!(valid.is_admin);
    }
}
