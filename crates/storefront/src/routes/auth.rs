//! Authentication route handlers.
//!
//! Email/password login and registration. OAuth sign-in lives in
//! [`super::oauth`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::clear_sentry_user;
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::routes::view::{Flash, FlashKind, FlashQuery, Layout, redirect_with};
use crate::services::auth::{AuthService, MIN_PASSWORD_LENGTH, Registration};
use crate::services::oauth::Provider;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub shipping_address: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub flash: Flash,
    pub providers: Vec<Provider>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub flash: Flash,
    pub providers: Vec<Provider>,
    pub min_password_length: usize,
}

/// Where to send a user after signing in.
pub(crate) const fn landing_path(user: &User) -> &'static str {
    if user.is_admin { "/admin" } else { "/" }
}

/// Store the signed-in user in the session and redirect to their landing page.
pub(crate) async fn start_session(session: &Session, user: &User, login_path: &str) -> Response {
    if let Err(e) = set_current_user(session, &CurrentUser::from(user)).await {
        tracing::error!("Failed to set session: {}", e);
        return redirect_with(login_path, FlashKind::Error, "session");
    }
    crate::error::set_sentry_user(&user.id, Some(user.email.as_str()));
    Redirect::to(landing_path(user)).into_response()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(flash): Query<FlashQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        layout: Layout::new(&state, None),
        flash: flash.into(),
        providers: state.oauth().enabled_providers(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match AuthService::new(state.store())
        .login_with_password(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User signed in");
            start_session(&session, &user, "/auth/login").await
        }
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            redirect_with("/auth/login", FlashKind::Error, e.code())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(flash): Query<FlashQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    RegisterTemplate {
        layout: Layout::new(&state, None),
        flash: flash.into(),
        providers: state.oauth().enabled_providers(),
        min_password_length: MIN_PASSWORD_LENGTH,
    }
    .into_response()
}

/// Handle registration form submission.
///
/// The new account is signed in immediately.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let registration = Registration {
        name: &form.name,
        email: &form.email,
        password: &form.password,
        password_confirmation: &form.password_confirm,
        shipping_address: &form.shipping_address,
    };

    match AuthService::new(state.store())
        .register_with_password(registration)
        .await
    {
        Ok(user) => {
            if let Err(e) = set_current_user(&session, &CurrentUser::from(&user)).await {
                tracing::error!("Failed to set session after registration: {}", e);
                return redirect_with("/auth/login", FlashKind::Error, "session");
            }
            redirect_with("/", FlashKind::Success, "registered")
        }
        Err(e) => {
            tracing::warn!("Registration failed: {}", e);
            redirect_with("/auth/register", FlashKind::Error, e.code())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();
    redirect_with("/", FlashKind::Success, "logged_out")
}
