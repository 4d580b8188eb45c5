//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in user, or an admin, in route
//! handlers.
//!
//! `RequireAuth` and `RequireAdmin` re-read the account from the store on
//! every request, so deleting a user or revoking the admin flag takes effect
//! on sessions that are already open.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::models::{CurrentUser, User, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// If the user is not logged in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a signed-in admin.
///
/// Anonymous visitors are sent to the login page; signed-in users without the
/// admin flag get `403 Forbidden`.
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when authentication is required but missing or insufficient.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Signed in, but not allowed.
    Forbidden,
    /// The account could not be re-read from the store.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

fn missing_user(parts: &Parts) -> AuthRejection {
    if parts.uri.path().starts_with("/api/") {
        AuthRejection::Unauthorized
    } else {
        AuthRejection::RedirectToLogin
    }
}

/// Load the stored account behind a session.
///
/// Returns `Ok(None)` when the account was deleted after sign-in; the
/// session is flushed so the stale user is not shown again.
async fn reload_user(
    parts: &Parts,
    state: &AppState,
    session_user: &CurrentUser,
) -> Result<Option<User>, AuthRejection> {
    let stored = UserRepository::new(state.store())
        .get(session_user.key)
        .await
        .map_err(|e| {
            tracing::error!(user_id = %session_user.id, error = %e, "Failed to reload session user");
            AuthRejection::Internal
        })?;

    if stored.is_none() {
        tracing::warn!(user_id = %session_user.id, "Session user no longer exists");
        if let Some(session) = parts.extensions.get::<Session>()
            && let Err(e) = session.flush().await
        {
            tracing::error!("Failed to flush stale session: {}", e);
        }
    }
    Ok(stored)
}

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session_user = current_user(parts).await.ok_or_else(|| missing_user(parts))?;
        let state = AppState::from_ref(state);
        let user = reload_user(parts, &state, &session_user)
            .await?
            .ok_or_else(|| missing_user(parts))?;
        Ok(Self(CurrentUser::from(&user)))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session_user = current_user(parts).await.ok_or_else(|| missing_user(parts))?;
        let state = AppState::from_ref(state);
        let Some(user) = reload_user(parts, &state, &session_user).await? else {
            return Err(AuthRejection::Forbidden);
        };
        if !user.is_admin {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Non-admin denied admin route");
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(CurrentUser::from(&user)))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// Helper to set the current user in the session.
///
/// Cycles the session id first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the whole session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
