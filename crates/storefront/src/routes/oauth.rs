//! OAuth sign-in route handlers.
//!
//! `GET /auth/oauth/{provider}` redirects to the provider,
//! `GET /auth/oauth/{provider}/callback` completes the sign-in.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::{User, session_keys};
use crate::routes::auth::start_session;
use crate::routes::view::{FlashKind, redirect_with};
use crate::services::auth::AuthService;
use crate::services::oauth::{PendingAuthorization, Provider};
use crate::state::AppState;

/// Parameters the provider appends to the callback URL.
#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Redirect to the provider's consent page.
///
/// # Errors
///
/// Returns 404 for unknown or unconfigured providers.
#[instrument(skip(state, session))]
pub async fn start(
    State(state): State<AppState>,
    session: Session,
    Path(provider): Path<String>,
) -> Result<Response> {
    let provider: Provider = provider.parse()?;
    let pending = PendingAuthorization::new(provider);
    let url = state.oauth().authorization_url(&pending)?;

    session
        .insert(session_keys::OAUTH_PENDING, &pending)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store OAuth state: {e}")))?;

    Ok(Redirect::to(&url).into_response())
}

/// Complete the sign-in after the provider redirects back.
///
/// # Errors
///
/// Returns 404 for unknown providers. Every other failure redirects to the
/// login page with an error code.
#[instrument(skip(state, session, query))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    let provider: Provider = provider.parse()?;

    // Single use: the pending state is consumed whatever the outcome.
    let pending = session
        .remove::<PendingAuthorization>(session_keys::OAUTH_PENDING)
        .await
        .ok()
        .flatten();

    if let Some(error) = query.error {
        tracing::info!(provider = provider.slug(), error, "OAuth consent denied");
        return Ok(redirect_with("/auth/login", FlashKind::Error, "oauth_denied"));
    }

    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        return Ok(redirect_with("/auth/login", FlashKind::Error, "oauth_state"));
    };
    if !pending.is_some_and(|p| p.matches(provider, &returned_state)) {
        tracing::warn!(provider = provider.slug(), "OAuth state mismatch");
        return Ok(redirect_with("/auth/login", FlashKind::Error, "oauth_state"));
    }

    match complete_sign_in(&state, provider, &code).await {
        Ok(user) => Ok(start_session(&session, &user, "/auth/login").await),
        Err(e) => {
            tracing::warn!(provider = provider.slug(), error = %e, "OAuth sign-in failed");
            Ok(redirect_with("/auth/login", FlashKind::Error, "oauth_failed"))
        }
    }
}

async fn complete_sign_in(state: &AppState, provider: Provider, code: &str) -> Result<User> {
    let token = state.oauth().exchange_code(provider, code).await?;
    let identity = state.oauth().fetch_identity(provider, &token).await?;
    let user = AuthService::new(state.store())
        .find_or_register_oauth(&identity)
        .await?;
    tracing::info!(provider = provider.slug(), user_id = %user.id, "OAuth sign-in");
    Ok(user)
}
