//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use gremco_core::{DocumentKey, Email, UserId};

use super::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Store document key of the account.
    pub key: DocumentKey,
    /// Numeric account id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: Email,
    /// Admin console access.
    pub is_admin: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            key: user.key,
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the pending OAuth authorization (CSRF state + provider).
    pub const OAUTH_PENDING: &str = "oauth_pending";
}
