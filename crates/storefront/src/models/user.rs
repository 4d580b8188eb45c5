//! User domain types.

use core::fmt;

use serde::Serialize;

use gremco_core::{DocumentKey, Email, Searchable, UserId};

/// A storefront account.
///
/// OAuth-registered accounts have no password hash.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    /// Store document key.
    pub key: DocumentKey,
    /// Sequential numeric id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: Email,
    /// Argon2 PHC string, if the account can log in with a password.
    pub password_hash: Option<String>,
    /// Free-form shipping address.
    pub shipping_address: String,
    /// Whether the account may use the admin console.
    pub is_admin: bool,
    /// Registration date, as `dd/MM/yyyy`.
    pub registered_on: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field(
                "password_hash",
                &self.password_hash.as_ref().map(|_| "[REDACTED]"),
            )
            .field("shipping_address", &self.shipping_address)
            .field("is_admin", &self.is_admin)
            .field("registered_on", &self.registered_on)
            .finish()
    }
}

impl Searchable for User {
    // Never includes the password hash.
    fn field_values(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.email.to_string(),
            self.shipping_address.clone(),
            self.is_admin.to_string(),
            self.registered_on.clone(),
        ]
    }
}

/// Input for creating a user.
///
/// `password_hash` must already be hashed; plaintext never reaches the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: Option<String>,
    pub shipping_address: String,
    pub is_admin: bool,
}

/// Partial update for a user. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}
