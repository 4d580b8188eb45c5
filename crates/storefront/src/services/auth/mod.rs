//! Authentication service.
//!
//! Provides password registration and login. OAuth sign-in lives in
//! [`crate::services::oauth`] and lands here through
//! [`AuthService::find_or_register_oauth`].

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use gremco_core::Email;

use crate::db::{DocumentStore, RepositoryError, UserRepository};
use crate::models::{NewUser, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Prefix shared by every Argon2 PHC string.
const ARGON2_PREFIX: &str = "$argon2";

/// Registration form input.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'i> {
    pub name: &'i str,
    pub email: &'i str,
    pub password: &'i str,
    pub password_confirmation: &'i str,
    pub shipping_address: &'i str,
}

/// Identity returned by an OAuth provider.
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub email: Email,
    pub name: String,
}

/// Authentication service.
///
/// Handles user registration and password login.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a DocumentStore) -> Self {
        Self {
            users: UserRepository::new(store),
        }
    }

    /// Register a new customer account with email and password.
    ///
    /// New accounts are never admins.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingName` if the name is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` or `AuthError::PasswordMismatch` if
    /// the password is rejected.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register_with_password(&self, input: Registration<'_>) -> Result<User, AuthError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let email = Email::parse(input.email)?;
        validate_new_password(input.password, input.password_confirmation)?;

        let password_hash = hash_password(input.password)?;

        let user = self
            .users
            .create(&NewUser {
                name: name.to_owned(),
                email,
                password_hash: Some(password_hash),
                shipping_address: input.shipping_address.trim().to_owned(),
                is_admin: false,
            })
            .await
            .map_err(registration_error)?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong
    /// or the account has no password.
    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, hash)?;

        Ok(user)
    }

    /// Find the account for an OAuth identity, registering it on first sign-in.
    ///
    /// Accounts created here have no password, no shipping address, and are
    /// never admins.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store fails.
    pub async fn find_or_register_oauth(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<User, AuthError> {
        if let Some(user) = self.users.get_by_email(&identity.email).await? {
            return Ok(user);
        }

        let name = if identity.name.trim().is_empty() {
            identity.email.local_part().to_owned()
        } else {
            identity.name.trim().to_owned()
        };

        let user = self
            .users
            .create(&NewUser {
                name,
                email: identity.email.clone(),
                password_hash: None,
                shipping_address: String::new(),
                is_admin: false,
            })
            .await
            .map_err(registration_error)?;

        tracing::info!(user_id = %user.id, "Registered account from OAuth sign-in");
        Ok(user)
    }
}

fn registration_error(err: RepositoryError) -> AuthError {
    match err {
        RepositoryError::EmailTaken => AuthError::UserAlreadyExists,
        other => AuthError::Repository(other),
    }
}

/// Check a new password and its confirmation.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
/// Returns `AuthError::PasswordMismatch` if the confirmation differs.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password != confirmation {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the hash is unparseable or the
/// password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Whether a stored value is already an Argon2 hash rather than plaintext.
#[must_use]
pub fn is_password_hash(value: &str) -> bool {
    value.starts_with(ARGON2_PREFIX)
}
