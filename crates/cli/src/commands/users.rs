//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin account; the password is the first line of stdin
//! gremco-cli users create-admin -e admin@example.com -n "Admin Name"
//!
//! # Hash plaintext passwords left by a legacy import
//! gremco-cli users hash-passwords
//! ```

use std::io::BufRead;

use gremco_core::Email;
use gremco_storefront::db::{DocumentStore, UserRepository};
use gremco_storefront::models::{NewUser, UserPatch};
use gremco_storefront::services::auth::{hash_password, is_password_hash, validate_new_password};

use super::{CommandError, connect};

/// Create a new admin user.
///
/// # Errors
///
/// Returns an error if the email is invalid, the password is too short, the
/// email is already registered, or the database is unreachable.
pub async fn create_admin(email: &str, name: &str) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(|source| CommandError::InvalidEmail {
        input: email.to_owned(),
        source,
    })?;

    tracing::info!("Reading password from stdin...");
    let mut password = String::new();
    std::io::stdin().lock().read_line(&mut password)?;
    let password = password.trim_end_matches(['\r', '\n']);
    validate_new_password(password, password)?;

    let store = DocumentStore::Postgres(connect().await?);
    let user = UserRepository::new(&store)
        .create(&NewUser {
            name: name.trim().to_owned(),
            email,
            password_hash: Some(hash_password(password)?),
            shipping_address: String::new(),
            is_admin: true,
        })
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(())
}

/// Hash every stored password that is not already an Argon2 hash.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an update fails.
pub async fn hash_passwords() -> Result<(), CommandError> {
    let store = DocumentStore::Postgres(connect().await?);
    let hashed = hash_plaintext_passwords(&store).await?;
    tracing::info!("Hashed {} plaintext password(s)", hashed);
    Ok(())
}

/// Replace plaintext `password_hash` values with Argon2 hashes.
///
/// Returns the number of users updated.
///
/// # Errors
///
/// Returns an error if a read, hash or update fails.
pub async fn hash_plaintext_passwords(store: &DocumentStore) -> Result<usize, CommandError> {
    let users = UserRepository::new(store);
    let mut hashed = 0;

    for user in users.list().await? {
        let Some(stored) = user.password_hash.as_deref() else {
            continue;
        };
        if is_password_hash(stored) {
            continue;
        }

        let patch = UserPatch {
            password_hash: Some(hash_password(stored)?),
            ..UserPatch::default()
        };
        users.update(user.key, &patch).await?;
        tracing::info!(user_id = %user.id, "Hashed plaintext password");
        hashed += 1;
    }

    Ok(hashed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gremco_storefront::services::auth::verify_password;

    use super::*;

    async fn user(store: &DocumentStore, email: &str, password_hash: Option<String>) {
        UserRepository::new(store)
            .create(&NewUser {
                name: "Legacy".to_owned(),
                email: Email::parse(email).unwrap(),
                password_hash,
                shipping_address: String::new(),
                is_admin: false,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_admin_rejects_malformed_email_before_reading_stdin() {
        let err = create_admin("admin.example.org", "Admin").await.unwrap_err();
        match err {
            CommandError::InvalidEmail { input, source } => {
                assert_eq!(input, "admin.example.org");
                assert_eq!(source, gremco_core::EmailError::MissingAtSymbol);
            }
            other => panic!("expected InvalidEmail, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_hashes_only_plaintext_passwords() {
        let store = DocumentStore::memory();
        user(&store, "plain@example.org", Some("vieja-clave".to_owned())).await;
        user(&store, "hashed@example.org", Some(hash_password("ya-hasheada").unwrap())).await;
        user(&store, "oauth@example.org", None).await;

        assert_eq!(hash_plaintext_passwords(&store).await.unwrap(), 1);

        let users = UserRepository::new(&store).list().await.unwrap();
        let migrated = users[0].password_hash.as_deref().unwrap();
        assert!(is_password_hash(migrated));
        assert!(verify_password("vieja-clave", migrated).is_ok());
        assert!(users[2].password_hash.is_none());

        // Running again is a no-op.
        assert_eq!(hash_plaintext_passwords(&store).await.unwrap(), 0);
    }
}
