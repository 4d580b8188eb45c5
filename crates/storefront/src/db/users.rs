//! User repository.
//!
//! Emails are unique per collection, compared case-insensitively. The check
//! is a scan before the write, so like id allocation it can race.

use serde::{Deserialize, Serialize};

use gremco_core::{DocumentKey, Email, UserId};

use super::{Collection, DocumentStore, RepositoryError, StoredDocument, decode, encode};
use crate::models::{NewUser, User, UserPatch, today, user_date_label};

#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    id: UserId,
    name: String,
    email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password_hash: Option<String>,
    #[serde(default)]
    shipping_address: String,
    #[serde(default)]
    is_admin: bool,
    #[serde(default)]
    registered_on: String,
}

impl UserDocument {
    fn into_user(self, key: DocumentKey) -> User {
        User {
            key,
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            shipping_address: self.shipping_address,
            is_admin: self.is_admin,
            registered_on: self.registered_on,
        }
    }
}

fn to_user(doc: &StoredDocument) -> Result<User, RepositoryError> {
    decode::<UserDocument>(doc).map(|body| body.into_user(doc.key))
}

/// Repository for user documents.
pub struct UserRepository<'a> {
    store: &'a DocumentStore,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// All users, sorted by numeric id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a document is malformed.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let docs = self.store.list(Collection::Users).await?;
        let mut users = docs.iter().map(to_user).collect::<Result<Vec<_>, _>>()?;
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    /// Get a user by document key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, key: DocumentKey) -> Result<Option<User>, RepositoryError> {
        self.store
            .get(Collection::Users, key)
            .await?
            .as_ref()
            .map(to_user)
            .transpose()
    }

    /// Get a user by email address, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a document is malformed.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|user| user.email.matches(email)))
    }

    /// Id the next created user will receive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the collection cannot be read.
    pub async fn next_id(&self) -> Result<UserId, RepositoryError> {
        super::next_id(self.store, Collection::Users)
            .await
            .map(UserId::new)
    }

    /// Create a user, allocating the next id and stamping today's date.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::EmailTaken` if the email is already registered.
    /// Returns `RepositoryError::Conflict` if the allocated id was taken
    /// concurrently.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewUser) -> Result<User, RepositoryError> {
        if self.get_by_email(&new.email).await?.is_some() {
            return Err(RepositoryError::EmailTaken);
        }

        let body = UserDocument {
            id: self.next_id().await?,
            name: new.name.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            shipping_address: new.shipping_address.clone(),
            is_admin: new.is_admin,
            registered_on: user_date_label(today()),
        };
        let key = self.store.insert(Collection::Users, encode(&body)?).await?;

        tracing::info!(user_id = %body.id, key = %key, "User created");
        Ok(body.into_user(key))
    }

    /// Apply a partial update and return the updated user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::EmailTaken` if the new email belongs to
    /// another user.
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update(&self, key: DocumentKey, patch: &UserPatch) -> Result<User, RepositoryError> {
        if let Some(email) = &patch.email
            && let Some(existing) = self.get_by_email(email).await?
            && existing.key != key
        {
            return Err(RepositoryError::EmailTaken);
        }

        self.store
            .merge(Collection::Users, key, encode(patch)?)
            .await?;
        self.get(key).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn delete(&self, key: DocumentKey) -> Result<(), RepositoryError> {
        self.store.delete(Collection::Users, key).await?;
        tracing::info!(key = %key, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Cliente".to_owned(),
            email: Email::parse(email).unwrap(),
            password_hash: None,
            shipping_address: "Av. Siempre Viva 742".to_owned(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_create_stamps_slash_date_and_id() {
        let store = DocumentStore::memory();
        let user = UserRepository::new(&store)
            .create(&new_user("a@example.com"))
            .await
            .unwrap();
        assert_eq!(user.id, UserId::new(1));
        assert_eq!(user.registered_on.matches('/').count(), 2);
    }

    #[tokio::test]
    async fn test_get_by_email_ignores_case() {
        let store = DocumentStore::memory();
        let repo = UserRepository::new(&store);
        let created = repo.create(&new_user("Cliente@Example.com")).await.unwrap();

        let found = repo
            .get_by_email(&Email::parse("cliente@example.COM").unwrap())
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.key), Some(created.key));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_taken() {
        let store = DocumentStore::memory();
        let repo = UserRepository::new(&store);
        repo.create(&new_user("a@example.com")).await.unwrap();
        assert!(matches!(
            repo.create(&new_user("A@EXAMPLE.COM")).await,
            Err(RepositoryError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_update_without_password_keeps_hash() {
        let store = DocumentStore::memory();
        let repo = UserRepository::new(&store);
        let mut input = new_user("a@example.com");
        input.password_hash = Some("$argon2id$v=19$stub".to_owned());
        let user = repo.create(&input).await.unwrap();

        let updated = repo
            .update(
                user.key,
                &UserPatch {
                    name: Some("Nuevo".to_owned()),
                    is_admin: Some(true),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Nuevo");
        assert!(updated.is_admin);
        assert_eq!(updated.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn test_update_to_taken_email_is_rejected() {
        let store = DocumentStore::memory();
        let repo = UserRepository::new(&store);
        repo.create(&new_user("a@example.com")).await.unwrap();
        let b = repo.create(&new_user("b@example.com")).await.unwrap();

        let patch = UserPatch {
            email: Some(Email::parse("a@example.com").unwrap()),
            ..UserPatch::default()
        };
        assert!(matches!(
            repo.update(b.key, &patch).await,
            Err(RepositoryError::EmailTaken)
        ));

        let same = UserPatch {
            email: Some(Email::parse("B@example.com").unwrap()),
            ..UserPatch::default()
        };
        assert!(repo.update(b.key, &same).await.is_ok());
    }
}
