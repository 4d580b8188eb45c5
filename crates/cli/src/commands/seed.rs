//! Seed the document store from a YAML file.
//!
//! ```yaml
//! categories:
//!   - name: Muebles
//! products:
//!   - name: Mesa de roble
//!     price: 120.50
//!     stock: 3
//!     category: Muebles
//! users:
//!   - name: Ana Torres
//!     email: ana@example.org
//!     password: una-clave-larga
//!     is_admin: true
//! ```
//!
//! Records go through the same repositories as the web forms, so ids are
//! allocated sequentially and passwords are hashed.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use gremco_core::{CategoryId, Email, Price};
use gremco_storefront::db::{CategoryRepository, DocumentStore, ProductRepository, UserRepository};
use gremco_storefront::models::{NewCategory, NewProduct, NewUser};
use gremco_storefront::services::auth::{hash_password, validate_new_password};

use super::{CommandError, connect};

/// Top-level seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedFile {
    pub categories: Vec<SeedCategory>,
    pub products: Vec<SeedProduct>,
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCategory {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Category name from this file or already in the store.
    pub category: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    /// Plaintext; hashed before it is stored. Omit for OAuth-only accounts.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// What a seed run inserted.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub users: usize,
}

/// Seed the database from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if any record
/// fails to insert. Records inserted before the failure are kept.
pub async fn from_file(file_path: &str) -> Result<SeedSummary, CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading seed data from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let store = DocumentStore::Postgres(connect().await?);
    let summary = seed_store(&store, &seed).await?;

    info!("Seeding complete!");
    info!("  Categories inserted: {}", summary.categories);
    info!("  Products inserted: {}", summary.products);
    info!("  Users inserted: {}", summary.users);
    Ok(summary)
}

/// Insert every record of `seed`, categories first.
///
/// # Errors
///
/// Returns `CommandError::InvalidSeed` for unknown category names, invalid
/// emails or weak passwords, and repository errors for failed writes.
pub async fn seed_store(store: &DocumentStore, seed: &SeedFile) -> Result<SeedSummary, CommandError> {
    let mut summary = SeedSummary::default();

    let categories = CategoryRepository::new(store);
    for category in &seed.categories {
        categories.create(&NewCategory::new(&category.name)).await?;
        summary.categories += 1;
    }

    let known = categories.list().await?;
    let category_id = |name: &str| -> Result<CategoryId, CommandError> {
        known
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
            .map(|c| c.id)
            .ok_or_else(|| CommandError::InvalidSeed(format!("unknown category: {name}")))
    };

    let products = ProductRepository::new(store);
    for product in &seed.products {
        let new_product = NewProduct {
            name: product.name.trim().to_owned(),
            description: product.description.clone(),
            price: Price::new(product.price.amount())
                .map_err(|e| CommandError::InvalidSeed(format!("{}: {e}", product.name)))?,
            stock: product.stock,
            image_url: product.image_url.clone(),
            category_id: category_id(&product.category)?,
        };
        products.create(&new_product).await?;
        summary.products += 1;
    }

    let users = UserRepository::new(store);
    for user in &seed.users {
        let email = Email::parse(&user.email)
            .map_err(|e| CommandError::InvalidSeed(format!("{}: {e}", user.email)))?;
        let password_hash = match &user.password {
            Some(password) => {
                validate_new_password(password, password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };
        users
            .create(&NewUser {
                name: user.name.trim().to_owned(),
                email,
                password_hash,
                shipping_address: user.shipping_address.clone(),
                is_admin: user.is_admin,
            })
            .await?;
        summary.users += 1;
    }

    Ok(summary)
}
