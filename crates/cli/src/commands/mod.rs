//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod users;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use gremco_core::EmailError;
use gremco_storefront::db::{self, RepositoryError};
use gremco_storefront::services::auth::AuthError;

/// Errors shared by the subcommands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Store read or write failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password validation or hashing failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Input file or stdin could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An email given on the command line is malformed.
    #[error("Invalid email address {input:?}: {source}")]
    InvalidEmail {
        input: String,
        #[source]
        source: EmailError,
    },

    /// Seed file is not valid YAML for the expected shape.
    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Seed file is well-formed but inconsistent.
    #[error("Invalid seed data: {0}")]
    InvalidSeed(String),
}

/// Connect to the storefront database named in the environment.
///
/// # Errors
///
/// Returns an error if no database URL is set or the connection fails.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&database_url).await?)
}
