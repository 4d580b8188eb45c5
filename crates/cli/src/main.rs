//! Gremco CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the documents and session tables
//! gremco-cli migrate
//!
//! # Load categories, products and users from YAML
//! gremco-cli seed data/seed.yaml
//!
//! # Create an admin account (password read from stdin)
//! echo 'a-long-password' | gremco-cli users create-admin -e admin@example.com -n "Admin Name"
//!
//! # Hash any plaintext passwords left by an import
//! gremco-cli users hash-passwords
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gremco-cli")]
#[command(author, version, about = "Gremco CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (documents and sessions)
    Migrate,
    /// Seed the store from a YAML file
    Seed {
        /// Path to the YAML file
        file: String,
    },
    /// Manage user accounts
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// Create an admin account; the password is read from stdin
    CreateAdmin {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,
    },
    /// Hash passwords that are still stored in plaintext
    HashPasswords,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => {
            commands::seed::from_file(&file).await?;
        }
        Commands::Users { action } => match action {
            UsersAction::CreateAdmin { email, name } => {
                commands::users::create_admin(&email, &name).await?;
            }
            UsersAction::HashPasswords => {
                commands::users::hash_passwords().await?;
            }
        },
    }
    Ok(())
}
