//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use snippetbox_web::db::{self, RepositoryError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// No database URL on the command line or in the environment.
    #[error("Missing database URL: pass --database-url or set SNIPPETBOX_DATABASE_URL")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email argument.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No account has this email.
    #[error("No user with email: {0}")]
    UnknownUser(String),
}

/// Resolve the database URL and open a pool.
///
/// # Errors
///
/// Returns `CliError::MissingDatabaseUrl` when no URL is configured, or the
/// connection error.
pub async fn connect(database_url: Option<String>) -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let url = database_url
        .or_else(|| std::env::var("SNIPPETBOX_DATABASE_URL").ok())
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .filter(|url| !url.is_empty())
        .ok_or(CliError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&SecretString::from(url)).await?)
}
