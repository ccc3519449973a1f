//! Database migrations.
//!
//! Migrations live in `crates/web/migrations/` and are embedded at compile
//! time. Applied migrations are tracked in `_sqlx_migrations`, so running
//! this twice is harmless.

use sqlx::PgPool;

use super::CliError;

/// Apply every pending migration.
///
/// # Errors
///
/// Returns `CliError::Migration` if a migration fails to apply.
pub async fn run(pool: &PgPool) -> Result<(), CliError> {
    tracing::info!("Running migrations...");
    sqlx::migrate!("../web/migrations").run(pool).await?;
    tracing::info!("Migrations complete!");
    Ok(())
}
