//! Storage for users and snippets.
//!
//! Handlers never talk to a database directly. They go through the
//! [`UserStore`] and [`SnippetStore`] capabilities held in
//! [`AppState`](crate::state::AppState), which are implemented by the
//! `PostgreSQL` adapters in this module and by the in-memory adapters in
//! [`memory`] (used by the test suites).
//!
//! ## Tables
//!
//! - `snippets` - Pasted text with an expiry timestamp
//! - `users` - Accounts (unique email, Argon2 password hash, `active` flag)
//! - `tower_sessions.session` - Session records
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p snippetbox-cli -- migrate
//! ```

pub mod memory;
pub mod snippets;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use snippetbox_core::{Email, SnippetId, UserId};

use crate::models::{Snippet, User};

pub use memory::{MemorySnippetStore, MemoryUserStore};
pub use snippets::PgSnippetStore;
pub use users::PgUserStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user by id, active or not.
    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Fetch the id and password hash of the **active** user with this email.
    async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(UserId, String)>, RepositoryError>;

    /// Fetch the password hash of a user by id.
    async fn password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError>;

    /// Create an active user.
    ///
    /// Fails with [`RepositoryError::Conflict`] when the email is taken.
    async fn insert(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<UserId, RepositoryError>;

    /// Replace a user's password hash. [`RepositoryError::NotFound`] if absent.
    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError>;

    /// Activate or deactivate the user with this email.
    /// [`RepositoryError::NotFound`] if absent.
    async fn set_active(&self, email: &Email, active: bool) -> Result<(), RepositoryError>;
}

/// Snippet storage.
#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Store a snippet that expires `ttl_days` from now.
    async fn insert(
        &self,
        title: &str,
        content: &str,
        ttl_days: u32,
    ) -> Result<SnippetId, RepositoryError>;

    /// Fetch an unexpired snippet by id.
    async fn get(&self, id: SnippetId) -> Result<Option<Snippet>, RepositoryError>;

    /// The `limit` most recently created unexpired snippets, newest first.
    async fn latest(&self, limit: u32) -> Result<Vec<Snippet>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
fn conflict_or_database(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
