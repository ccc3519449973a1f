//! Account management.
//!
//! A deactivated user cannot log in, and any session they already hold is
//! treated as anonymous from its next request onward.

use sqlx::PgPool;

use snippetbox_core::Email;
use snippetbox_web::db::{PgUserStore, RepositoryError, UserStore};

use super::CliError;

/// Set the `active` flag of the account with this email.
///
/// # Errors
///
/// Returns `CliError::InvalidEmail` for a malformed address and
/// `CliError::UnknownUser` when no account matches.
pub async fn set_active(pool: PgPool, email: &str, active: bool) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(|e| CliError::InvalidEmail(format!("{email}: {e}")))?;

    match PgUserStore::new(pool).set_active(&email, active).await {
        Ok(()) => {
            tracing::info!(%email, active, "User updated");
            Ok(())
        }
        Err(RepositoryError::NotFound) => Err(CliError::UnknownUser(email.into_inner())),
        Err(e) => Err(e.into()),
    }
}
