//! User domain types.

use chrono::{DateTime, Utc};

use snippetbox_core::{Email, UserId};

/// A registered account.
///
/// Carries no password hash; [`crate::services::auth`] reads that through
/// [`crate::db::UserStore::password_hash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email address (unique).
    pub email: Email,
    /// When the account was created.
    pub created: DateTime<Utc>,
    /// Deactivated accounts cannot log in and lose existing sessions.
    pub active: bool,
}

impl User {
    /// Sign-up date for the profile page, e.g. `05 Mar 2026 at 17:04`.
    #[must_use]
    pub fn joined_display(&self) -> String {
        human_date(self.created)
    }
}

/// Format a timestamp the way every page shows dates.
#[must_use]
pub fn human_date(at: DateTime<Utc>) -> String {
    at.format("%d %b %Y at %H:%M").to_string()
}
