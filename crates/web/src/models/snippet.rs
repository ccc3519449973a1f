//! Snippet domain types.

use chrono::{DateTime, Utc};

use snippetbox_core::SnippetId;

use super::user::human_date;

/// A short piece of text with an expiry date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub id: SnippetId,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl Snippet {
    /// Whether the snippet has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    #[must_use]
    pub fn created_display(&self) -> String {
        human_date(self.created)
    }

    #[must_use]
    pub fn expires_display(&self) -> String {
        human_date(self.expires)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn snippet() -> Snippet {
        Snippet {
            id: SnippetId::new(1),
            title: "An old silent pond".into(),
            content: "An old silent pond...".into(),
            created: Utc.with_ymd_and_hms(2026, 3, 5, 17, 4, 0).single().unwrap_or_default(),
            expires: Utc.with_ymd_and_hms(2026, 3, 12, 17, 4, 0).single().unwrap_or_default(),
        }
    }

    #[test]
    fn test_dates_render_in_human_form() {
        assert_eq!(snippet().created_display(), "05 Mar 2026 at 17:04");
        assert_eq!(snippet().expires_display(), "12 Mar 2026 at 17:04");
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let s = snippet();
        assert!(!s.is_expired_at(s.expires - chrono::Duration::seconds(1)));
        assert!(s.is_expired_at(s.expires));
    }
}
