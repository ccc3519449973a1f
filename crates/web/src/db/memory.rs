//! In-memory adapters for [`UserStore`] and [`SnippetStore`].
//!
//! Used by the unit and integration test suites so the full application can
//! run without a database. Both stores are safe to share across concurrent
//! requests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use snippetbox_core::{Email, SnippetId, UserId};

use super::{RepositoryError, SnippetStore, UserStore};
use crate::models::{Snippet, User};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

/// [`UserStore`] kept in a map keyed by id.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<BTreeMap<UserId, StoredUser>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Whether no account has been stored.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(&id).map(|s| s.user.clone()))
    }

    async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(UserId, String)>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|s| s.user.active && s.user.email.as_str() == email)
            .map(|s| (s.user.id, s.password_hash.clone())))
    }

    async fn password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .get(&id)
            .map(|s| s.password_hash.clone()))
    }

    async fn insert(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<UserId, RepositoryError> {
        let mut users = self.users.write().await;
        if users.values().any(|s| &s.user.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let next = users.keys().next_back().map_or(1, |id| id.as_i32() + 1);
        let id = UserId::new(next);
        users.insert(
            id,
            StoredUser {
                user: User {
                    id,
                    name: name.to_owned(),
                    email: email.clone(),
                    created: Utc::now(),
                    active: true,
                },
                password_hash: password_hash.to_owned(),
            },
        );
        Ok(id)
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let stored = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        password_hash.clone_into(&mut stored.password_hash);
        Ok(())
    }

    async fn set_active(&self, email: &Email, active: bool) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let stored = users
            .values_mut()
            .find(|s| &s.user.email == email)
            .ok_or(RepositoryError::NotFound)?;
        stored.user.active = active;
        Ok(())
    }
}

/// [`SnippetStore`] kept in a map keyed by id.
#[derive(Debug, Default)]
pub struct MemorySnippetStore {
    snippets: RwLock<BTreeMap<SnippetId, Snippet>>,
}

impl MemorySnippetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing snippets, expired ones included.
    #[must_use]
    pub fn with_snippets(snippets: impl IntoIterator<Item = Snippet>) -> Self {
        Self {
            snippets: RwLock::new(snippets.into_iter().map(|s| (s.id, s)).collect()),
        }
    }

    /// Number of stored snippets, expired ones included.
    pub async fn len(&self) -> usize {
        self.snippets.read().await.len()
    }

    /// Whether no snippet has been stored.
    pub async fn is_empty(&self) -> bool {
        self.snippets.read().await.is_empty()
    }
}

#[async_trait]
impl SnippetStore for MemorySnippetStore {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        ttl_days: u32,
    ) -> Result<SnippetId, RepositoryError> {
        let mut snippets = self.snippets.write().await;
        let next = snippets.keys().next_back().map_or(1, |id| id.as_i32() + 1);
        let id = SnippetId::new(next);
        let created = Utc::now();
        snippets.insert(
            id,
            Snippet {
                id,
                title: title.to_owned(),
                content: content.to_owned(),
                created,
                expires: created + Duration::days(i64::from(ttl_days)),
            },
        );
        Ok(id)
    }

    async fn get(&self, id: SnippetId) -> Result<Option<Snippet>, RepositoryError> {
        let now = Utc::now();
        Ok(self
            .snippets
            .read()
            .await
            .get(&id)
            .filter(|s| !s.is_expired_at(now))
            .cloned())
    }

    async fn latest(&self, limit: u32) -> Result<Vec<Snippet>, RepositoryError> {
        let now = Utc::now();
        let snippets = self.snippets.read().await;
        let mut live: Vec<Snippet> = snippets
            .values()
            .filter(|s| !s.is_expired_at(now))
            .cloned()
            .collect();
        live.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        live.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(live)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snippet(id: i32, created_days_ago: i64, expires_in_days: i64) -> Snippet {
        let now = Utc::now();
        Snippet {
            id: SnippetId::new(id),
            title: format!("snippet {id}"),
            content: format!("content {id}"),
            created: now - Duration::days(created_days_ago),
            expires: now + Duration::days(expires_in_days),
        }
    }

    #[tokio::test]
    async fn test_latest_is_newest_first_and_skips_expired() {
        let store = MemorySnippetStore::with_snippets([
            snippet(1, 3, 10),
            snippet(2, 1, 10),
            snippet(3, 2, -1),
            snippet(4, 5, 10),
        ]);

        let ids: Vec<i32> = store
            .latest(10)
            .await
            .unwrap()
            .iter()
            .map(|s| s.id.as_i32())
            .collect();
        assert_eq!(ids, vec![2, 1, 4]);

        assert_eq!(store.latest(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_expired_snippet_is_not_found() {
        let store = MemorySnippetStore::with_snippets([snippet(1, 8, -1)]);
        assert!(store.get(SnippetId::new(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemorySnippetStore::new();
        let first = store.insert("a", "b", 7).await.unwrap();
        let second = store.insert("c", "d", 1).await.unwrap();
        assert_eq!(first, SnippetId::new(1));
        assert_eq!(second, SnippetId::new(2));
        let stored = store.get(first).await.unwrap().unwrap();
        assert_eq!(stored.expires - stored.created, Duration::days(7));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryUserStore::new();
        let email = Email::parse("alice@example.com").unwrap();
        store.insert("Alice", &email, "hash").await.unwrap();

        let err = store.insert("Alice Again", &email, "hash").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_inactive_users_have_no_credentials() {
        let store = MemoryUserStore::new();
        let email = Email::parse("alice@example.com").unwrap();
        let id = store.insert("Alice", &email, "hash").await.unwrap();
        assert_eq!(
            store.credentials_by_email("alice@example.com").await.unwrap(),
            Some((id, "hash".to_owned()))
        );

        store.set_active(&email, false).await.unwrap();
        assert!(
            store
                .credentials_by_email("alice@example.com")
                .await
                .unwrap()
                .is_none()
        );
        assert!(!store.get(id).await.unwrap().unwrap().active);
    }
}
