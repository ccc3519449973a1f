//! `PostgreSQL` snippet repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use snippetbox_core::SnippetId;

use super::{RepositoryError, SnippetStore};
use crate::models::Snippet;

#[derive(FromRow)]
struct SnippetRow {
    id: SnippetId,
    title: String,
    content: String,
    created: DateTime<Utc>,
    expires: DateTime<Utc>,
}

impl From<SnippetRow> for Snippet {
    fn from(row: SnippetRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            created: row.created,
            expires: row.expires,
        }
    }
}

/// [`SnippetStore`] backed by the `snippets` table.
#[derive(Clone)]
pub struct PgSnippetStore {
    pool: PgPool,
}

impl PgSnippetStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetStore for PgSnippetStore {
    #[instrument(skip(self, content))]
    async fn insert(
        &self,
        title: &str,
        content: &str,
        ttl_days: u32,
    ) -> Result<SnippetId, RepositoryError> {
        let days = i32::try_from(ttl_days).unwrap_or(i32::MAX);

        let id: SnippetId = sqlx::query_scalar(
            r"
            INSERT INTO snippets (title, content, created, expires)
            VALUES ($1, $2, NOW(), NOW() + make_interval(days => $3))
            RETURNING id
            ",
        )
        .bind(title)
        .bind(content)
        .bind(days)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: SnippetId) -> Result<Option<Snippet>, RepositoryError> {
        let row: Option<SnippetRow> = sqlx::query_as(
            r"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > NOW() AND id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Snippet::from))
    }

    #[instrument(skip(self))]
    async fn latest(&self, limit: u32) -> Result<Vec<Snippet>, RepositoryError> {
        let rows: Vec<SnippetRow> = sqlx::query_as(
            r"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > NOW()
            ORDER BY created DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Snippet::from).collect())
    }
}
