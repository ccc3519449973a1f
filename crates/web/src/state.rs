//! Application state shared across handlers and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::WebConfig;
use crate::db::{PgSnippetStore, PgUserStore, SnippetStore, UserStore};
use crate::services::auth::{AuthError, AuthService};

/// Everything a request needs, built once before serving begins.
///
/// Cheaply cloneable via `Arc`; never mutated after construction.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    users: Arc<dyn UserStore>,
    snippets: Arc<dyn SnippetStore>,
    auth: AuthService,
}

impl AppState {
    /// Assemble state from explicit storage adapters.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if the configured Argon2 parameters
    /// are rejected.
    pub fn new(
        config: WebConfig,
        users: Arc<dyn UserStore>,
        snippets: Arc<dyn SnippetStore>,
    ) -> Result<Self, AuthError> {
        let params = config
            .password_hashing
            .params()
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        let auth = AuthService::new(Arc::clone(&users), params)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                users,
                snippets,
                auth,
            }),
        })
    }

    /// Assemble state over the `PostgreSQL` adapters.
    ///
    /// # Errors
    ///
    /// See [`AppState::new`].
    pub fn with_postgres(config: WebConfig, pool: PgPool) -> Result<Self, AuthError> {
        Self::new(
            config,
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgSnippetStore::new(pool)),
        )
    }

    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.inner.users.as_ref()
    }

    #[must_use]
    pub fn snippets(&self) -> &dyn SnippetStore {
        self.inner.snippets.as_ref()
    }

    /// Get a reference to the password service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }
}
