//! Unified error handling with Sentry integration.
//!
//! Handlers and middleware return `Result<T, AppError>`. Client-side kinds
//! answer with their reason phrase; infrastructure kinds are logged with full
//! detail, captured to Sentry, and answered with an opaque 500.

use std::backtrace::Backtrace;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sentry::integrations::tracing::EventFilter;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::middleware::PANIC_LOG_TARGET;
use crate::services::auth::AuthError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storage operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Password service failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session store could not load or save the session.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Template rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Resource not found.
    #[error("Not found")]
    NotFound,

    /// Malformed request from the client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error answers with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::Auth(AuthError::DuplicateEmail) => StatusCode::CONFLICT,
            Self::Database(_)
            | Self::Auth(_)
            | Self::Session(_)
            | Self::Template(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                detail = ?self,
                backtrace = %Backtrace::capture(),
                sentry_event_id = %event_id,
                "Request failed"
            );
        }

        // Never expose internal error details to clients
        let message = status.canonical_reason().unwrap_or("Error");
        (status, message).into_response()
    }
}

/// Which tracing events become Sentry events.
///
/// Warnings and errors become events; info and debug become breadcrumbs.
/// Panic logs stay breadcrumbs because the panic integration has already
/// reported the panic.
#[must_use]
pub fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> EventFilter {
    if metadata.target() == PANIC_LOG_TARGET {
        return EventFilter::Breadcrumb;
    }
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => EventFilter::Breadcrumb,
        _ => EventFilter::Ignore,
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
