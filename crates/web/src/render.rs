//! Page rendering.
//!
//! Every page template carries a [`PageContext`] holding what the layout
//! needs on every request: the year for the footer, the pending flash
//! message, the CSRF token for forms, and whether to show the logged-in
//! navigation.

use askama::Template;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::Html,
};
use chrono::Datelike;
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::{CsrfToken, Identity};
use crate::models::session::FLASH;

/// Data injected into every rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub current_year: i32,
    /// Read-once message from the previous request; taking the context
    /// clears it from the session.
    pub flash: Option<String>,
    pub csrf_token: String,
    pub is_authenticated: bool,
}

impl<S: Send + Sync> FromRequestParts<S> for PageContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let flash = match parts.extensions.get::<Session>() {
            Some(session) => session.remove::<String>(FLASH).await?,
            None => None,
        };

        Ok(Self {
            current_year: chrono::Utc::now().year(),
            flash,
            csrf_token: parts
                .extensions
                .get::<CsrfToken>()
                .map(|t| t.as_str().to_owned())
                .unwrap_or_default(),
            is_authenticated: parts
                .extensions
                .get::<Identity>()
                .is_some_and(|i| i.is_authenticated()),
        })
    }
}

/// Render a page template to HTML.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn render(template: &impl Template) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}

/// Queue a message for the next page rendered in this session.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn flash(session: &Session, message: &str) -> Result<(), AppError> {
    session.insert(FLASH, message).await?;
    Ok(())
}
