//! Anti-forgery tokens.
//!
//! Each session carries one random token for its whole lifetime. Safe
//! requests expose it to templates through the [`CsrfToken`] extension;
//! unsafe requests must echo it back, either in the `x-csrf-token` header
//! or as the `csrf_token` field of a url-encoded form. The body is buffered
//! to find the field and then handed on to the handler unchanged.

use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::Method,
    middleware::Next,
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use subtle::ConstantTimeEq;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session::CSRF_TOKEN;

/// Form field carrying the token.
pub const CSRF_FORM_FIELD: &str = "csrf_token";

/// Header carrying the token, for non-form clients.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Largest body buffered while looking for the token.
const MAX_FORM_BYTES: usize = 1024 * 1024;

/// The session's token, available to handlers for embedding in forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(pub String);

impl CsrfToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Methods that must not change state and so need no token.
const fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// 32 random bytes, base64url without padding.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn tokens_match(submitted: &str, expected: &str) -> bool {
    submitted.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn form_field(body: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Issue the token on safe requests and demand it on unsafe ones.
///
/// Must run after session attachment.
///
/// # Errors
///
/// `AppError::BadRequest` (400) when an unsafe request has no token, the
/// wrong token, or an unreadable body. `AppError::Session` when the session
/// store fails.
pub async fn verify_csrf_token(request: Request, next: Next) -> Result<Response, AppError> {
    let session = request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Internal("CSRF guard installed without sessions".to_owned()))?;

    let stored: Option<String> = session.get(CSRF_TOKEN).await?;

    let (token, request) = if is_safe(request.method()) {
        let token = match stored {
            Some(token) => token,
            None => {
                let token = generate_token();
                session.insert(CSRF_TOKEN, &token).await?;
                token
            }
        };
        (token, request)
    } else {
        let (parts, body) = request.into_parts();
        let bytes = to_bytes(body, MAX_FORM_BYTES)
            .await
            .map_err(|e| AppError::BadRequest(format!("unreadable request body: {e}")))?;

        let submitted = parts
            .headers
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .or_else(|| form_field(&bytes, CSRF_FORM_FIELD));

        let Some(token) = stored.filter(|expected| {
            submitted
                .as_deref()
                .is_some_and(|submitted| tokens_match(submitted, expected))
        }) else {
            tracing::warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                "Rejected request with missing or mismatched CSRF token"
            );
            return Err(AppError::BadRequest("CSRF token missing or invalid".to_owned()));
        };

        (token, Request::from_parts(parts, Body::from(bytes)))
    };

    let mut request = request;
    request.extensions_mut().insert(CsrfToken(token));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("abc", "abcd"));
        assert!(!tokens_match("", "abc"));
    }

    #[test]
    fn test_form_field_decodes_values() {
        let body = b"title=O+snail&csrf_token=a%2Bb-c&content=x";
        assert_eq!(form_field(body, "csrf_token").as_deref(), Some("a+b-c"));
        assert_eq!(form_field(body, "missing"), None);
    }

    #[test]
    fn test_safe_methods() {
        assert!(is_safe(&Method::GET));
        assert!(is_safe(&Method::HEAD));
        assert!(!is_safe(&Method::POST));
        assert!(!is_safe(&Method::DELETE));
    }
}
