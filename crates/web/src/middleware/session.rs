//! Session middleware configuration.
//!
//! Sessions are identified by a signed, HTTP-only cookie and expire after a
//! period of inactivity. The store is pluggable: `PostgreSQL` in production,
//! `tower_sessions::MemoryStore` in tests.

use sha2::{Digest, Sha512};
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::WebConfig;
use crate::pipeline::Middleware;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "snippetbox_session";

/// Derive the 64-byte cookie signing key from the configured secret.
#[must_use]
pub fn signing_key(config: &WebConfig) -> Key {
    let digest = Sha512::digest(config.session_secret_bytes());
    Key::from(digest.as_slice())
}

/// Build the session attachment middleware over `store`.
///
/// A cookie whose signature does not verify is ignored and a fresh, empty
/// session is started in its place.
pub fn attach_sessions<Store>(store: Store, config: &WebConfig) -> Middleware
where
    Store: SessionStore + Clone,
{
    let lifetime_secs = i64::try_from(config.session_lifetime.as_secs()).unwrap_or(i64::MAX);

    let layer = SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(lifetime_secs),
        ))
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(config));

    Middleware::from_layer(layer)
}
