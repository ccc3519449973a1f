//! HTTP middleware.
//!
//! # Order (outermost first)
//!
//! Every request:
//!
//! 1. Panic recovery (500 + `Connection: close`)
//! 2. Request logging (request id, client, method, path)
//! 3. Security headers
//! 4. Request timeout
//!
//! Dynamic and protected routes, after dispatch:
//!
//! 5. Session attachment (signed cookie)
//! 6. CSRF guard
//! 7. Identity resolution
//!
//! Protected routes only:
//!
//! 8. Access gate (303 to `/` when anonymous, `Cache-Control: no-store` otherwise)

pub mod auth;
pub mod csrf;
pub mod recover;
pub mod request_log;
pub mod security_headers;
pub mod session;

pub use auth::{Identity, RequireAuth, require_authentication, resolve_identity};
pub use csrf::{CsrfToken, verify_csrf_token};
pub use recover::{PANIC_LOG_TARGET, recover_panic};
pub use request_log::log_request;
pub use security_headers::security_headers;
pub use session::{SESSION_COOKIE_NAME, attach_sessions};
