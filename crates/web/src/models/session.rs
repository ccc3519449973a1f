//! Session keys.
//!
//! Every value the application keeps in a session lives under one of these
//! keys. Nothing else writes to the session.

/// Key for the id of the logged-in user (`UserId`).
pub const AUTHENTICATED_USER_ID: &str = "authenticated_user_id";

/// Key for the per-session anti-forgery token (`String`).
pub const CSRF_TOKEN: &str = "csrf_token";

/// Key for the one-shot message shown on the next rendered page (`String`).
pub const FLASH: &str = "flash";

/// Key for the path a visitor was refused before logging in (`String`).
pub const REDIRECT_LOCATION: &str = "redirect_location";
