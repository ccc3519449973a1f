//! Health check endpoint.

/// Liveness probe. Touches neither the session nor storage.
pub async fn ping() -> &'static str {
    "OK"
}
