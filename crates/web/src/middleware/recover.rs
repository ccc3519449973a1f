//! Outermost panic boundary.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;

use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode, header::CONNECTION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;

/// Tracing target of the panic log line.
pub const PANIC_LOG_TARGET: &str = "snippetbox_web::panic";

/// Turn a panic anywhere downstream into a generic 500.
///
/// The response carries `Connection: close` so the client does not reuse a
/// connection whose request died mid-flight. The panic payload and a
/// backtrace go to the log, never to the client. Sentry hears about the
/// panic from its panic integration, once.
pub async fn recover_panic(request: Request, next: Next) -> Response {
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            let backtrace = Backtrace::force_capture();
            tracing::error!(
                target: PANIC_LOG_TARGET,
                panic = %message,
                backtrace = %backtrace,
                "Handler panicked"
            );

            let mut response =
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
            response
                .headers_mut()
                .insert(CONNECTION, HeaderValue::from_static("close"));
            response
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
