//! Per-request logging and request-id correlation.
//!
//! Every request gets an id: the upstream `x-request-id` header when a proxy
//! supplied one, a fresh UUID v4 otherwise. The id is attached to the
//! tracing span, the Sentry scope, and the response headers.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Log the client address, protocol, method, and path before delegating,
/// then the status and latency once the response is ready.
pub async fn log_request(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_owned(), |ConnectInfo(addr)| addr.to_string());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        user_id = tracing::field::Empty,
    );

    async move {
        tracing::info!(
            client = %client,
            protocol = ?request.version(),
            method = %request.method(),
            path = %request.uri().path(),
            "Request received"
        );

        let started = Instant::now();
        let mut response = next.run(request).await;

        tracing::info!(
            status = response.status().as_u16(),
            latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Response sent"
        );

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::middleware::from_fn;
    use sentry::integrations::tracing as sentry_tracing;
    use tower::{Layer, ServiceExt};
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    fn service() -> impl tower::Service<
        Request,
        Response = Response,
        Error = std::convert::Infallible,
        Future: Send,
    > {
        from_fn(log_request).layer(tower::service_fn(|_req: Request| async {
            Ok::<_, std::convert::Infallible>(Response::new(Body::empty()))
        }))
    }

    #[tokio::test]
    async fn test_upstream_request_id_is_echoed() {
        let response = service()
            .oneshot(
                Request::get("/")
                    .header(REQUEST_ID_HEADER, "edge-1234")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "edge-1234");
    }

    #[test]
    fn test_query_string_is_not_logged() {
        let events = sentry::test::with_captured_events(|| {
            let subscriber = tracing_subscriber::registry()
                .with(sentry_tracing::layer().event_filter(|_| sentry_tracing::EventFilter::Breadcrumb));
            let _guard = tracing::subscriber::set_default(subscriber);

            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            runtime
                .block_on(
                    service().oneshot(
                        Request::get("/snippet/1?token=hunter2")
                            .body(Body::empty())
                            .unwrap(),
                    ),
                )
                .unwrap();
            sentry::capture_message("after request", sentry::Level::Info);
        });

        assert_eq!(events.len(), 1);
        let received = events[0]
            .breadcrumbs
            .values
            .iter()
            .find(|b| b.message.as_deref() == Some("Request received"))
            .unwrap();
        assert_eq!(received.data["path"], "/snippet/1");
        assert!(!format!("{:?}", received.data).contains("hunter2"));
    }

    #[tokio::test]
    async fn test_request_id_generated_when_absent() {
        let response = service()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }
}
