//! Request classification and dispatch.
//!
//! Routes are `(method, pattern, tier, handler)` registrations checked in
//! registration order; the first whose pattern and method both match wins,
//! so overlapping patterns (`/snippet/create` before `/snippet/{id}`) are
//! resolved by the order they were added in. Patterns are matched segment
//! by segment: literals must be equal and a `{name}` capture takes exactly
//! one non-empty segment.
//!
//! No match at all is a 404. A path that matches under a different method
//! is a 405 whose `Allow` header lists the methods that would have worked.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::{FromRequestParts, Request};
use axum::handler::Handler;
use axum::http::request::Parts;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tower::{Service, ServiceExt};

use super::chain::{BoxRoute, Chain, boxed};
use crate::state::AppState;

/// Which middleware a route runs behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessTier {
    /// No session: health checks, assets.
    Public,
    /// Session, CSRF guard, and identity resolution; anonymous visitors allowed.
    Dynamic,
    /// `Dynamic` plus a mandatory logged-in user.
    Protected,
}

/// Middleware chains per tier, supplied when the table is built.
#[derive(Debug, Clone, Default)]
pub struct TierChains {
    pub public: Chain,
    pub dynamic: Chain,
    pub protected: Chain,
}

impl TierChains {
    #[must_use]
    pub const fn for_tier(&self, tier: AccessTier) -> &Chain {
        match tier {
            AccessTier::Public => &self.public,
            AccessTier::Dynamic => &self.dynamic,
            AccessTier::Protected => &self.protected,
        }
    }
}

/// A pattern that could not be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern `{0}` must start with `/`")]
    NotAbsolute(String),
    #[error("pattern `{0}` has a malformed capture")]
    BadCapture(String),
    #[error("pattern `{0}` has more than one capture")]
    TooManyCaptures(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
}

/// A parsed path pattern such as `/snippet/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parse a pattern with at most one `{name}` segment.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for relative patterns, captures that do not
    /// span a whole segment, and patterns with several captures.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let Some(rest) = raw.strip_prefix('/') else {
            return Err(PatternError::NotAbsolute(raw.to_owned()));
        };

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for part in rest.split('/') {
                let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                    Some(name) if !name.is_empty() && !name.contains(['{', '}']) => {
                        Segment::Capture(name.to_owned())
                    }
                    Some(_) => return Err(PatternError::BadCapture(raw.to_owned())),
                    None if part.contains(['{', '}']) => {
                        return Err(PatternError::BadCapture(raw.to_owned()));
                    }
                    None => Segment::Literal(part.to_owned()),
                };
                segments.push(segment);
            }
        }

        let captures = segments
            .iter()
            .filter(|s| matches!(s, Segment::Capture(_)))
            .count();
        if captures > 1 {
            return Err(PatternError::TooManyCaptures(raw.to_owned()));
        }

        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }

    /// Match a request path, returning the captured segment if any.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Capture(_) if part.is_empty() => return None,
                Segment::Capture(name) => {
                    let decoded = urlencoding::decode(part).ok()?;
                    params.0.insert(name.clone(), decoded.into_owned());
                }
            }
        }
        Some(params)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Segments captured by the matched pattern, keyed by capture name.
///
/// Also an extractor: handlers take `PathParams` as an argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for PathParams {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_default())
    }
}

struct Registration {
    method: Method,
    pattern: Pattern,
    tier: AccessTier,
    handler: BoxRoute,
}

/// Route registrations in the order they were added.
pub struct RouteTable {
    state: AppState,
    routes: Vec<Registration>,
}

impl RouteTable {
    #[must_use]
    pub const fn new(state: AppState) -> Self {
        Self {
            state,
            routes: Vec::new(),
        }
    }

    /// Register an axum handler.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is malformed. Route tables are built from literals
    /// at startup, so a bad pattern is a programming error.
    #[must_use]
    #[allow(clippy::panic)]
    pub fn route<H, T>(self, method: Method, pattern: &str, tier: AccessTier, handler: H) -> Self
    where
        H: Handler<T, AppState> + Sync,
        T: 'static,
    {
        let service = boxed(handler.with_state(self.state.clone()));
        match self.try_route_service(method, pattern, tier, service) {
            Ok(table) => table,
            Err(e) => panic!("invalid route: {e}"),
        }
    }

    /// Register an arbitrary service.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if `pattern` is malformed.
    pub fn try_route_service(
        mut self,
        method: Method,
        pattern: &str,
        tier: AccessTier,
        handler: BoxRoute,
    ) -> Result<Self, PatternError> {
        self.routes.push(Registration {
            method,
            pattern: Pattern::parse(pattern)?,
            tier,
            handler,
        });
        Ok(self)
    }

    /// Wrap every handler in its tier's chain and freeze the table.
    #[must_use]
    pub fn build(self, chains: &TierChains) -> Dispatcher {
        let routes = self
            .routes
            .into_iter()
            .map(|r| CompiledRoute {
                service: chains.for_tier(r.tier).then(r.handler),
                method: r.method,
                pattern: r.pattern,
                tier: r.tier,
            })
            .collect();

        Dispatcher {
            routes: Arc::new(routes),
        }
    }
}

struct CompiledRoute {
    method: Method,
    pattern: Pattern,
    tier: AccessTier,
    service: BoxRoute,
}

/// Outcome of classifying a request.
#[derive(Debug, PartialEq, Eq)]
pub enum Classification {
    Matched {
        index: usize,
        tier: AccessTier,
        params: PathParams,
    },
    MethodNotAllowed {
        allow: Vec<Method>,
    },
    NotFound,
}

/// `HEAD` is served by `GET` registrations.
fn method_matches(registered: &Method, requested: &Method) -> bool {
    registered == requested || (registered == Method::GET && requested == Method::HEAD)
}

/// The frozen route table, as a service.
#[derive(Clone)]
pub struct Dispatcher {
    routes: Arc<Vec<CompiledRoute>>,
}

impl Dispatcher {
    /// Classify `(method, path)` without running anything.
    #[must_use]
    pub fn classify(&self, method: &Method, path: &str) -> Classification {
        let mut allow: Vec<Method> = Vec::new();

        for (index, route) in self.routes.iter().enumerate() {
            let Some(params) = route.pattern.matches(path) else {
                continue;
            };
            if method_matches(&route.method, method) {
                return Classification::Matched {
                    index,
                    tier: route.tier,
                    params,
                };
            }
            if !allow.contains(&route.method) {
                allow.push(route.method.clone());
            }
            if route.method == Method::GET && !allow.contains(&Method::HEAD) {
                allow.push(Method::HEAD);
            }
        }

        if allow.is_empty() {
            Classification::NotFound
        } else {
            Classification::MethodNotAllowed { allow }
        }
    }
}

impl Service<Request> for Dispatcher {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        match self.classify(request.method(), request.uri().path()) {
            Classification::Matched { index, params, .. } => {
                let Some(route) = self.routes.get(index) else {
                    return futures::future::ready(Ok(not_found())).boxed();
                };
                request.extensions_mut().insert(params);
                route.service.clone().oneshot(request).boxed()
            }
            Classification::MethodNotAllowed { allow } => {
                futures::future::ready(Ok(method_not_allowed(&allow))).boxed()
            }
            Classification::NotFound => futures::future::ready(Ok(not_found())).boxed(),
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn method_not_allowed(allow: &[Method]) -> Response {
    let allow = allow
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let mut response = (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;

    use super::*;
    use crate::config::WebConfig;
    use crate::db::{MemorySnippetStore, MemoryUserStore};

    fn state() -> AppState {
        AppState::new(
            WebConfig::for_testing(),
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemorySnippetStore::new()),
        )
        .unwrap()
    }

    async fn named(PathParams(params): PathParams) -> String {
        format!("{params:?}")
    }

    fn table() -> Dispatcher {
        RouteTable::new(state())
            .route(Method::GET, "/", AccessTier::Dynamic, || async { "home" })
            .route(Method::GET, "/snippet/create", AccessTier::Protected, || async { "form" })
            .route(Method::POST, "/snippet/create", AccessTier::Protected, || async { "create" })
            .route(Method::GET, "/snippet/{id}", AccessTier::Dynamic, named)
            .route(Method::GET, "/ping", AccessTier::Public, || async { "OK" })
            .build(&TierChains::default())
    }

    async fn body(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_pattern_parse_errors() {
        assert!(matches!(Pattern::parse("snippet"), Err(PatternError::NotAbsolute(_))));
        assert!(matches!(Pattern::parse("/snippet/{}"), Err(PatternError::BadCapture(_))));
        assert!(matches!(Pattern::parse("/snippet/x{id}"), Err(PatternError::BadCapture(_))));
        assert!(matches!(
            Pattern::parse("/{a}/{b}"),
            Err(PatternError::TooManyCaptures(_))
        ));
    }

    #[test]
    fn test_pattern_matching_is_structural() {
        let pattern = Pattern::parse("/snippet/{id}").unwrap();
        assert_eq!(pattern.matches("/snippet/1").unwrap().get("id"), Some("1"));
        assert_eq!(pattern.matches("/snippet/1.58").unwrap().get("id"), Some("1.58"));
        assert_eq!(pattern.matches("/snippet/a%20b").unwrap().get("id"), Some("a b"));
        assert!(pattern.matches("/snippet/").is_none());
        assert!(pattern.matches("/snippet").is_none());
        assert!(pattern.matches("/snippet/1/").is_none());
        assert!(pattern.matches("/snippets/1").is_none());

        let root = Pattern::parse("/").unwrap();
        assert!(root.matches("/").is_some());
        assert!(root.matches("/x").is_none());
    }

    #[test]
    fn test_first_registration_wins() {
        let dispatcher = table();
        assert!(matches!(
            dispatcher.classify(&Method::GET, "/snippet/create"),
            Classification::Matched { index: 1, tier: AccessTier::Protected, .. }
        ));
        assert!(matches!(
            dispatcher.classify(&Method::GET, "/snippet/7"),
            Classification::Matched { index: 3, tier: AccessTier::Dynamic, .. }
        ));
    }

    #[test]
    fn test_later_capture_shadowed_by_earlier_one() {
        let dispatcher = RouteTable::new(state())
            .route(Method::GET, "/snippet/{id}", AccessTier::Dynamic, named)
            .route(Method::GET, "/snippet/create", AccessTier::Protected, || async { "form" })
            .build(&TierChains::default());
        assert!(matches!(
            dispatcher.classify(&Method::GET, "/snippet/create"),
            Classification::Matched { index: 0, .. }
        ));
    }

    #[test]
    fn test_head_uses_get_routes() {
        assert!(matches!(
            table().classify(&Method::HEAD, "/ping"),
            Classification::Matched { .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let response = table()
            .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_is_405_with_allow() {
        let response = table()
            .oneshot(Request::delete("/snippet/create").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD, POST");

        let response = table()
            .oneshot(Request::post("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD");
    }

    #[tokio::test]
    async fn test_captures_reach_the_handler() {
        let response = table()
            .oneshot(Request::get("/snippet/42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body(response).await.contains("\"42\""));
    }
}
