//! Ordered middleware composition.
//!
//! A [`Middleware`] turns the next service into a wrapped one. A [`Chain`]
//! is a list of them applied so that the first entry is the outermost:
//! `Chain::new([a, b]).then(h)` runs `a`, then `b`, then `h`.
//! Concatenating chains with [`Chain::extend`] is associative, and building
//! a chain does no request-time work.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::Response;
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};

/// Type-erased request handler every middleware wraps and produces.
pub type BoxRoute = BoxCloneSyncService<Request, Response, Infallible>;

/// Box any infallible, cloneable service into a [`BoxRoute`].
pub fn boxed<S>(service: S) -> BoxRoute
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    BoxCloneSyncService::new(service)
}

/// One wrapping step: next handler in, wrapped handler out.
#[derive(Clone)]
pub struct Middleware(Arc<dyn Fn(BoxRoute) -> BoxRoute + Send + Sync>);

impl Middleware {
    pub fn new<F>(wrap: F) -> Self
    where
        F: Fn(BoxRoute) -> BoxRoute + Send + Sync + 'static,
    {
        Self(Arc::new(wrap))
    }

    /// Adapt a tower layer (`from_fn`, `SessionManagerLayer`, `TimeoutLayer`, ...).
    pub fn from_layer<L>(layer: L) -> Self
    where
        L: Layer<BoxRoute> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        Self::new(move |next| boxed(layer.layer(next)))
    }

    #[must_use]
    pub fn wrap(&self, next: BoxRoute) -> BoxRoute {
        (self.0)(next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Middleware")
    }
}

/// An ordered list of middleware, outermost first.
#[derive(Clone, Debug, Default)]
pub struct Chain {
    middleware: Vec<Middleware>,
}

impl Chain {
    #[must_use]
    pub fn new(middleware: impl IntoIterator<Item = Middleware>) -> Self {
        Self {
            middleware: middleware.into_iter().collect(),
        }
    }

    /// Add `middleware` as the new innermost step.
    #[must_use]
    pub fn append(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Run `self` first, then every step of `inner`.
    #[must_use]
    pub fn extend(mut self, inner: &Self) -> Self {
        self.middleware.extend(inner.middleware.iter().cloned());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Terminate the chain in `handler`.
    pub fn then<S>(&self, handler: S) -> BoxRoute
    where
        S: Service<Request, Response = Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        self.middleware
            .iter()
            .rev()
            .fold(boxed(handler), |next, middleware| middleware.wrap(next))
    }
}

/// Lets a chain be applied with `Router::layer`.
impl<S> Layer<S> for Chain
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    type Service = BoxRoute;

    fn layer(&self, inner: S) -> BoxRoute {
        self.then(inner)
    }
}
