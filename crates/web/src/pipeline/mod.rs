//! The request pipeline: middleware chains, route classification, and the
//! assembled application router.

mod chain;
mod router;

pub use chain::{BoxRoute, Chain, Middleware, boxed};
pub use router::{
    AccessTier, Classification, Dispatcher, PathParams, Pattern, PatternError, RouteTable,
    TierChains,
};

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_sessions::SessionStore;

use crate::middleware::{
    attach_sessions, log_request, recover_panic, require_authentication, resolve_identity,
    security_headers, verify_csrf_token,
};
use crate::routes;
use crate::state::AppState;

/// Middleware every request passes through, before dispatch.
#[must_use]
pub fn standard_chain(state: &AppState) -> Chain {
    Chain::new([
        Middleware::from_layer(from_fn(recover_panic)),
        Middleware::from_layer(from_fn(log_request)),
        Middleware::from_layer(from_fn(security_headers)),
        Middleware::from_layer(TimeoutLayer::new(state.config().request_timeout)),
    ])
}

/// Per-tier chains, run after dispatch.
///
/// The protected chain is the dynamic chain plus the access gate.
pub fn tier_chains<Store>(session_store: Store, state: &AppState) -> TierChains
where
    Store: SessionStore + Clone,
{
    let dynamic = Chain::new([
        attach_sessions(session_store, state.config()),
        Middleware::from_layer(from_fn(verify_csrf_token)),
        Middleware::from_layer(from_fn_with_state(state.clone(), resolve_identity)),
    ]);
    let protected = dynamic
        .clone()
        .append(Middleware::from_layer(from_fn(require_authentication)));

    TierChains {
        public: Chain::default(),
        dynamic,
        protected,
    }
}

/// Assemble the application with its standard route table.
pub fn build<Store>(state: &AppState, session_store: Store) -> Router
where
    Store: SessionStore + Clone,
{
    assemble(state, routes::table(state.clone()), session_store)
}

/// Assemble the application around an arbitrary route table.
///
/// Static assets are public; everything else goes through the table. The
/// standard chain wraps both.
pub fn assemble<Store>(state: &AppState, table: RouteTable, session_store: Store) -> Router
where
    Store: SessionStore + Clone,
{
    let chains = tier_chains(session_store, state);
    let dispatcher = table.build(&chains);

    Router::new()
        .nest_service("/static", ServeDir::new(&state.config().static_dir))
        .fallback_service(dispatcher)
        .layer(standard_chain(state))
}
