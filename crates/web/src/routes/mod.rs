//! HTTP route handlers.
//!
//! # Route Structure
//!
//! Registration order matters: the first pattern that matches wins, so
//! `/snippet/create` is registered before `/snippet/{id}`.
//!
//! ```text
//! GET  /ping              Public     health check
//! GET  /                  Dynamic    latest snippets
//! GET  /about             Dynamic    about page
//! GET  /snippet/create    Protected  new snippet form
//! POST /snippet/create    Protected  create snippet
//! GET  /snippet/{id}      Dynamic    view snippet
//! GET  /user/signup       Dynamic    signup form
//! POST /user/signup       Dynamic    create account
//! GET  /user/login        Dynamic    login form
//! POST /user/login        Dynamic    log in
//! POST /user/logout       Protected  log out
//! GET  /user/profile      Protected  account details
//! GET  /user/password     Protected  change password form
//! POST /user/password     Protected  change password
//! ```
//!
//! `/static/*` is served by `ServeDir` outside this table.

pub mod account;
pub mod health;
pub mod home;
pub mod snippets;
pub mod users;

use axum::http::Method;

use crate::pipeline::{AccessTier, RouteTable};
use crate::state::AppState;

/// The application's route table, in matching order.
#[must_use]
pub fn table(state: AppState) -> RouteTable {
    use AccessTier::{Dynamic, Protected, Public};

    RouteTable::new(state)
        .route(Method::GET, "/ping", Public, health::ping)
        .route(Method::GET, "/", Dynamic, home::home)
        .route(Method::GET, "/about", Dynamic, home::about)
        .route(Method::GET, "/snippet/create", Protected, snippets::create_form)
        .route(Method::POST, "/snippet/create", Protected, snippets::create)
        .route(Method::GET, "/snippet/{id}", Dynamic, snippets::view)
        .route(Method::GET, "/user/signup", Dynamic, users::signup_form)
        .route(Method::POST, "/user/signup", Dynamic, users::signup)
        .route(Method::GET, "/user/login", Dynamic, users::login_form)
        .route(Method::POST, "/user/login", Dynamic, users::login)
        .route(Method::POST, "/user/logout", Protected, users::logout)
        .route(Method::GET, "/user/profile", Protected, account::profile)
        .route(Method::GET, "/user/password", Protected, account::password_form)
        .route(Method::POST, "/user/password", Protected, account::change_password)
}
