//! Snippetbox web application.
//!
//! Library half of the `snippetbox-web` binary, so the whole application can
//! be assembled in-process by tests. [`pipeline::build`] is the entry point:
//! it takes an [`state::AppState`] and a session store and returns the
//! router with every middleware tier wired in.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod routes;
pub mod services;
pub mod state;
