//! Home and about pages.

use askama::Template;
use axum::{extract::State, response::Html};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::models::Snippet;
use crate::render::{PageContext, render};
use crate::state::AppState;

/// How many snippets the home page lists.
const LATEST_LIMIT: u32 = 10;

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub snippets: Vec<Snippet>,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub ctx: PageContext,
}

/// Latest unexpired snippets, newest first.
#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> Result<Html<String>> {
    let snippets = state.snippets().latest(LATEST_LIMIT).await?;
    render(&HomeTemplate { ctx, snippets })
}

pub async fn about(ctx: PageContext) -> Result<Html<String>> {
    render(&AboutTemplate { ctx })
}
