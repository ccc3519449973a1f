//! Snippet viewing and creation.

use std::collections::HashMap;

use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use snippetbox_core::SnippetId;

use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{self, NewSnippet};
use crate::models::Snippet;
use crate::pipeline::PathParams;
use crate::render::{PageContext, flash, render};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "view.html")]
pub struct ViewTemplate {
    pub ctx: PageContext,
    pub snippet: Snippet,
}

#[derive(Template)]
#[template(path = "create.html")]
pub struct CreateTemplate {
    pub ctx: PageContext,
    pub form: forms::Form,
}

/// Show one snippet. Anything but a positive integer id is a 404, as is an
/// unknown or expired snippet.
#[instrument(skip_all)]
pub async fn view(
    State(state): State<AppState>,
    params: PathParams,
    ctx: PageContext,
) -> Result<Html<String>> {
    let id: SnippetId = params
        .get("id")
        .and_then(|raw| raw.parse().ok())
        .ok_or(AppError::NotFound)?;

    let snippet = state.snippets().get(id).await?.ok_or(AppError::NotFound)?;
    render(&ViewTemplate { ctx, snippet })
}

/// Empty form, one year expiry preselected.
pub async fn create_form(ctx: PageContext) -> Result<Html<String>> {
    let form = forms::Form::new(HashMap::from([("expires".to_owned(), "365".to_owned())]));
    render(&CreateTemplate { ctx, form })
}

/// Store a snippet and show it, or redisplay the form with its errors.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response> {
    let snippet = match NewSnippet::parse(forms::Form::new(values)) {
        Ok(snippet) => snippet,
        Err(form) => return Ok(render(&CreateTemplate { ctx, form })?.into_response()),
    };

    let id = state
        .snippets()
        .insert(&snippet.title, &snippet.content, snippet.expires_days)
        .await?;
    tracing::info!(snippet_id = %id, "Snippet created");

    flash(&session, "Snippet successfully created!").await?;
    Ok(Redirect::to(&format!("/snippet/{id}")).into_response())
}
