//! Account pages for logged-in users.

use std::collections::HashMap;

use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{self, PasswordChange};
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::render::{PageContext, flash, render};
use crate::services::auth::AuthError;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub user: User,
}

#[derive(Template)]
#[template(path = "password.html")]
pub struct PasswordTemplate {
    pub ctx: PageContext,
    pub form: forms::Form,
}

#[instrument(skip_all)]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user_id): RequireAuth,
    ctx: PageContext,
) -> Result<Html<String>> {
    let user = state
        .auth()
        .get_user(user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    render(&ProfileTemplate { ctx, user })
}

pub async fn password_form(ctx: PageContext) -> Result<Html<String>> {
    render(&PasswordTemplate {
        ctx,
        form: forms::Form::default(),
    })
}

/// Replace the password after checking the current one.
#[instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user_id): RequireAuth,
    session: Session,
    ctx: PageContext,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response> {
    let change = match PasswordChange::parse(forms::Form::new(values)) {
        Ok(change) => change,
        Err(form) => return Ok(render(&PasswordTemplate { ctx, form })?.into_response()),
    };

    match state
        .auth()
        .change_password(user_id, &change.current, &change.new)
        .await
    {
        Ok(()) => {}
        Err(AuthError::InvalidCredentials) => {
            let mut form = forms::Form::default();
            form.add_error("current_password", forms::WRONG_CURRENT_PASSWORD);
            return Ok(render(&PasswordTemplate { ctx, form })?.into_response());
        }
        Err(e) => return Err(e.into()),
    }

    flash(&session, "Your password has been updated!").await?;
    Ok(Redirect::to("/user/profile").into_response())
}
