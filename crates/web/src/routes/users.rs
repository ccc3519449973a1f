//! Signup, login, and logout.

use std::collections::HashMap;

use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use snippetbox_core::UserId;

use crate::error::Result;
use crate::filters;
use crate::forms::{self, Login, Signup};
use crate::models::session::{AUTHENTICATED_USER_ID, REDIRECT_LOCATION};
use crate::render::{PageContext, flash, render};
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Where a fresh login lands when no page was remembered.
const DEFAULT_AFTER_LOGIN: &str = "/snippet/create";

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub ctx: PageContext,
    pub form: forms::Form,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub form: forms::Form,
}

pub async fn signup_form(ctx: PageContext) -> Result<Html<String>> {
    render(&SignupTemplate {
        ctx,
        form: forms::Form::default(),
    })
}

/// Create an account, or redisplay the form (status 200) with field errors.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response> {
    let signup = match Signup::parse(forms::Form::new(values)) {
        Ok(signup) => signup,
        Err(mut form) => {
            form.clear("password");
            return Ok(render(&SignupTemplate { ctx, form })?.into_response());
        }
    };

    match state
        .auth()
        .register(&signup.name, &signup.email, &signup.password)
        .await
    {
        Ok(id) => tracing::info!(user_id = %id, "Account created"),
        Err(AuthError::DuplicateEmail) => {
            let mut form = forms::Form::new(HashMap::from([
                ("name".to_owned(), signup.name),
                ("email".to_owned(), signup.email.into_inner()),
            ]));
            form.add_error("email", forms::DUPLICATE_EMAIL);
            return Ok(render(&SignupTemplate { ctx, form })?.into_response());
        }
        Err(e) => return Err(e.into()),
    }

    flash(&session, "Your signup was successful. Please log in.").await?;
    Ok(Redirect::to("/user/login").into_response())
}

pub async fn login_form(ctx: PageContext) -> Result<Html<String>> {
    render(&LoginTemplate {
        ctx,
        form: forms::Form::default(),
    })
}

/// Only same-site absolute paths are followed after login.
fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

/// Check credentials, rotate the session id, and go back to where the
/// visitor was refused (or to the create form).
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response> {
    let login = match Login::parse(forms::Form::new(values)) {
        Ok(login) => login,
        Err(mut form) => {
            form.clear("password");
            return Ok(render(&LoginTemplate { ctx, form })?.into_response());
        }
    };

    let id = match state.auth().authenticate(&login.email, &login.password).await {
        Ok(id) => id,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Login failed");
            let mut form = forms::Form::new(HashMap::from([("email".to_owned(), login.email)]));
            form.add_error(forms::GENERIC, forms::BAD_CREDENTIALS);
            return Ok(render(&LoginTemplate { ctx, form })?.into_response());
        }
        Err(e) => return Err(e.into()),
    };

    session.cycle_id().await?;
    session.insert(AUTHENTICATED_USER_ID, id).await?;
    tracing::info!(user_id = %id, "Logged in");

    let target = session
        .remove::<String>(REDIRECT_LOCATION)
        .await?
        .filter(|t| is_local_path(t))
        .unwrap_or_else(|| DEFAULT_AFTER_LOGIN.to_owned());
    Ok(Redirect::to(&target).into_response())
}

/// Forget the user, rotate the session id, and return home.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Response> {
    session.cycle_id().await?;
    if let Some(id) = session.remove::<UserId>(AUTHENTICATED_USER_ID).await? {
        tracing::info!(user_id = %id, "Logged out");
    }

    flash(&session, "You've been logged out successfully!").await?;
    Ok(Redirect::to("/").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_local_paths_are_followed() {
        assert!(is_local_path("/snippet/create"));
        assert!(is_local_path("/user/profile?tab=1"));
        assert!(!is_local_path("https://evil.example/"));
        assert!(!is_local_path("//evil.example/"));
        assert!(!is_local_path("/\\evil.example"));
        assert!(!is_local_path(""));
    }
}
