//! Identity resolution, the access gate, and their extractors.
//!
//! [`resolve_identity`] runs on every session-bearing request and attaches an
//! [`Identity`] to the request extensions. It never trusts the stored user id
//! on its own: the account is re-fetched each time, and an id pointing at a
//! deleted or deactivated account is dropped from the session.
//!
//! [`require_authentication`] gates protected routes on that identity.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, Method, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use snippetbox_core::UserId;

use crate::error::AppError;
use crate::models::session::{AUTHENTICATED_USER_ID, REDIRECT_LOCATION};
use crate::state::AppState;

/// Where refused visitors are sent.
pub const LANDING_PATH: &str = "/";

/// Who is making this request. Recomputed for every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(UserId),
}

impl Identity {
    #[must_use]
    pub const fn user_id(self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(id) => Some(id),
        }
    }

    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Reads the identity attached by [`resolve_identity`]; anonymous when the
/// route has no session tier.
impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().copied().unwrap_or_default())
    }
}

/// Extractor for handlers behind the access gate.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireAuth(user_id): RequireAuth) -> impl IntoResponse {
///     format!("user {user_id}")
/// }
/// ```
pub struct RequireAuth(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for RequireAuth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(Identity::Authenticated(id)) => Ok(Self(*id)),
            _ => Err(Redirect::to(LANDING_PATH).into_response()),
        }
    }
}

fn session_of(request: &Request) -> Result<Session, AppError> {
    request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Internal("identity resolution installed without sessions".into()))
}

/// Re-validate the session's user and attach an [`Identity`].
///
/// # Errors
///
/// A storage failure while fetching the user is an `AppError` (500); it is
/// never downgraded to "anonymous".
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = session_of(&request)?;

    let identity = match session.get::<UserId>(AUTHENTICATED_USER_ID).await? {
        None => Identity::Anonymous,
        Some(id) => match state.users().get(id).await? {
            Some(user) if user.active => {
                tracing::Span::current().record("user_id", tracing::field::display(id));
                Identity::Authenticated(id)
            }
            Some(_) => {
                tracing::info!(user_id = %id, "Dropping deactivated user from session");
                session.remove::<UserId>(AUTHENTICATED_USER_ID).await?;
                Identity::Anonymous
            }
            None => {
                tracing::info!(user_id = %id, "Dropping unknown user from session");
                session.remove::<UserId>(AUTHENTICATED_USER_ID).await?;
                Identity::Anonymous
            }
        },
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Send anonymous visitors to the landing page; mark everything else
/// uncacheable.
///
/// The path of a refused `GET` is remembered so login can return there.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn require_authentication(request: Request, next: Next) -> Result<Response, AppError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .copied()
        .unwrap_or_default();

    if !identity.is_authenticated() {
        if request.method() == Method::GET {
            let session = session_of(&request)?;
            let target = request
                .uri()
                .path_and_query()
                .map_or_else(|| request.uri().path().to_owned(), |pq| pq.as_str().to_owned());
            session.insert(REDIRECT_LOCATION, target).await?;
        }
        return Ok(Redirect::to(LANDING_PATH).into_response());
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}
