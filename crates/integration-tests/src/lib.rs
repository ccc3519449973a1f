//! End-to-end test harness for Snippetbox.
//!
//! [`TestApp::spawn`] starts the full router (real middleware tiers,
//! in-memory storage and sessions) on an ephemeral port and returns a
//! handle with a cookie-keeping HTTP client. Redirects are not followed so
//! tests can assert on `303`s directly.
//!
//! Besides the application's own routes, the harness registers two probes:
//!
//! - `GET /test/panic` (dynamic): always panics.
//! - `GET|POST /test/protected` (protected): counts how often it runs.

#![allow(clippy::missing_panics_doc, clippy::expect_used, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::http::Method;
use regex::Regex;
use reqwest::redirect::Policy;
use tower_sessions::MemoryStore;

use snippetbox_core::{Email, SnippetId, UserId};
use snippetbox_web::config::WebConfig;
use snippetbox_web::db::{MemorySnippetStore, MemoryUserStore, SnippetStore, UserStore};
use snippetbox_web::pipeline::{self, AccessTier};
use snippetbox_web::routes;
use snippetbox_web::state::AppState;

pub use reqwest::{Response, StatusCode};

/// Matches the hidden CSRF input every form renders.
static CSRF_INPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<input type='hidden' name='csrf_token' value='([^']+)'>")
        .expect("CSRF input pattern is valid")
});

/// A running application plus a client holding one browser's cookies.
pub struct TestApp {
    pub address: SocketAddr,
    pub client: reqwest::Client,
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
    pub snippets: Arc<MemorySnippetStore>,
    protected_hits: Arc<AtomicUsize>,
}

async fn panicking() -> &'static str {
    panic!("deliberate panic from /test/panic")
}

impl TestApp {
    /// Start a fresh application with empty storage.
    pub async fn spawn() -> Self {
        let users = Arc::new(MemoryUserStore::new());
        let snippets = Arc::new(MemorySnippetStore::new());
        let state = AppState::new(WebConfig::for_testing(), users.clone(), snippets.clone())
            .expect("test state builds");

        let protected_hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&protected_hits);
        let probe = move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "protected probe"
            }
        };

        let table = routes::table(state.clone())
            .route(Method::GET, "/test/panic", AccessTier::Dynamic, panicking)
            .route(Method::GET, "/test/protected", AccessTier::Protected, probe.clone())
            .route(Method::POST, "/test/protected", AccessTier::Protected, probe);

        let app = pipeline::assemble(&state, table, MemoryStore::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let address = listener.local_addr().expect("listener has an address");
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("test server runs");
        });

        Self {
            address,
            client: new_client(),
            state,
            users,
            snippets,
            protected_hits,
        }
    }

    /// Forget every cookie, as if a new browser arrived.
    pub fn clear_cookies(&mut self) {
        self.client = new_client();
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.address)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request completes")
    }

    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(fields)
            .send()
            .await
            .expect("POST request completes")
    }

    /// Load `page` and scrape the CSRF token from its form.
    pub async fn csrf_token(&self, page: &str) -> String {
        let body = self.get(page).await.text().await.expect("page body");
        extract_csrf_token(&body).unwrap_or_else(|| panic!("no CSRF token on {page}"))
    }

    /// Load `page` for its token, then post `fields` plus the token to
    /// `action`.
    pub async fn submit(&self, page: &str, action: &str, fields: &[(&str, &str)]) -> Response {
        let token = self.csrf_token(page).await;
        let mut with_token = fields.to_vec();
        with_token.push(("csrf_token", token.as_str()));
        self.post_form(action, &with_token).await
    }

    /// Create an account directly through the password service.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> UserId {
        let email = Email::parse(email).expect("valid test email");
        self.state
            .auth()
            .register(name, &email, password)
            .await
            .expect("registration succeeds")
    }

    /// Log in through the login form.
    pub async fn log_in(&self, email: &str, password: &str) -> Response {
        self.submit(
            "/user/login",
            "/user/login",
            &[("email", email), ("password", password)],
        )
        .await
    }

    pub async fn set_active(&self, email: &str, active: bool) {
        let email = Email::parse(email).expect("valid test email");
        self.users
            .set_active(&email, active)
            .await
            .expect("user exists");
    }

    pub async fn seed_snippet(&self, title: &str, content: &str, days: u32) -> SnippetId {
        self.snippets
            .insert(title, content, days)
            .await
            .expect("memory insert succeeds")
    }

    /// How many times the protected probe handler has run.
    #[must_use]
    pub fn protected_hits(&self) -> usize {
        self.protected_hits.load(Ordering::SeqCst)
    }
}

fn new_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("client builds")
}

/// The token in the first CSRF input of `html`.
#[must_use]
pub fn extract_csrf_token(html: &str) -> Option<String> {
    CSRF_INPUT
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

/// `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
