//! Access gate and identity resolution, end to end.

use snippetbox_integration_tests::{StatusCode, TestApp, location};

const EMAIL: &str = "alice@example.com";
const PASSWORD: &str = "correct horse battery";

#[tokio::test]
async fn anonymous_visitors_are_redirected_and_the_handler_never_runs() {
    let app = TestApp::spawn().await;

    for path in ["/test/protected", "/snippet/create", "/user/profile", "/user/password"] {
        let response = app.get(path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), Some("/"), "{path}");
    }

    // Valid token, so the request gets past CSRF to the gate
    let token = app.csrf_token("/user/login").await;
    let response = app
        .post_form("/test/protected", &[("csrf_token", token.as_str())])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));

    assert_eq!(app.protected_hits(), 0);
}

#[tokio::test]
async fn logged_in_users_reach_protected_pages_uncached() {
    let app = TestApp::spawn().await;
    app.register("Alice", EMAIL, PASSWORD).await;

    let response = app.log_in(EMAIL, PASSWORD).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/snippet/create"));

    let response = app.get("/test/protected").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["cache-control"], "no-store");
    assert_eq!(app.protected_hits(), 1);
}

#[tokio::test]
async fn public_pages_are_not_marked_no_store() {
    let app = TestApp::spawn().await;
    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("cache-control").is_none());
}

#[tokio::test]
async fn login_returns_to_the_refused_page() {
    let app = TestApp::spawn().await;
    app.register("Alice", EMAIL, PASSWORD).await;

    let refused = app.get("/user/profile").await;
    assert_eq!(refused.status(), StatusCode::SEE_OTHER);

    let response = app.log_in(EMAIL, PASSWORD).await;
    assert_eq!(location(&response), Some("/user/profile"));

    // The remembered page is used once only
    let token = app.csrf_token("/").await;
    app.post_form("/user/logout", &[("csrf_token", token.as_str())])
        .await;
    let response = app.log_in(EMAIL, PASSWORD).await;
    assert_eq!(location(&response), Some("/snippet/create"));
}

#[tokio::test]
async fn deactivated_user_loses_their_session_on_the_next_request() {
    let app = TestApp::spawn().await;
    app.register("Alice", EMAIL, PASSWORD).await;
    app.log_in(EMAIL, PASSWORD).await;
    assert_eq!(app.get("/test/protected").await.status(), StatusCode::OK);

    app.set_active(EMAIL, false).await;
    let response = app.get("/test/protected").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Reactivating does not restore the session: the id was removed
    app.set_active(EMAIL, true).await;
    let response = app.get("/test/protected").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let home = app.get("/").await.text().await.unwrap();
    assert!(home.contains("Login"));
    assert!(!home.contains("Logout"));
    assert_eq!(app.protected_hits(), 1);
}

#[tokio::test]
async fn deactivated_user_cannot_log_in() {
    let app = TestApp::spawn().await;
    app.register("Alice", EMAIL, PASSWORD).await;
    app.set_active(EMAIL, false).await;

    let response = app.log_in(EMAIL, PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Email or Password is incorrect"));
}

#[tokio::test]
async fn logout_ends_the_authenticated_session() {
    let app = TestApp::spawn().await;
    app.register("Alice", EMAIL, PASSWORD).await;
    app.log_in(EMAIL, PASSWORD).await;

    let token = app.csrf_token("/").await;
    let response = app
        .post_form("/user/logout", &[("csrf_token", token.as_str())])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));

    let home = app.get("/").await.text().await.unwrap();
    assert!(home.contains("been logged out successfully!"));
    assert_eq!(app.get("/test/protected").await.status(), StatusCode::SEE_OTHER);
}
