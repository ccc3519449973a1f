//! Signup, login, and password change.

use snippetbox_integration_tests::{StatusCode, TestApp, location};

const EMAIL: &str = "alice@example.com";
const PASSWORD: &str = "correct horse battery";

async fn sign_up(app: &TestApp, name: &str, email: &str, password: &str) -> reqwest::Response {
    app.submit(
        "/user/signup",
        "/user/signup",
        &[("name", name), ("email", email), ("password", password)],
    )
    .await
}

#[tokio::test]
async fn blank_name_redisplays_the_form() {
    let app = TestApp::spawn().await;

    let response = sign_up(&app, "", "bob@example.com", "validPa$$word").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.text().await.unwrap();
    assert!(body.contains("This field cannot be blank"));
    assert!(body.contains("value='bob@example.com'"));
    assert!(!body.contains("validPa$$word"));
    assert!(app.users.is_empty().await);
}

#[tokio::test]
async fn signup_field_rules() {
    let app = TestApp::spawn().await;

    let body = sign_up(&app, "Bob", "bob@example.", "short")
        .await
        .text()
        .await
        .unwrap();
    assert!(body.contains("This field is invalid"));
    assert!(body.contains("This field is too short (minimum is 10 characters)"));
    assert!(app.users.is_empty().await);
}

#[tokio::test]
async fn duplicate_email_is_reported_without_a_new_row() {
    let app = TestApp::spawn().await;
    app.register("Alice", EMAIL, PASSWORD).await;

    let response = sign_up(&app, "Mallory", EMAIL, "validPa$$word").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Email address is already in use")
    );
    assert_eq!(app.users.len().await, 1);
}

#[tokio::test]
async fn valid_signup_redirects_to_login() {
    let app = TestApp::spawn().await;

    let response = sign_up(&app, "Bob", "bob@example.com", "validPa$$word").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/user/login"));
    assert_eq!(app.users.len().await, 1);

    let login = app.get("/user/login").await.text().await.unwrap();
    assert!(login.contains("Your signup was successful. Please log in."));

    let response = app.log_in("bob@example.com", "validPa$$word").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = TestApp::spawn().await;
    app.register("Alice", EMAIL, PASSWORD).await;

    let wrong = app.log_in(EMAIL, "not the password").await;
    assert_eq!(wrong.status(), StatusCode::OK);
    let wrong = wrong.text().await.unwrap();

    let unknown = app.log_in("nobody@example.com", "not the password").await;
    assert_eq!(unknown.status(), StatusCode::OK);
    let unknown = unknown.text().await.unwrap();

    assert!(wrong.contains("Email or Password is incorrect"));
    assert!(unknown.contains("Email or Password is incorrect"));
    assert_eq!(app.get("/test/protected").await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn login_rotates_the_session_cookie() {
    let app = TestApp::spawn().await;
    app.register("Alice", EMAIL, PASSWORD).await;

    let before = app.get("/user/login").await;
    let before_cookie = session_cookie(&before).expect("session started");

    let response = app.log_in(EMAIL, PASSWORD).await;
    let after_cookie = session_cookie(&response).expect("cookie reissued on login");
    assert_ne!(before_cookie, after_cookie);
}

fn session_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|c| c.starts_with("snippetbox_session="))
        .and_then(|c| c.split(';').next())
        .map(str::to_owned)
}

#[tokio::test]
async fn profile_shows_account_details() {
    let app = TestApp::spawn().await;
    app.register("Alice", EMAIL, PASSWORD).await;
    app.log_in(EMAIL, PASSWORD).await;

    let response = app.get("/user/profile").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Alice"));
    assert!(body.contains(EMAIL));
}

#[tokio::test]
async fn change_password() {
    let app = TestApp::spawn().await;
    app.register("Alice", EMAIL, PASSWORD).await;
    app.log_in(EMAIL, PASSWORD).await;

    let response = app
        .submit(
            "/user/password",
            "/user/password",
            &[
                ("current_password", "wrong password"),
                ("new_password", "brand new password"),
                ("confirm_password", "brand new password"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Current password is incorrect"));

    let response = app
        .submit(
            "/user/password",
            "/user/password",
            &[
                ("current_password", PASSWORD),
                ("new_password", "brand new password"),
                ("confirm_password", "different password"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Passwords do not match"));

    let response = app
        .submit(
            "/user/password",
            "/user/password",
            &[
                ("current_password", PASSWORD),
                ("new_password", "brand new password"),
                ("confirm_password", "brand new password"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/user/profile"));

    let profile = app.get("/user/profile").await.text().await.unwrap();
    assert!(profile.contains("Your password has been updated!"));

    assert!(app.state.auth().authenticate(EMAIL, PASSWORD).await.is_err());
    assert!(
        app.state
            .auth()
            .authenticate(EMAIL, "brand new password")
            .await
            .is_ok()
    );
}
