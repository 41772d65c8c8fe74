mod common;

use axum::http::{StatusCode, header};
use chrono::{Duration, Utc};
use storefront::{
    repo::user_by_email,
    tokens::{CONFIRMATION_WINDOW_SECS, issue_confirmation_token},
};

use common::TestApp;

fn register_body(email: &str) -> serde_json::Value {
    serde_json::json!({
        "name": "Ada",
        "phone": "5550100",
        "email": email,
        "password": "hunter22",
        "confirm": "hunter22"
    })
}

/// Follow a confirmation link and return the flash (category, message).
async fn confirm(app: &TestApp, token: &str) -> (String, String) {
    let response = app
        .send(common::empty_request("GET", &format!("/api/auth/confirm/{token}"), None))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
    let url = reqwest::Url::parse(&location).unwrap();
    assert!(location.starts_with(common::LOGIN_URL));
    let pair = |key: &str| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default()
    };
    (pair("category"), pair("message"))
}

fn token_from_mail(app: &TestApp) -> String {
    let sent = app.mailer.sent.lock().unwrap();
    let html = &sent.last().expect("confirmation mail").html;
    let start = html.find("/api/auth/confirm/").unwrap() + "/api/auth/confirm/".len();
    html[start..]
        .split('"')
        .next()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn registration_mails_a_link_that_confirms_once() {
    let app = common::spawn_app().await;

    let response = app
        .send(common::json_request("POST", "/api/auth/register", None, register_body("ada@example.com")))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    assert_eq!(body["data"]["email_confirmed"], false);
    assert!(body["data"].get("password_hash").is_none());

    {
        let sent = app.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
        assert!(sent[0].html.contains("http://localhost:3000/api/auth/confirm/"));
    }
    let token = token_from_mail(&app);

    let (category, message) = confirm(&app, &token).await;
    assert_eq!(category, "success");
    assert_eq!(message, "Email address successfully confirmed!");
    let user = user_by_email(&app.state.orm, "ada@example.com").await.unwrap().unwrap();
    assert!(user.email_confirmed);

    let (category, message) = confirm(&app, &token).await;
    assert_eq!(category, "success");
    assert_eq!(message, "Account already confirmed. Please login.");
}

#[tokio::test]
async fn expired_and_forged_links_are_rejected() {
    let app = common::spawn_app().await;
    app.send(common::json_request("POST", "/api/auth/register", None, register_body("ada@example.com")))
        .await;

    let stale = Utc::now() - Duration::seconds(CONFIRMATION_WINDOW_SECS + 1);
    let token = issue_confirmation_token(common::SECRET_KEY, "ada@example.com", stale).unwrap();
    let (category, message) = confirm(&app, &token).await;
    assert_eq!(category, "error");
    assert_eq!(message, "The confirmation link is invalid or has expired.");

    let forged = issue_confirmation_token("other-secret", "ada@example.com", Utc::now()).unwrap();
    assert_eq!(confirm(&app, &forged).await.0, "error");

    let unknown = issue_confirmation_token(common::SECRET_KEY, "nobody@example.com", Utc::now()).unwrap();
    assert_eq!(confirm(&app, &unknown).await.0, "error");

    let user = user_by_email(&app.state.orm, "ada@example.com").await.unwrap().unwrap();
    assert!(!user.email_confirmed);

    let fresh = Utc::now() - Duration::seconds(CONFIRMATION_WINDOW_SECS - 1);
    let token = issue_confirmation_token(common::SECRET_KEY, "ada@example.com", fresh).unwrap();
    assert_eq!(confirm(&app, &token).await.0, "success");
}

#[tokio::test]
async fn registration_survives_mail_failure_and_rejects_duplicates() {
    let app = common::spawn_app().await;
    *app.mailer.fail.lock().unwrap() = true;

    let response = app
        .send(common::json_request("POST", "/api/auth/register", None, register_body("ada@example.com")))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .send(common::json_request("POST", "/api/auth/register", None, register_body("ada@example.com")))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut mismatched = register_body("bob@example.com");
    mismatched["confirm"] = "different".into();
    let response = app
        .send(common::json_request("POST", "/api/auth/register", None, mismatched))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn concurrent_registrations_for_one_email_never_error() {
    let app = common::spawn_app().await;

    let (first, second) = tokio::join!(
        app.send(common::json_request("POST", "/api/auth/register", None, register_body("eve@example.com"))),
        app.send(common::json_request("POST", "/api/auth/register", None, register_body("eve@example.com"))),
    );

    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);

    let rejected = if first.status() == StatusCode::BAD_REQUEST { first } else { second };
    let body = common::body_json(rejected).await;
    assert_eq!(body["message"], "Bad Request User with email eve@example.com already exists!!");
}

#[tokio::test]
async fn login_me_and_resend() {
    let app = common::spawn_app().await;
    app.send(common::json_request("POST", "/api/auth/register", None, register_body("ada@example.com")))
        .await;

    let response = app
        .send(common::json_request(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "email": "ada@example.com", "password": "wrong" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(common::json_request(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "email": "ada@example.com", "password": "hunter22" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert!(token.starts_with("Bearer "));

    let response = app
        .send(common::empty_request("GET", "/api/auth/me", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["data"]["email"], "ada@example.com");

    let response = app
        .send(common::empty_request("POST", "/api/auth/resend", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.mailer.sent.lock().unwrap().len(), 2);

    let response = app
        .send(common::empty_request("POST", "/api/auth/resend", None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
