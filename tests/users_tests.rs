mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::spawn_app;

#[tokio::test]
async fn register_returns_created_user() {
    let app = spawn_app().await;

    let (status, body) = app
        .post(
            "/users",
            None,
            json!({"username": "alice", "email": "alice@mesa.test", "password": "secret"}),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], "alice@mesa.test");
    assert!(body["user"]["id"].as_i64().unwrap() > 0);
    assert!(body["user"].get("password").is_none());
    assert!(body["user"]["createdAt"].is_string());
}

#[tokio::test]
async fn register_sends_welcome_mail() {
    let app = spawn_app().await;
    app.register("alice").await;

    let mail = app.wait_for_mail(1).await;
    assert_eq!(mail[0].to, "alice@mesa.test");
    assert!(mail[0].body.contains("alice"));
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = spawn_app().await;
    app.register("alice").await;

    let (status, body) = app
        .post(
            "/users",
            None,
            json!({"username": "other", "email": "alice@mesa.test", "password": "secret"}),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(body["status"], 409);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = spawn_app().await;
    app.register("alice").await;

    let (status, _) = app
        .post(
            "/users",
            None,
            json!({"username": "alice", "email": "other@mesa.test", "password": "secret"}),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_registration_is_unprocessable() {
    let app = spawn_app().await;

    for payload in [
        json!({"email": "a@mesa.test", "password": "secret"}),
        json!({"username": "a", "email": "not-an-email", "password": "secret"}),
        json!({"username": "a", "email": "a@mesa.test"}),
        json!({"username": "a", "email": "a@mesa.test", "password": "x"}),
    ] {
        let (status, body) = app.post("/users", None, payload.clone()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{payload}");
        assert_eq!(body["status"], 422);
    }
}

#[tokio::test]
async fn update_own_credentials() {
    let app = spawn_app().await;
    let (id, token) = app.user("alice").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/users/{id}"),
            Some(&token),
            Some(json!({"email": "alice2@mesa.test", "password": "changed"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["email"], "alice2@mesa.test");

    app.login("alice2@mesa.test", "changed").await;
    let (status, _) = app
        .post(
            "/sessions",
            None,
            json!({"email": "alice2@mesa.test", "password": "secret"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_other_user_is_forbidden() {
    let app = spawn_app().await;
    let (_, token) = app.user("alice").await;
    let bob = app.register("bob").await;

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/users/{bob}"),
            Some(&token),
            Some(json!({"email": "mine@mesa.test", "password": "secret"})),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn update_missing_user_is_not_found() {
    let app = spawn_app().await;
    let (_, token) = app.user("alice").await;

    let (status, _) = app
        .send(
            Method::PUT,
            "/users/9999",
            Some(&token),
            Some(json!({"email": "x@mesa.test", "password": "secret"})),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_to_taken_email_conflicts() {
    let app = spawn_app().await;
    let (id, token) = app.user("alice").await;
    app.register("bob").await;

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/users/{id}"),
            Some(&token),
            Some(json!({"email": "bob@mesa.test", "password": "secret"})),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn update_requires_authentication() {
    let app = spawn_app().await;
    let id = app.register("alice").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/users/{id}"),
            None,
            Some(json!({"email": "alice@mesa.test", "password": "secret"})),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
}
