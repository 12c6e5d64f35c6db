//! Shared harness: a fresh SQLite file per test, the real router, and a mailer
//! that records instead of sending.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use mesa::config::Config;
use mesa::db::Store;
use mesa::services::{MailMessage, Mailer};
use mesa::state::SharedState;
use serde_json::{Value, json};
use tower::ServiceExt;

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<MailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Store,
    pub mailer: Arc<RecordingMailer>,
    db_path: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
    }
}

pub fn test_config(db_path: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.observability.metrics_enabled = false;
    config
}

pub async fn spawn_app() -> TestApp {
    let db_path = std::env::temp_dir().join(format!("mesa-test-{}.db", uuid::Uuid::new_v4()));
    spawn_app_with(test_config(&db_path), db_path).await
}

pub async fn spawn_app_with(config: Config, db_path: PathBuf) -> TestApp {
    let mailer = Arc::new(RecordingMailer::default());

    let shared = SharedState::with_mailer(config, mailer.clone())
        .await
        .expect("failed to create shared state");
    let store = shared.store.clone();

    let state = mesa::api::create_app_state(Arc::new(shared), None);
    let router = mesa::api::router(state);

    TestApp {
        router,
        store,
        mailer,
        db_path,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers `name` with `name@mesa.test` / `secret`, returns the user id.
    pub async fn register(&self, name: &str) -> i64 {
        let (status, body) = self
            .post(
                "/users",
                None,
                json!({"username": name, "email": format!("{name}@mesa.test"), "password": "secret"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {name}: {body}");
        body["user"]["id"].as_i64().unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/sessions",
                None,
                json!({"email": email, "password": password}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "login {email}: {body}");
        body["token"]["token"].as_str().unwrap().to_string()
    }

    /// Registers and logs in; returns `(user_id, token)`.
    pub async fn user(&self, name: &str) -> (i64, String) {
        let id = self.register(name).await;
        let token = self.login(&format!("{name}@mesa.test"), "secret").await;
        (id, token)
    }

    pub async fn create_group(&self, token: &str, name: &str) -> i64 {
        let (status, body) = self
            .post("/groups", Some(token), group_payload(name))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create group {name}: {body}");
        body["group"]["id"].as_i64().unwrap()
    }

    pub async fn roster(&self, group_id: i64, token: &str) -> Vec<i64> {
        let (status, body) = self.get(&format!("/groups/{group_id}"), token).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["group"]["players"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_i64().unwrap())
            .collect()
    }

    /// Mail is delivered by a background task; poll until `count` messages arrived.
    pub async fn wait_for_mail(&self, count: usize) -> Vec<MailMessage> {
        for _ in 0..100 {
            {
                let sent = self.mailer.sent.lock().unwrap();
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} mail message(s)");
    }
}

pub fn group_payload(name: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{name} campaign"),
        "schedule": "Fridays 20h",
        "location": "Game store",
        "chronic": "Session zero pending",
    })
}
