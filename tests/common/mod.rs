// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use accounts_api::config::Config;
use accounts_api::db::{MemoryUserStore, UserStore};
use accounts_api::models::Role;
use accounts_api::routes::create_router;
use accounts_api::AppState;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "Secret123";

/// Create a test app backed by the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (axum::Router, Arc<AppState>) {
    let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
    let state = Arc::new(AppState::new(config, store).expect("Failed to build state"));
    (create_router(state.clone()), state)
}

/// Send a request and return the status plus the decoded envelope.
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

/// Register through the API and return `(user_id, token)`.
#[allow(dead_code)]
pub async fn register(app: &axum::Router, name: &str, email: &str) -> (i64, String) {
    let (status, json) = send(
        app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(serde_json::json!({
            "name": name,
            "email": email,
            "password": PASSWORD,
            "password_confirmation": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", json);

    (
        json["data"]["id"].as_i64().unwrap(),
        json["data"]["token"].as_str().unwrap().to_string(),
    )
}

/// Register a user and promote them directly in the store.
#[allow(dead_code)]
pub async fn register_admin(
    app: &axum::Router,
    state: &AppState,
    name: &str,
    email: &str,
) -> (i64, String) {
    let (id, token) = register(app, name, email).await;
    state.store.set_role(id, Role::Admin).await.unwrap();
    (id, token)
}
