// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role management tests: authentication before authorization, the
//! self-revocation guard and "already has role" failures.

use accounts_api::db::UserStore;
use accounts_api::models::Role;
use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;
use common::{create_test_app, register, register_admin, send};

#[tokio::test]
async fn test_unauthenticated_is_401_not_403() {
    let (app, _) = create_test_app();

    for uri in ["/api/v1/roles/assign-admin", "/api/v1/roles/revoke-admin"] {
        let (status, _) = send(&app, Method::POST, uri, None, Some(json!({ "user_id": 1 }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let (status, _) = send(&app, Method::GET, "/api/v1/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_admin_is_forbidden() {
    let (app, _) = create_test_app();
    let (id, token) = register(&app, "Ada", "ada@example.com").await;

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/v1/roles/assign-admin",
        Some(&token),
        Some(json!({ "user_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["status"], 403);
    assert_eq!(json["message"], "Access denied. Admin role required.");

    let (status, _) = send(&app, Method::GET, "/api/v1/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_forbidden_even_with_invalid_body() {
    let (app, _) = create_test_app();
    let (_, token) = register(&app, "Ada", "ada@example.com").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/roles/assign-admin",
        Some(&token),
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_assign_and_revoke() {
    let (app, state) = create_test_app();
    let (_, admin_token) = register_admin(&app, &state, "Root", "root@example.com").await;
    let (id, user_token) = register(&app, "Ada", "ada@example.com").await;

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/v1/roles/assign-admin",
        Some(&admin_token),
        Some(json!({ "user_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Admin role assigned successfully");
    assert_eq!(json["data"]["role"], "admin");

    // Role is re-read per request, so the existing token gains access.
    let (status, _) = send(&app, Method::GET, "/api/v1/users", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/v1/roles/revoke-admin",
        Some(&admin_token),
        Some(json!({ "user_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Admin role revoked successfully");
    assert_eq!(json["data"]["role"], "user");

    let (status, _) = send(&app, Method::GET, "/api/v1/users", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_assign_to_existing_admin_leaves_row_alone() {
    let (app, state) = create_test_app();
    let (_, admin_token) = register_admin(&app, &state, "Root", "root@example.com").await;
    let (other_id, _) = register_admin(&app, &state, "Second", "second@example.com").await;
    let before = state.store.find_by_id(other_id).await.unwrap().unwrap();

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/v1/roles/assign-admin",
        Some(&admin_token),
        Some(json!({ "user_id": other_id })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "User already has admin role");
    let after = state.store.find_by_id(other_id).await.unwrap().unwrap();
    assert_eq!(after.updated_at, before.updated_at);
    assert_eq!(after.role, Role::Admin);
}

#[tokio::test]
async fn test_revoke_from_regular_user() {
    let (app, state) = create_test_app();
    let (_, admin_token) = register_admin(&app, &state, "Root", "root@example.com").await;
    let (id, _) = register(&app, "Ada", "ada@example.com").await;

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/v1/roles/revoke-admin",
        Some(&admin_token),
        Some(json!({ "user_id": id })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "User already has user role");
}

#[tokio::test]
async fn test_admin_cannot_revoke_self() {
    let (app, state) = create_test_app();
    let (admin_id, admin_token) = register_admin(&app, &state, "Root", "root@example.com").await;

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/v1/roles/revoke-admin",
        Some(&admin_token),
        Some(json!({ "user_id": admin_id })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "You cannot revoke your own admin role");
    assert_eq!(
        state.store.find_by_id(admin_id).await.unwrap().unwrap().role,
        Role::Admin
    );
}

#[tokio::test]
async fn test_unknown_target() {
    let (app, state) = create_test_app();
    let (_, admin_token) = register_admin(&app, &state, "Root", "root@example.com").await;

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/v1/roles/assign-admin",
        Some(&admin_token),
        Some(json!({ "user_id": 4242 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["data"]["errors"]["user_id"][0],
        "The selected user does not exist."
    );

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/v1/roles/assign-admin",
        Some(&admin_token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["data"]["errors"]["user_id"][0], "The user ID is required.");
}
