// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin role management routes (admin only).

use axum::{extract::State, routing::post, Extension, Router};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::auth::UserResponse;
use crate::routes::extract::{push_error, RequestRules, ValidatedJson};
use crate::services::roles::TARGET_MISSING;
use crate::AppState;

/// Routes behind `require_auth` and `require_admin`, applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/roles/assign-admin", post(assign_admin))
        .route("/api/v1/roles/revoke-admin", post(revoke_admin))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RoleChangeRequest {
    pub user_id: Option<serde_json::Value>,
}

impl RoleChangeRequest {
    fn target(&self) -> Option<i64> {
        self.user_id.as_ref().and_then(serde_json::Value::as_i64)
    }
}

impl RequestRules for RoleChangeRequest {
    fn check_fields(&self, errors: &mut FieldErrors) {
        match (&self.user_id, self.target()) {
            (None, _) => push_error(errors, "user_id", "The user ID is required."),
            (Some(_), None) => push_error(errors, "user_id", "The user ID must be an integer."),
            (Some(_), Some(id)) if id < 1 => push_error(errors, "user_id", TARGET_MISSING),
            _ => {}
        }
    }
}

/// Validated target id, or a validation failure when no such user exists.
async fn existing_target(state: &AppState, req: &RoleChangeRequest) -> Result<i64> {
    let user_id = req
        .target()
        .ok_or_else(|| AppError::validation("user_id", TARGET_MISSING))?;
    if state.store.find_by_id(user_id).await?.is_none() {
        return Err(AppError::validation("user_id", TARGET_MISSING));
    }
    Ok(user_id)
}

async fn assign_admin(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<RoleChangeRequest>,
) -> Result<ApiResponse<UserResponse>> {
    let user_id = existing_target(&state, &req).await?;
    let user = state.role_service.assign_admin(user_id).await?;

    tracing::info!(admin_id = auth.user.id, user_id, "Admin granted role");
    Ok(ApiResponse::success(
        UserResponse::from(&user),
        "Admin role assigned successfully",
    ))
}

async fn revoke_admin(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<RoleChangeRequest>,
) -> Result<ApiResponse<UserResponse>> {
    if req.target() == Some(auth.user.id) {
        return Err(AppError::SelfRevocationForbidden);
    }

    let user_id = existing_target(&state, &req).await?;
    let user = state.role_service.revoke_admin(user_id).await?;

    tracing::info!(admin_id = auth.user.id, user_id, "Admin revoked role");
    Ok(ApiResponse::success(
        UserResponse::from(&user),
        "Admin role revoked successfully",
    ))
}
