// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: register, login, token refresh and self-service profile.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{delete, get, post, put},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::auth::{bearer_token, AuthUser};
use crate::models::{Role, User};
use crate::response::ApiResponse;
use crate::routes::extract::{push_error, RequestRules, ValidatedJson};
use crate::services::{AuthenticatedUser, ProfileUpdate, Registration};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

/// Routes that need no token.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        // Reads its own (possibly expired) token instead of going through
        // require_auth.
        .route("/api/v1/auth/refresh", post(refresh))
}

/// Routes behind `require_auth`, applied in routes/mod.rs.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/auth/update-profile", put(update_profile))
        .route("/api/v1/auth/delete-account", delete(delete_account))
}

// ─── Response Types ──────────────────────────────────────────

/// Public view of a user. Never includes the password hash.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: format_utc_rfc3339(user.created_at),
            updated_at: format_utc_rfc3339(user.updated_at),
        }
    }
}

/// User plus a bearer token.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthPayload {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub expires_in: i64,
}

impl From<AuthenticatedUser> for AuthPayload {
    fn from(auth: AuthenticatedUser) -> Self {
        Self {
            user: UserResponse::from(&auth.user),
            expires_in: auth.token.expires_in(),
            token: auth.token.token,
            token_type: "bearer".to_string(),
        }
    }
}

// ─── Request Validation ──────────────────────────────────────

/// At least 8 characters, mixed case, at least one digit.
fn validate_password_strength(password: &str) -> std::result::Result<(), ValidationError> {
    if password.chars().count() < 8 {
        return Err(ValidationError::new("password_length")
            .with_message("The password must be at least 8 characters.".into()));
    }
    let has_upper = password.chars().any(char::is_uppercase);
    let has_lower = password.chars().any(char::is_lowercase);
    if !has_upper || !has_lower {
        return Err(ValidationError::new("password_mixed_case").with_message(
            "The password must contain at least one uppercase and one lowercase letter.".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("password_numbers")
            .with_message("The password must contain at least one number.".into()));
    }
    Ok(())
}

/// Replace any other failures for `field` with a single "required" message.
fn require(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(
            field.to_string(),
            vec![format!("The {} field is required.", field.replace('_', " "))],
        );
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(
        max = 255,
        message = "The name may not be greater than 255 characters."
    ))]
    pub name: String,
    #[serde(default)]
    #[validate(
        email(message = "The email must be a valid email address."),
        length(
            max = 255,
            message = "The email may not be greater than 255 characters."
        )
    )]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

impl RequestRules for RegisterRequest {
    fn check_fields(&self, errors: &mut FieldErrors) {
        if self.password != self.password_confirmation {
            push_error(errors, "password", "The password confirmation does not match.");
        }
        require(errors, "name", &self.name);
        require(errors, "email", &self.email);
        require(errors, "password", &self.password);
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RequestRules for LoginRequest {
    fn check_fields(&self, errors: &mut FieldErrors) {
        require(errors, "email", &self.email);
        if self.password.is_empty() {
            push_error(errors, "password", "The password field is required.");
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(
        max = 255,
        message = "The name may not be greater than 255 characters."
    ))]
    pub name: Option<String>,
    #[validate(
        email(message = "The email must be a valid email address."),
        length(
            max = 255,
            message = "The email may not be greater than 255 characters."
        )
    )]
    pub email: Option<String>,
    pub old_password: Option<String>,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

impl UpdateProfileRequest {
    /// A password counts as supplied only when non-empty.
    fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

impl RequestRules for UpdateProfileRequest {
    fn check_fields(&self, errors: &mut FieldErrors) {
        if let Some(name) = &self.name {
            require(errors, "name", name);
        }
        if let Some(email) = &self.email {
            require(errors, "email", email);
        }

        if self.new_password().is_none() {
            // An empty password is treated as absent, not as a weak one.
            errors.remove("password");
            return;
        }
        if self.old_password.as_deref().unwrap_or("").is_empty() {
            push_error(
                errors,
                "old_password",
                "The old password is required when changing password.",
            );
        }
        if self.password_confirmation != self.password {
            push_error(errors, "password", "The password confirmation does not match.");
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteAccountRequest {
    #[serde(default)]
    pub password: String,
}

impl RequestRules for DeleteAccountRequest {
    fn check_fields(&self, errors: &mut FieldErrors) {
        if self.password.is_empty() {
            push_error(
                errors,
                "password",
                "The password is required to confirm account deletion.",
            );
        }
    }
}

// ─── Handlers ────────────────────────────────────────────────

async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<ApiResponse<AuthPayload>> {
    let auth = state
        .auth_service
        .register(Registration {
            name: req.name.trim().to_string(),
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(ApiResponse::created(
        AuthPayload::from(auth),
        "User registered successfully",
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<ApiResponse<AuthPayload>> {
    let auth = state.auth_service.login(&req.email, &req.password).await?;

    Ok(ApiResponse::success(
        AuthPayload::from(auth),
        "Logged In Successfully",
    ))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<ApiResponse<AuthPayload>> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    let auth = state.auth_service.refresh(token).await?;

    Ok(ApiResponse::success(
        AuthPayload::from(auth),
        "Token refreshed successfully",
    ))
}

async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<ApiResponse<UserResponse>> {
    let user = state.auth_service.me(&auth.user);

    Ok(ApiResponse::success(
        UserResponse::from(&user),
        "User retrieved successfully",
    ))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<ApiResponse<UserResponse>> {
    let update = ProfileUpdate {
        name: req.name.as_deref().map(|n| n.trim().to_string()),
        email: req.email.clone(),
        new_password: req.new_password().map(str::to_string),
        old_password: req.old_password,
    };

    let user = state
        .auth_service
        .update_profile(&auth.user, update)
        .await?;

    Ok(ApiResponse::success(
        UserResponse::from(&user),
        "Profile updated successfully",
    ))
}

async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<DeleteAccountRequest>,
) -> Result<ApiResponse<()>> {
    state
        .auth_service
        .delete_account(&auth.user, &req.password)
        .await?;

    Ok(ApiResponse::message("Account deleted successfully"))
}
