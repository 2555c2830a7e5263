// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::db::StoreError;
use crate::response::{ApiCode, Envelope};
use crate::services::password::PasswordError;
use crate::services::tokens::{SigningError, TokenError};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::collections::BTreeMap;

/// Field name -> messages, as returned under `data.errors`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("The email has already been taken.")]
    DuplicateEmail,

    /// Unknown email and wrong password are deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token provided")]
    TokenInvalid,

    #[error("Token has been blacklisted")]
    TokenBlacklisted,

    #[error("User not found")]
    UserNotFound,

    #[error("The old password is incorrect.")]
    OldPasswordIncorrect,

    #[error("The new password must be different from the old password.")]
    PasswordUnchanged,

    #[error("The password is incorrect.")]
    IncorrectPassword,

    #[error("User already has admin role")]
    AlreadyAdmin,

    #[error("User already has user role")]
    AlreadyUser,

    #[error("You cannot revoke your own admin role")]
    SelfRevocationForbidden,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Access denied. Admin role required.")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Single-field validation failure.
    pub fn validation(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        AppError::Validation(errors)
    }

    pub fn code(&self) -> ApiCode {
        match self {
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::DuplicateEmail
            | AppError::OldPasswordIncorrect
            | AppError::PasswordUnchanged
            | AppError::IncorrectPassword
            | AppError::AlreadyAdmin
            | AppError::AlreadyUser
            | AppError::SelfRevocationForbidden => ApiCode::BadRequest,
            AppError::InvalidCredentials
            | AppError::TokenExpired
            | AppError::TokenInvalid
            | AppError::TokenBlacklisted
            | AppError::UserNotFound
            | AppError::Unauthorized => ApiCode::Unauthorized,
            AppError::Forbidden => ApiCode::Forbidden,
            AppError::Database(_) | AppError::Internal(_) => ApiCode::InternalError,
        }
    }

    /// Request field a failure is attributed to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            AppError::DuplicateEmail => Some("email"),
            AppError::OldPasswordIncorrect => Some("old_password"),
            AppError::PasswordUnchanged | AppError::IncorrectPassword => Some("password"),
            _ => None,
        }
    }

    fn data(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Validation(errors) => Some(json!({ "errors": errors })),
            other => other.field().map(|field| {
                let mut errors = FieldErrors::new();
                errors.insert(field.to_string(), vec![other.to_string()]);
                json!({ "errors": errors })
            }),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let message = match &self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                "Database error".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let data = self.data();
        Envelope::new(code, data.as_ref(), &message).into_response_with(code)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AppError::DuplicateEmail,
            StoreError::Database(msg) => AppError::Database(msg),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::TokenExpired,
            TokenError::Invalid => AppError::TokenInvalid,
            TokenError::Blacklisted => AppError::TokenBlacklisted,
        }
    }
}

impl From<SigningError> for AppError {
    fn from(err: SigningError) -> Self {
        AppError::Internal(anyhow::anyhow!(err))
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(anyhow::anyhow!(err))
    }
}

/// Flatten validator output into `field -> messages`.
pub fn field_errors(errors: &validator::ValidationErrors) -> FieldErrors {
    let mut fields = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|err| {
                err.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {} field is invalid.", field))
            })
            .collect();
        fields.insert(field.to_string(), messages);
    }
    fields
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(field_errors(&errors))
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
