// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Response envelope shared by every endpoint.
//!
//! ```json
//! { "status": 200, "errorCode": 0, "data": { ... }, "message": "..." }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::borrow::Cow;

/// Status taxonomy exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCode {
    Success,
    Created,
    BadRequest,
    Unauthorized,
    Forbidden,
    InternalError,
}

impl ApiCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiCode::Success => StatusCode::OK,
            ApiCode::Created => StatusCode::CREATED,
            ApiCode::BadRequest => StatusCode::BAD_REQUEST,
            ApiCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiCode::Forbidden => StatusCode::FORBIDDEN,
            ApiCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiCode::Success | ApiCode::Created)
    }
}

/// Wire form of the envelope.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope<'a, T: Serialize> {
    pub status: u16,
    pub error_code: u8,
    pub data: Option<&'a T>,
    pub message: &'a str,
}

impl<'a, T: Serialize> Envelope<'a, T> {
    pub fn new(code: ApiCode, data: Option<&'a T>, message: &'a str) -> Self {
        Self {
            status: code.status().as_u16(),
            error_code: if code.is_success() { 0 } else { 1 },
            data,
            message,
        }
    }

    pub fn into_response_with(self, code: ApiCode) -> Response {
        (code.status(), Json(self)).into_response()
    }
}

/// Successful result: status code, payload and message.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub code: ApiCode,
    pub data: Option<T>,
    pub message: Cow<'static, str>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: ApiCode::Success,
            data: Some(data),
            message: message.into(),
        }
    }

    pub fn created(data: T, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: ApiCode::Created,
            data: Some(data),
            message: message.into(),
        }
    }
}

impl ApiResponse<()> {
    /// Success with `"data": null`.
    pub fn message(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: ApiCode::Success,
            data: None,
            message: message.into(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Envelope::new(self.code, self.data.as_ref(), &self.message).into_response_with(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let data = serde_json::json!({ "id": 1 });
        let envelope = Envelope::new(ApiCode::Created, Some(&data), "Created");
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["status"], 201);
        assert_eq!(value["errorCode"], 0);
        assert_eq!(value["data"]["id"], 1);
        assert_eq!(value["message"], "Created");
    }

    #[test]
    fn test_failure_envelope_has_error_code() {
        let envelope = Envelope::<()>::new(ApiCode::Forbidden, None, "Nope");
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["status"], 403);
        assert_eq!(value["errorCode"], 1);
        assert!(value["data"].is_null());
    }

    #[test]
    fn test_response_status() {
        let response = ApiResponse::message("Done").into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
