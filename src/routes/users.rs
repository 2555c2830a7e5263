// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User listing route (admin only).

use axum::{extract::State, routing::get, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::{SortDirection, UserQuery, UserSortColumn, DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::error::{FieldErrors, Result};
use crate::response::ApiResponse;
use crate::routes::auth::UserResponse;
use crate::routes::extract::{push_error, RequestRules, ValidatedQuery};
use crate::AppState;

/// Routes behind `require_auth` and `require_admin`, applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/v1/users", get(list_users))
}

/// Query parameters arrive as strings so bad numbers get field messages
/// instead of a deserialization failure.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListUsersParams {
    #[validate(length(
        max = 255,
        message = "The search may not be greater than 255 characters."
    ))]
    pub search: Option<String>,
    pub order_by: Option<String>,
    pub order_direction: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl ListUsersParams {
    fn page(&self) -> Option<std::result::Result<i64, ()>> {
        self.page.as_deref().map(|p| p.trim().parse().map_err(|_| ()))
    }

    fn per_page(&self) -> Option<std::result::Result<i64, ()>> {
        self.per_page
            .as_deref()
            .map(|p| p.trim().parse().map_err(|_| ()))
    }

    /// Convert checked parameters into a store query.
    pub fn to_query(&self) -> UserQuery {
        UserQuery {
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            order_by: self
                .order_by
                .as_deref()
                .and_then(UserSortColumn::parse)
                .unwrap_or_default(),
            order_direction: self
                .order_direction
                .as_deref()
                .and_then(SortDirection::parse)
                .unwrap_or_default(),
            page: match self.page() {
                Some(Ok(page)) => u32::try_from(page).unwrap_or(u32::MAX).max(1),
                _ => 1,
            },
            per_page: match self.per_page() {
                Some(Ok(per_page)) => per_page.clamp(1, MAX_PER_PAGE as i64) as u32,
                _ => DEFAULT_PER_PAGE,
            },
        }
    }
}

impl RequestRules for ListUsersParams {
    fn check_fields(&self, errors: &mut FieldErrors) {
        match self.page() {
            Some(Err(())) => push_error(errors, "page", "The page must be an integer."),
            Some(Ok(page)) if page < 1 => push_error(errors, "page", "The page must be at least 1."),
            _ => {}
        }

        match self.per_page() {
            Some(Err(())) => push_error(errors, "per_page", "The per_page must be an integer."),
            Some(Ok(n)) if n < 1 => push_error(errors, "per_page", "The per_page must be at least 1."),
            Some(Ok(n)) if n > MAX_PER_PAGE as i64 => push_error(
                errors,
                "per_page",
                "The per_page may not be greater than 100.",
            ),
            _ => {}
        }

        if let Some(order_by) = &self.order_by {
            if UserSortColumn::parse(order_by).is_none() {
                push_error(
                    errors,
                    "order_by",
                    "The order_by field must be one of: id, name, email, created_at, updated_at.",
                );
            }
        }

        if let Some(direction) = &self.order_direction {
            if SortDirection::parse(direction).is_none() {
                push_error(
                    errors,
                    "order_direction",
                    "The order_direction must be either asc or desc.",
                );
            }
        }
    }
}

/// One page of users.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UsersPage {
    pub users: Vec<UserResponse>,
    pub page: u32,
    pub per_page: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total: u64,
    pub last_page: u32,
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(params): ValidatedQuery<ListUsersParams>,
) -> Result<ApiResponse<UsersPage>> {
    let page = state.user_service.list(&params.to_query()).await?;

    Ok(ApiResponse::success(
        UsersPage {
            users: page.items.iter().map(UserResponse::from).collect(),
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            last_page: page.last_page(),
        },
        "Users retrieved successfully",
    ))
}
