// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin role assignment and revocation.

use crate::db::{RoleUpdate, UserStore};
use crate::error::{AppError, Result};
use crate::models::{Role, User};
use std::sync::Arc;

/// Field error for a role change whose target does not exist.
pub const TARGET_MISSING: &str = "The selected user does not exist.";

fn target_missing() -> AppError {
    AppError::validation("user_id", TARGET_MISSING)
}

#[derive(Clone)]
pub struct RoleService {
    store: Arc<dyn UserStore>,
}

impl RoleService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Promote `user_id` to admin.
    pub async fn assign_admin(&self, user_id: i64) -> Result<User> {
        match self.store.set_role(user_id, Role::Admin).await? {
            RoleUpdate::Updated(user) => {
                tracing::info!(user_id, "Admin role assigned");
                Ok(user)
            }
            RoleUpdate::Unchanged(_) => Err(AppError::AlreadyAdmin),
            RoleUpdate::Missing => Err(target_missing()),
        }
    }

    /// Demote `user_id` to a regular user.
    ///
    /// Callers must reject self-revocation before getting here.
    pub async fn revoke_admin(&self, user_id: i64) -> Result<User> {
        match self.store.set_role(user_id, Role::User).await? {
            RoleUpdate::Updated(user) => {
                tracing::info!(user_id, "Admin role revoked");
                Ok(user)
            }
            RoleUpdate::Unchanged(_) => Err(AppError::AlreadyUser),
            RoleUpdate::Missing => Err(target_missing()),
        }
    }
}
