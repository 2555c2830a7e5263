// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bootstrap admin account created at startup.

use crate::db::{StoreError, UserStore};
use crate::error::Result;
use crate::models::{NewUser, Role, User};
use crate::services::auth::normalize_email;
use crate::services::password::PasswordHasher;

/// Credentials for the bootstrap admin.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Created(User),
    /// A user with that email exists; it was left as is.
    AlreadyExists,
}

/// Create the admin described by `seed` unless its email is already taken.
pub async fn ensure_admin(
    store: &dyn UserStore,
    hasher: &PasswordHasher,
    seed: &AdminSeed,
) -> Result<SeedOutcome> {
    let email = normalize_email(&seed.email);
    if store.find_by_email(&email).await?.is_some() {
        tracing::debug!("Admin seed skipped, email already registered");
        return Ok(SeedOutcome::AlreadyExists);
    }

    let new_user = NewUser {
        name: seed.name.clone(),
        email,
        password_hash: hasher.hash(&seed.password)?,
        role: Role::Admin,
    };

    match store.create(new_user).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, "Seeded admin account");
            Ok(SeedOutcome::Created(user))
        }
        Err(StoreError::DuplicateEmail) => Ok(SeedOutcome::AlreadyExists),
        Err(e) => Err(e.into()),
    }
}
