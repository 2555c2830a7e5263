// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Accounts API: user registration, JWT sessions and admin role management.
//!
//! This crate provides the HTTP backend. Persistence goes through the
//! [`db::UserStore`] trait, backed by SQLite in production and an in-memory
//! map in tests.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::UserStore;
use services::{AuthService, PasswordHasher, RoleService, TokenIssuer, UserService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn UserStore>,
    pub hasher: Arc<PasswordHasher>,
    pub tokens: Arc<TokenIssuer>,
    pub auth_service: AuthService,
    pub role_service: RoleService,
    pub user_service: UserService,
}

impl AppState {
    /// Wire services around `store`. Fails if the signing key or hash cost
    /// in `config` is unusable.
    pub fn new(config: Config, store: Arc<dyn UserStore>) -> anyhow::Result<Self> {
        let hasher = Arc::new(PasswordHasher::new(config.hash_cost)?);
        let tokens = Arc::new(TokenIssuer::new(
            &config.jwt_signing_key,
            config.jwt_ttl_minutes.saturating_mul(60),
            config.jwt_refresh_ttl_minutes.saturating_mul(60),
        )?);

        Ok(Self {
            auth_service: AuthService::new(store.clone(), hasher.clone(), tokens.clone()),
            role_service: RoleService::new(store.clone()),
            user_service: UserService::new(store.clone()),
            config,
            store,
            hasher,
            tokens,
        })
    }
}
