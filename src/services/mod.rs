// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod password;
pub mod roles;
pub mod seed;
pub mod tokens;
pub mod users;

pub use auth::{AuthService, AuthenticatedUser, ProfileUpdate, Registration};
pub use password::{HashCost, PasswordHasher};
pub use roles::RoleService;
pub use seed::{ensure_admin, AdminSeed, SeedOutcome};
pub use tokens::{IssuedToken, TokenError, TokenIssuer};
pub use users::UserService;
