// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use crate::services::password::HashCost;
use crate::services::seed::AdminSeed;
use std::env;
use std::str::FromStr;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// sqlx connection string, e.g. `sqlite://accounts.db`
    pub database_url: String,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,

    /// JWT signing key (raw bytes, at least 32)
    pub jwt_signing_key: Vec<u8>,
    pub jwt_ttl_minutes: i64,
    /// How long after issue a token may still be refreshed
    pub jwt_refresh_ttl_minutes: i64,

    pub hash_cost: HashCost,

    /// Bootstrap admin, only when both email and password are set
    pub admin_seed: Option<AdminSeed>,
}

impl Config {
    /// Config for tests: fixed key and a cheap hash cost.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            database_url: "sqlite::memory:".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            jwt_ttl_minutes: 60,
            jwt_refresh_ttl_minutes: 20160,
            hash_cost: HashCost {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
            admin_seed: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = HashCost::default();

        let admin_seed = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminSeed {
                name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
                email: email.trim().to_string(),
                password,
            }),
            _ => None,
        };

        Ok(Self {
            port: parse_or("PORT", 8080)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://accounts.db".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            jwt_ttl_minutes: parse_or("JWT_TTL_MINUTES", 60)?,
            jwt_refresh_ttl_minutes: parse_or("JWT_REFRESH_TTL_MINUTES", 20160)?,

            hash_cost: HashCost {
                memory_kib: parse_or("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
                iterations: parse_or("PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
                parallelism: parse_or("PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
            },

            admin_seed,
        })
    }
}

/// Read `name`, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
