// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token issuance, verification and refresh.
//!
//! Tokens are HS256 JWTs carrying two windows:
//! - `exp`: end of the access window, after which the token no longer
//!   authenticates requests;
//! - `rfx`: end of the refresh window, until which an expired token may
//!   still be exchanged (once) for a fresh one.
//!
//! Exchanged tokens are blacklisted by `jti` until their refresh window
//! closes. The blacklist is the only server-side token state.

use crate::time_utils::unix_now;
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Minimum HS256 key length in bytes.
pub const MIN_SIGNING_KEY_LEN: usize = 32;

/// Longest accepted lifetime for either window (100 years).
pub const MAX_TTL_SECS: i64 = 100 * 365 * 24 * 3600;

/// Purge closed refresh windows from the blacklist every N rotations.
const BLACKLIST_PURGE_INTERVAL: usize = 1024;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Access expiry (Unix timestamp)
    pub exp: i64,
    /// Refresh expiry (Unix timestamp)
    pub rfx: i64,
    /// Unique token ID, the blacklist key
    pub jti: String,
}

/// A freshly minted token and its windows.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: i64,
    pub expires_at: i64,
    pub refresh_expires_at: i64,
}

impl IssuedToken {
    /// Seconds until the access window closes, measured from issuance.
    pub fn expires_in(&self) -> i64 {
        self.expires_at - self.issued_at
    }
}

/// Request-level token failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token provided")]
    Invalid,

    #[error("Token has been blacklisted")]
    Blacklisted,
}

/// Key or lifetime misconfiguration. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("JWT signing key must be at least {min} bytes, got {len}")]
    KeyTooShort { len: usize, min: usize },

    #[error("Token lifetimes invalid: access {access_secs}s, refresh {refresh_secs}s")]
    InvalidLifetimes { access_secs: i64, refresh_secs: i64 },

    #[error("Token windows overflow at {now}")]
    Overflow { now: i64 },

    #[error("Token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// Mints and checks bearer tokens.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
    /// jti -> refresh expiry of the rotated token
    blacklist: DashMap<String, i64>,
    rotations: AtomicUsize,
}

impl TokenIssuer {
    /// Build an issuer. The refresh window must be at least as long as the
    /// access window, and neither may exceed [`MAX_TTL_SECS`].
    pub fn new(
        signing_key: &[u8],
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Result<Self, SigningError> {
        if signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(SigningError::KeyTooShort {
                len: signing_key.len(),
                min: MIN_SIGNING_KEY_LEN,
            });
        }
        if access_ttl_secs <= 0
            || refresh_ttl_secs < access_ttl_secs
            || refresh_ttl_secs > MAX_TTL_SECS
        {
            return Err(SigningError::InvalidLifetimes {
                access_secs: access_ttl_secs,
                refresh_secs: refresh_ttl_secs,
            });
        }

        // Expiry is checked by hand against both windows, so the library
        // only verifies the signature and claim shape.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
            validation,
            access_ttl_secs,
            refresh_ttl_secs,
            blacklist: DashMap::new(),
            rotations: AtomicUsize::new(0),
        })
    }

    /// Mint a token for `user_id`.
    pub fn issue(&self, user_id: i64) -> Result<IssuedToken, SigningError> {
        self.issue_at(user_id, unix_now())
    }

    pub fn issue_at(&self, user_id: i64, now: i64) -> Result<IssuedToken, SigningError> {
        let (Some(exp), Some(rfx)) = (
            now.checked_add(self.access_ttl_secs),
            now.checked_add(self.refresh_ttl_secs),
        ) else {
            return Err(SigningError::Overflow { now });
        };
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp,
            rfx,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken {
            token,
            issued_at: claims.iat,
            expires_at: claims.exp,
            refresh_expires_at: claims.rfx,
        })
    }

    /// Resolve a token to its user ID if it is inside its access window.
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        self.verify_at(token, unix_now())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<i64, TokenError> {
        let claims = self.decode(token)?;

        if self.blacklist.contains_key(&claims.jti) {
            return Err(TokenError::Blacklisted);
        }
        if now > claims.exp {
            return Err(TokenError::Expired);
        }

        subject(&claims)
    }

    /// Exchange a token for a new one. Works after the access window has
    /// closed as long as the refresh window is open. The presented token is
    /// consumed.
    pub fn refresh(&self, token: &str) -> Result<(i64, IssuedToken), TokenError> {
        self.refresh_at(token, unix_now())
    }

    pub fn refresh_at(&self, token: &str, now: i64) -> Result<(i64, IssuedToken), TokenError> {
        let claims = self.decode(token)?;

        if self.blacklist.contains_key(&claims.jti) {
            return Err(TokenError::Blacklisted);
        }
        if now > claims.rfx {
            return Err(TokenError::Expired);
        }
        let user_id = subject(&claims)?;

        let issued = self.issue_at(user_id, now).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign refreshed token");
            TokenError::Invalid
        })?;

        // Claim the rotation. Whoever inserts first wins; a concurrent
        // exchange of the same token sees the existing entry.
        if self.blacklist.insert(claims.jti, claims.rfx).is_some() {
            return Err(TokenError::Blacklisted);
        }
        self.maybe_purge(now);

        tracing::debug!(user_id, "Token rotated");
        Ok((user_id, issued))
    }

    /// Number of tokens currently held in the blacklist.
    pub fn blacklist_len(&self) -> usize {
        self.blacklist.len()
    }

    /// Drop blacklist entries whose refresh window has closed; such tokens
    /// fail with [`TokenError::Expired`] anyway.
    pub fn purge_blacklist(&self, now: i64) {
        self.blacklist.retain(|_, rfx| *rfx >= now);
    }

    fn maybe_purge(&self, now: i64) {
        let rotations = self.rotations.fetch_add(1, Ordering::Relaxed) + 1;
        if rotations % BLACKLIST_PURGE_INTERVAL == 0 {
            self.purge_blacklist(now);
        }
    }

    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::Invalid)?;
        let claims = data.claims;

        if claims.exp < claims.iat || claims.rfx < claims.exp {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }
}

fn subject(claims: &Claims) -> Result<i64, TokenError> {
    claims.sub.parse().map_err(|_| TokenError::Invalid)
}
