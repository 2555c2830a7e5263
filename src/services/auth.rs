// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account lifecycle: register, login, refresh, profile changes, deletion.
//!
//! Stateless across requests. The only shared state touched here is the
//! user store (atomic per call) and the token blacklist (via refresh).

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{NewUser, Role, User, UserChanges};
use crate::services::password::PasswordHasher;
use crate::services::tokens::{IssuedToken, TokenIssuer};
use std::sync::Arc;

/// A user together with a freshly minted token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token: IssuedToken,
}

/// Registration input, already structurally validated.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Profile changes. Only supplied fields are applied.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

/// Emails are compared case-insensitively by storing them lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<TokenIssuer>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Create an account and mint its first token.
    pub async fn register(&self, registration: Registration) -> Result<AuthenticatedUser> {
        let password = registration.password;
        let password_hash = self
            .with_hasher(move |hasher| hasher.hash(&password))
            .await??;

        let user = self
            .store
            .create(NewUser {
                name: registration.name,
                email: normalize_email(&registration.email),
                password_hash,
                role: Role::User,
            })
            .await?;

        let token = self.tokens.issue(user.id)?;
        tracing::info!(user_id = user.id, "User registered");

        Ok(AuthenticatedUser { user, token })
    }

    /// Check credentials and mint a token.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser> {
        let candidate = self.store.find_by_email(&normalize_email(email)).await?;
        let password = password.to_string();

        let user = match candidate {
            Some(user) => {
                let hash = user.password_hash.clone();
                let matched = self
                    .with_hasher(move |hasher| hasher.verify(&password, &hash))
                    .await?;
                matched.then_some(user)
            }
            None => {
                self.with_hasher(move |hasher| hasher.verify_dummy(&password))
                    .await?;
                None
            }
        };

        let Some(user) = user else {
            tracing::info!("Login rejected");
            return Err(AppError::InvalidCredentials);
        };

        let token = self.tokens.issue(user.id)?;
        tracing::info!(user_id = user.id, "User logged in");

        Ok(AuthenticatedUser { user, token })
    }

    /// Exchange a (possibly expired) token for a new one and re-resolve its
    /// user.
    pub async fn refresh(&self, token: &str) -> Result<AuthenticatedUser> {
        let (user_id, token) = self.tokens.refresh(token)?;

        let user = self.store.find_by_id(user_id).await?.ok_or_else(|| {
            tracing::warn!(user_id, "Refreshed token for a user that no longer exists");
            AppError::UserNotFound
        })?;

        Ok(AuthenticatedUser { user, token })
    }

    pub fn me(&self, user: &User) -> User {
        user.clone()
    }

    /// Apply a partial profile update in one store write.
    pub async fn update_profile(&self, user: &User, update: ProfileUpdate) -> Result<User> {
        let mut changes = UserChanges {
            name: update.name,
            email: update.email.as_deref().map(normalize_email),
            password_hash: None,
        };

        if let Some(new_password) = update.new_password {
            let old_password = update.old_password.ok_or(AppError::OldPasswordIncorrect)?;
            let current_hash = user.password_hash.clone();

            let new_hash = self
                .with_hasher(move |hasher| {
                    if !hasher.verify(&old_password, &current_hash) {
                        return Err(AppError::OldPasswordIncorrect);
                    }
                    if hasher.verify(&new_password, &current_hash) {
                        return Err(AppError::PasswordUnchanged);
                    }
                    Ok(hasher.hash(&new_password)?)
                })
                .await??;

            changes.password_hash = Some(new_hash);
        }

        if changes.is_empty() {
            return Ok(user.clone());
        }

        let password_changed = changes.password_hash.is_some();
        let updated = self
            .store
            .update(user.id, changes)
            .await?
            .ok_or(AppError::UserNotFound)?;

        tracing::info!(user_id = user.id, password_changed, "Profile updated");
        Ok(updated)
    }

    /// Hard-delete the account after re-confirming the password.
    pub async fn delete_account(&self, user: &User, password: &str) -> Result<()> {
        let password = password.to_string();
        let hash = user.password_hash.clone();
        let confirmed = self
            .with_hasher(move |hasher| hasher.verify(&password, &hash))
            .await?;
        if !confirmed {
            return Err(AppError::IncorrectPassword);
        }

        if !self.store.delete(user.id).await? {
            return Err(AppError::UserNotFound);
        }

        tracing::info!(user_id = user.id, "Account deleted");
        Ok(())
    }

    /// Run Argon2 work on the blocking pool.
    async fn with_hasher<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&PasswordHasher) -> T + Send + 'static,
        T: Send + 'static,
    {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || f(&hasher))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryUserStore;
    use crate::services::password::HashCost;

    struct Fixture {
        auth: AuthService,
        store: Arc<MemoryUserStore>,
        tokens: Arc<TokenIssuer>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryUserStore::new());
        let hasher = Arc::new(
            PasswordHasher::new(HashCost {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            })
            .unwrap(),
        );
        let tokens =
            Arc::new(TokenIssuer::new(b"test_signing_key_32_bytes_long!!", 3600, 86400).unwrap());
        let auth = AuthService::new(store.clone(), hasher, tokens.clone());
        Fixture {
            auth,
            store,
            tokens,
        }
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Grace Hopper".to_string(),
            email: email.to_string(),
            password: "Secret123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_issues_token() {
        let f = fixture();
        let result = f.auth.register(registration("grace@example.com")).await.unwrap();

        assert_eq!(result.user.name, "Grace Hopper");
        assert_eq!(result.user.email, "grace@example.com");
        assert_eq!(result.user.role, Role::User);
        assert_ne!(result.user.password_hash, "Secret123");
        assert!(!result.user.password_hash.is_empty());
        assert_eq!(f.tokens.verify(&result.token.token), Ok(result.user.id));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_case_insensitive() {
        let f = fixture();
        f.auth.register(registration("grace@example.com")).await.unwrap();

        let err = f
            .auth
            .register(registration("  Grace@Example.COM "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_login_success_and_identical_failures() {
        let f = fixture();
        let registered = f.auth.register(registration("grace@example.com")).await.unwrap();

        let logged_in = f
            .auth
            .login("GRACE@example.com", "Secret123")
            .await
            .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
        assert_eq!(f.tokens.verify(&logged_in.token.token), Ok(registered.user.id));

        let wrong_password = f
            .auth
            .login("grace@example.com", "Wrong1234")
            .await
            .unwrap_err();
        let unknown_email = f
            .auth
            .login("nobody@example.com", "Secret123")
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_email, AppError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_resolves_user() {
        let f = fixture();
        let registered = f.auth.register(registration("grace@example.com")).await.unwrap();

        let refreshed = f.auth.refresh(&registered.token.token).await.unwrap();
        assert_eq!(refreshed.user.id, registered.user.id);
        assert_ne!(refreshed.token.token, registered.token.token);

        let err = f.auth.refresh(&registered.token.token).await.unwrap_err();
        assert!(matches!(err, AppError::TokenBlacklisted));
    }

    #[tokio::test]
    async fn test_refresh_after_account_deleted() {
        let f = fixture();
        let registered = f.auth.register(registration("grace@example.com")).await.unwrap();
        f.auth
            .delete_account(&registered.user, "Secret123")
            .await
            .unwrap();

        let err = f.auth.refresh(&registered.token.token).await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }

    #[tokio::test]
    async fn test_update_name_only() {
        let f = fixture();
        let user = f.auth.register(registration("grace@example.com")).await.unwrap().user;

        let updated = f
            .auth
            .update_profile(
                &user,
                ProfileUpdate {
                    name: Some("Rear Admiral Hopper".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Rear Admiral Hopper");
        assert_eq!(updated.email, user.email);
        assert_eq!(updated.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn test_update_with_nothing_supplied_is_untouched() {
        let f = fixture();
        let user = f.auth.register(registration("grace@example.com")).await.unwrap().user;

        let same = f
            .auth
            .update_profile(&user, ProfileUpdate::default())
            .await
            .unwrap();
        assert_eq!(same, user);
        assert_eq!(f.store.find_by_id(user.id).await.unwrap().unwrap(), user);
    }

    #[tokio::test]
    async fn test_update_password_rules() {
        let f = fixture();
        let user = f.auth.register(registration("grace@example.com")).await.unwrap().user;

        let unchanged = f
            .auth
            .update_profile(
                &user,
                ProfileUpdate {
                    old_password: Some("Secret123".to_string()),
                    new_password: Some("Secret123".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(unchanged, AppError::PasswordUnchanged));

        let wrong_old = f
            .auth
            .update_profile(
                &user,
                ProfileUpdate {
                    old_password: Some("Nope1234".to_string()),
                    new_password: Some("Fresh456".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(wrong_old, AppError::OldPasswordIncorrect));

        let missing_old = f
            .auth
            .update_profile(
                &user,
                ProfileUpdate {
                    new_password: Some("Fresh456".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(missing_old, AppError::OldPasswordIncorrect));

        // None of the failures wrote anything.
        assert_eq!(f.store.find_by_id(user.id).await.unwrap().unwrap(), user);

        f.auth
            .update_profile(
                &user,
                ProfileUpdate {
                    old_password: Some("Secret123".to_string()),
                    new_password: Some("Fresh456".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(f.auth.login("grace@example.com", "Fresh456").await.is_ok());
        assert!(matches!(
            f.auth.login("grace@example.com", "Secret123").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_update_email_to_taken_address() {
        let f = fixture();
        f.auth.register(registration("first@example.com")).await.unwrap();
        let second = f.auth.register(registration("second@example.com")).await.unwrap().user;

        let err = f
            .auth
            .update_profile(
                &second,
                ProfileUpdate {
                    name: Some("Changed".to_string()),
                    email: Some("FIRST@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));

        // The name change in the same call was not applied either.
        let stored = f.store.find_by_id(second.id).await.unwrap().unwrap();
        assert_eq!(stored.name, second.name);
    }

    #[tokio::test]
    async fn test_delete_account() {
        let f = fixture();
        let registered = f.auth.register(registration("grace@example.com")).await.unwrap();

        let err = f
            .auth
            .delete_account(&registered.user, "Wrong1234")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IncorrectPassword));
        assert!(f.store.find_by_id(registered.user.id).await.unwrap().is_some());

        f.auth
            .delete_account(&registered.user, "Secret123")
            .await
            .unwrap();
        assert!(f.store.find_by_id(registered.user.id).await.unwrap().is_none());
        assert!(matches!(
            f.auth.login("grace@example.com", "Secret123").await,
            Err(AppError::InvalidCredentials)
        ));

        // The token still verifies; resolving its subject is what fails.
        assert_eq!(
            f.tokens.verify(&registered.token.token),
            Ok(registered.user.id)
        );
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" Foo@Example.COM\n"), "foo@example.com");
    }
}
