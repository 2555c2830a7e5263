// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (credential store).
//!
//! [`UserStore`] is the only shared mutable resource in the service. Every
//! method is a single atomic write or read against the backing store, and
//! email uniqueness is enforced by the store itself rather than by callers.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryUserStore;
pub use sqlite::SqliteUserStore;

use crate::models::{NewUser, Role, User, UserChanges};
use async_trait::async_trait;

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
}

/// Errors produced by a [`UserStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The unique email index rejected the write.
    #[error("Email already taken")]
    DuplicateEmail,

    #[error("Database error: {0}")]
    Database(String),
}

/// Outcome of a conditional role change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleUpdate {
    /// Role changed; carries the row as written.
    Updated(User),
    /// The user already held the requested role; nothing was written.
    Unchanged(User),
    /// No user with that id.
    Missing,
}

/// Columns the user listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSortColumn {
    #[default]
    Id,
    Name,
    Email,
    CreatedAt,
    UpdatedAt,
}

impl UserSortColumn {
    /// Parse the query-string spelling (`created_at`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "id" => Some(UserSortColumn::Id),
            "name" => Some(UserSortColumn::Name),
            "email" => Some(UserSortColumn::Email),
            "created_at" => Some(UserSortColumn::CreatedAt),
            "updated_at" => Some(UserSortColumn::UpdatedAt),
            _ => None,
        }
    }

    pub fn as_column(&self) -> &'static str {
        match self {
            UserSortColumn::Id => "id",
            UserSortColumn::Name => "name",
            UserSortColumn::Email => "email",
            UserSortColumn::CreatedAt => "created_at",
            UserSortColumn::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

pub const DEFAULT_PER_PAGE: u32 = 15;
pub const MAX_PER_PAGE: u32 = 100;

/// Filters for the admin user listing.
#[derive(Debug, Clone)]
pub struct UserQuery {
    /// Substring matched against name or email. Case folding is ASCII only.
    pub search: Option<String>,
    pub order_by: UserSortColumn,
    pub order_direction: SortDirection,
    /// 1-indexed
    pub page: u32,
    pub per_page: u32,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            search: None,
            order_by: UserSortColumn::default(),
            order_direction: SortDirection::default(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl UserQuery {
    /// Row offset for the requested page, saturating instead of overflowing.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) as u64 - 1).saturating_mul(self.limit() as u64)
    }

    pub fn limit(&self) -> u32 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn last_page(&self) -> u32 {
        if self.total == 0 || self.per_page == 0 {
            return 1;
        }
        self.total.div_ceil(self.per_page as u64).min(u32::MAX as u64) as u32
    }
}

/// Durable user storage.
///
/// Implementations must enforce email uniqueness at the store level and
/// apply each call atomically.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with [`StoreError::DuplicateEmail`] if the email
    /// is already present.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Apply the supplied changes and bump `updated_at`.
    /// Returns `None` if the user no longer exists.
    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, StoreError>;

    /// Set the role only if it differs from the current one.
    async fn set_role(&self, id: i64, role: Role) -> Result<RoleUpdate, StoreError>;

    /// Hard delete. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    async fn list(&self, query: &UserQuery) -> Result<Page<User>, StoreError>;
}
