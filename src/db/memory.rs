// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory credential store.
//!
//! Same contract as the SQLite store: one mutex guards the rows and the email
//! index together, so uniqueness checks and writes cannot interleave.

use super::{Page, RoleUpdate, SortDirection, StoreError, UserQuery, UserSortColumn, UserStore};
use crate::models::{NewUser, Role, User, UserChanges};
use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    /// email -> id
    emails: HashMap<String, i64>,
    last_id: i64,
}

/// Credential store kept entirely in process memory.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Database("User store lock poisoned".to_string()))
    }
}

fn compare(a: &User, b: &User, column: UserSortColumn) -> Ordering {
    match column {
        UserSortColumn::Id => a.id.cmp(&b.id),
        UserSortColumn::Name => a.name.cmp(&b.name),
        UserSortColumn::Email => a.email.cmp(&b.email),
        UserSortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
        UserSortColumn::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.lock()?;
        if inner.emails.contains_key(&new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        inner.last_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.last_id,
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };

        inner.emails.insert(user.email.clone(), user.id);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .emails
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut inner = self.lock()?;
        let Some(current) = inner.users.get(&id).cloned() else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(current));
        }

        if let Some(email) = &changes.email {
            if inner.emails.get(email).is_some_and(|owner| *owner != id) {
                return Err(StoreError::DuplicateEmail);
            }
        }

        let mut updated = current;
        if let Some(name) = changes.name {
            updated.name = name;
        }
        if let Some(email) = changes.email {
            inner.emails.remove(&updated.email);
            inner.emails.insert(email.clone(), id);
            updated.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            updated.password_hash = password_hash;
        }
        updated.updated_at = Utc::now();

        inner.users.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn set_role(&self, id: i64, role: Role) -> Result<RoleUpdate, StoreError> {
        let mut inner = self.lock()?;
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(RoleUpdate::Missing);
        };
        if user.role == role {
            return Ok(RoleUpdate::Unchanged(user.clone()));
        }

        user.role = role;
        user.updated_at = Utc::now();
        Ok(RoleUpdate::Updated(user.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        match inner.users.remove(&id) {
            Some(user) => {
                inner.emails.remove(&user.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self, query: &UserQuery) -> Result<Page<User>, StoreError> {
        let inner = self.lock()?;
        let needle = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_ascii_lowercase());

        let mut matches: Vec<&User> = inner
            .users
            .values()
            .filter(|user| match &needle {
                Some(needle) => {
                    user.name.to_ascii_lowercase().contains(needle.as_str())
                        || user.email.to_ascii_lowercase().contains(needle.as_str())
                }
                None => true,
            })
            .collect();

        matches.sort_by(|a, b| {
            let primary = compare(a, b, query.order_by);
            let primary = match query.order_direction {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            primary.then(a.id.cmp(&b.id))
        });

        let limit = query.limit();
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let items = matches
            .iter()
            .skip(offset)
            .take(limit as usize)
            .map(|user| (*user).clone())
            .collect();

        Ok(Page {
            items,
            page: query.page,
            per_page: limit,
            total: matches.len() as u64,
        })
    }
}
