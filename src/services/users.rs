// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin-facing user directory.

use crate::db::{Page, UserQuery, UserStore};
use crate::error::Result;
use crate::models::User;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, query: &UserQuery) -> Result<Page<User>> {
        let page = self.store.list(query).await?;
        tracing::debug!(
            total = page.total,
            page = page.page,
            returned = page.items.len(),
            "Listed users"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryUserStore, SortDirection, UserSortColumn};
    use crate::models::{NewUser, Role};

    #[tokio::test]
    async fn test_list_search_and_pages() {
        let store = Arc::new(MemoryUserStore::new());
        for (name, email) in [
            ("Alice", "alice@example.com"),
            ("Bob", "bob@example.com"),
            ("Carol", "carol@corp.test"),
        ] {
            store
                .create(NewUser {
                    name: name.to_string(),
                    email: email.to_string(),
                    password_hash: "hash".to_string(),
                    role: Role::User,
                })
                .await
                .unwrap();
        }
        let users = UserService::new(store);

        let page = users
            .list(&UserQuery {
                search: Some("EXAMPLE".to_string()),
                order_by: UserSortColumn::Name,
                order_direction: SortDirection::Desc,
                page: 1,
                per_page: 1,
            })
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.last_page(), 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Bob");
    }
}
