// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite-backed credential store.
//!
//! Each mutation is one statement (`INSERT`/`UPDATE ... RETURNING`/`DELETE`),
//! so partially-applied writes are never visible. Email uniqueness comes from
//! the `users_email_unique` index created by the migration.

use super::{tables, Page, RoleUpdate, StoreError, UserQuery, UserStore};
use crate::models::{NewUser, Role, User, UserChanges};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use std::str::FromStr;
use std::time::Duration;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";
const MAX_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::DuplicateEmail;
            }
        }
        StoreError::Database(err.to_string())
    }
}

/// Raw `users` row; `role` is validated when converting to [`User`].
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role).ok_or_else(|| {
            StoreError::Database(format!("Invalid role '{}' for user {}", row.role, row.id))
        })?;

        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_search_filter(builder: &mut QueryBuilder<'_, Sqlite>, pattern: Option<&str>) {
    if let Some(pattern) = pattern {
        builder
            .push(" WHERE name LIKE ")
            .push_bind(pattern.to_string())
            .push(" ESCAPE '\\' OR email LIKE ")
            .push_bind(pattern.to_string())
            .push(" ESCAPE '\\'");
    }
}

/// SQLite user store.
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Connect to `database_url` (e.g. `sqlite://accounts.db`), creating the
    /// file if needed, and run pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        tracing::info!(url = database_url, "Connected to SQLite");
        Self::from_pool(pool).await
    }

    /// Private in-memory database, for tests and local experiments.
    ///
    /// Uses a single connection that is never recycled, since each SQLite
    /// memory connection is its own database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool and bring its schema up to date.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {}", e)))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO {} (name, email, password_hash, role, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
            tables::USERS,
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(new_user.role.as_str())
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        User::try_from(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?", USER_COLUMNS, tables::USERS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE email = ?",
            USER_COLUMNS,
            tables::USERS
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, StoreError> {
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE ");
        builder
            .push(tables::USERS)
            .push(" SET updated_at = ")
            .push_bind(Utc::now());
        if let Some(name) = changes.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Some(email) = changes.email {
            builder.push(", email = ").push_bind(email);
        }
        if let Some(password_hash) = changes.password_hash {
            builder.push(", password_hash = ").push_bind(password_hash);
        }
        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(USER_COLUMNS);

        builder
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn set_role(&self, id: i64, role: Role) -> Result<RoleUpdate, StoreError> {
        let sql = format!(
            "UPDATE {} SET role = ?, updated_at = ? WHERE id = ? AND role <> ? RETURNING {}",
            tables::USERS,
            USER_COLUMNS
        );

        let updated = sqlx::query_as::<_, UserRow>(&sql)
            .bind(role.as_str())
            .bind(Utc::now())
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(row) => Ok(RoleUpdate::Updated(User::try_from(row)?)),
            None => Ok(match self.find_by_id(id).await? {
                Some(user) => RoleUpdate::Unchanged(user),
                None => RoleUpdate::Missing,
            }),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", tables::USERS);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, query: &UserQuery) -> Result<Page<User>, StoreError> {
        let pattern = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        // Count and page from the same snapshot.
        let mut tx = self.pool.begin().await?;

        let mut count_builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM ");
        count_builder.push(tables::USERS);
        push_search_filter(&mut count_builder, pattern.as_deref());
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await?;

        let limit = query.limit();
        let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        builder.push(USER_COLUMNS).push(" FROM ").push(tables::USERS);
        push_search_filter(&mut builder, pattern.as_deref());
        builder
            .push(" ORDER BY ")
            .push(query.order_by.as_column())
            .push(" ")
            .push(query.order_direction.as_sql())
            .push(", id ASC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = builder
            .build_query_as::<UserRow>()
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        let items = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            page: query.page,
            per_page: limit,
            total: total.max(0) as u64,
        })
    }
}
