//! User account repository

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::{now_timestamp, parse_db_timestamp, parse_optional_timestamp};
use crate::models::{UpdateUserRequest, User, UserListQuery, UserRole};
use crate::utils::validation::{escape_like, fold_case};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    role: String,
    is_active: bool,
    created_at: String,
    updated_at: Option<String>,
    last_login: Option<String>,
}

const USER_COLUMNS: &str =
    "id, username, password_hash, role, is_active, created_at, updated_at, last_login";

pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Newest accounts first, optionally narrowed by a username substring
    pub async fn list(&self, query: &UserListQuery) -> Result<Vec<User>> {
        let mut sql = format!("SELECT {} FROM users", USER_COLUMNS);
        let search = query.search.as_deref().filter(|s| !s.is_empty());
        if search.is_some() {
            sql.push_str(r" WHERE username_folded LIKE ? ESCAPE '\'");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");

        let mut q = sqlx::query_as::<_, UserRow>(&sql);
        if let Some(search) = search {
            q = q.bind(format!("%{}%", escape_like(&fold_case(search))));
        }
        let rows = q
            .bind(i64::from(query.limit))
            .bind(i64::from(query.skip))
            .fetch_all(self.pool)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(row_to_user).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to get user")?;

        Ok(row.map(row_to_user))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await
        .context("Failed to get user by username")?;

        Ok(row.map(row_to_user))
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .context("Failed to check user")?;

        Ok(found.is_some())
    }

    /// Insert an active account with an already hashed password
    pub async fn create(&self, username: &str, password_hash: &str, role: UserRole) -> Result<User> {
        let now = now_timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, username_folded, password_hash, role, is_active, created_at)
            VALUES (?, ?, ?, ?, 1, ?)
            "#,
        )
        .bind(username)
        .bind(fold_case(username))
        .bind(password_hash)
        .bind(role.as_str())
        .bind(&now)
        .execute(self.pool)
        .await
        .context("Failed to create user")?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .context("Created user could not be read back")
    }

    pub async fn update(&self, id: i64, req: &UpdateUserRequest) -> Result<Option<User>> {
        let Some(existing) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let username = req.username.clone().unwrap_or(existing.username);
        let role = req.role.unwrap_or(existing.role);
        let is_active = req.is_active.unwrap_or(existing.is_active);
        let now = now_timestamp();

        sqlx::query(
            r#"
            UPDATE users
            SET username = ?, username_folded = ?, role = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&username)
        .bind(fold_case(&username))
        .bind(role.as_str())
        .bind(is_active)
        .bind(&now)
        .bind(id)
        .execute(self.pool)
        .await
        .context("Failed to update user")?;

        self.get_by_id(id).await
    }

    pub async fn update_password(&self, id: i64, password_hash: &str) -> Result<Option<User>> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(now_timestamp())
            .bind(id)
            .execute(self.pool)
            .await
            .context("Failed to update password")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Flip `is_active` in place
    pub async fn toggle_active(&self, id: i64) -> Result<Option<User>> {
        let result = sqlx::query(
            "UPDATE users SET is_active = NOT is_active, updated_at = ? WHERE id = ?",
        )
        .bind(now_timestamp())
        .bind(id)
        .execute(self.pool)
        .await
        .context("Failed to toggle user status")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    pub async fn record_login(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(now_timestamp())
            .bind(id)
            .execute(self.pool)
            .await
            .context("Failed to record login")?;

        Ok(())
    }
}

fn row_to_user(row: UserRow) -> User {
    User {
        id: row.id,
        username: row.username,
        password_hash: row.password_hash,
        role: row.role.parse().unwrap_or_default(),
        is_active: row.is_active,
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_optional_timestamp(row.updated_at.as_deref()),
        last_login: parse_optional_timestamp(row.last_login.as_deref()),
    }
}
