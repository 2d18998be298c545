//! Comment repository

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::{now_timestamp, parse_db_timestamp, parse_optional_timestamp};
use crate::models::{Comment, UserPublic};

/// Comment joined with its author's public columns
#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    complaint_id: i64,
    user_id: i64,
    content: String,
    created_at: String,
    author_username: Option<String>,
    author_role: Option<String>,
    author_is_active: Option<bool>,
    author_created_at: Option<String>,
    author_updated_at: Option<String>,
    author_last_login: Option<String>,
}

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.complaint_id, c.user_id, c.content, c.created_at,
           u.username AS author_username,
           u.role AS author_role,
           u.is_active AS author_is_active,
           u.created_at AS author_created_at,
           u.updated_at AS author_updated_at,
           u.last_login AS author_last_login
    FROM comments c
    LEFT JOIN users u ON u.id = c.user_id
"#;

pub struct CommentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CommentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Comments on one complaint, newest first, each with its author
    pub async fn list_for_complaint(&self, complaint_id: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{} WHERE c.complaint_id = ? ORDER BY c.created_at DESC, c.id DESC",
            COMMENT_SELECT
        ))
        .bind(complaint_id)
        .fetch_all(self.pool)
        .await
        .context("Failed to list comments")?;

        Ok(rows.into_iter().map(row_to_comment).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(&format!("{} WHERE c.id = ?", COMMENT_SELECT))
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .context("Failed to get comment")?;

        Ok(row.map(row_to_comment))
    }

    pub async fn create(&self, complaint_id: i64, user_id: i64, content: &str) -> Result<Comment> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (complaint_id, user_id, content, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(complaint_id)
        .bind(user_id)
        .bind(content)
        .bind(now_timestamp())
        .execute(self.pool)
        .await
        .context("Failed to create comment")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .context("Created comment could not be read back")
    }
}

fn row_to_comment(row: CommentRow) -> Comment {
    let user = match (row.author_username, row.author_created_at) {
        (Some(username), Some(created_at)) => Some(UserPublic {
            id: row.user_id,
            username,
            role: row
                .author_role
                .as_deref()
                .and_then(|r| r.parse().ok())
                .unwrap_or_default(),
            is_active: row.author_is_active.unwrap_or(false),
            created_at: parse_db_timestamp(&created_at),
            updated_at: parse_optional_timestamp(row.author_updated_at.as_deref()),
            last_login: parse_optional_timestamp(row.author_last_login.as_deref()),
        }),
        _ => None,
    };

    Comment {
        id: row.id,
        complaint_id: row.complaint_id,
        user_id: row.user_id,
        content: row.content,
        created_at: parse_db_timestamp(&row.created_at),
        user,
    }
}
