//! Tag repository

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::{now_timestamp, parse_db_timestamp};
use crate::models::{CreateTagRequest, Tag, UpdateTagRequest};

#[derive(Debug, sqlx::FromRow)]
struct TagRow {
    id: i64,
    name: String,
    color: String,
    created_at: String,
}

pub struct TagRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TagRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, name, color, created_at
            FROM tags
            ORDER BY name
            "#,
        )
        .fetch_all(self.pool)
        .await
        .context("Failed to list tags")?;

        Ok(rows.into_iter().map(row_to_tag).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        let row = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, color, created_at FROM tags WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to get tag")?;

        Ok(row.map(row_to_tag))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let row = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, color, created_at FROM tags WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .context("Failed to get tag by name")?;

        Ok(row.map(row_to_tag))
    }

    pub async fn create(&self, req: &CreateTagRequest) -> Result<Tag> {
        let now = now_timestamp();

        let result = sqlx::query("INSERT INTO tags (name, color, created_at) VALUES (?, ?, ?)")
            .bind(&req.name)
            .bind(&req.color)
            .bind(&now)
            .execute(self.pool)
            .await
            .context("Failed to create tag")?;

        Ok(Tag {
            id: result.last_insert_rowid(),
            name: req.name.clone(),
            color: req.color.clone(),
            created_at: parse_db_timestamp(&now),
        })
    }

    pub async fn update(&self, id: i64, req: &UpdateTagRequest) -> Result<Option<Tag>> {
        let Some(existing) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let name = req.name.clone().unwrap_or(existing.name);
        let color = req.color.clone().unwrap_or(existing.color);

        sqlx::query("UPDATE tags SET name = ?, color = ? WHERE id = ?")
            .bind(&name)
            .bind(&color)
            .bind(id)
            .execute(self.pool)
            .await
            .context("Failed to update tag")?;

        Ok(Some(Tag {
            id,
            name,
            color,
            created_at: existing.created_at,
        }))
    }

    /// Remove the tag and every complaint association in one transaction
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM complaint_tags WHERE tag_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to detach tag from complaints")?;

        let result = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete tag")?;

        if result.rows_affected() == 0 {
            // Nothing to delete; dropping the transaction rolls it back
            return Ok(false);
        }

        tx.commit().await.context("Failed to commit tag deletion")?;
        Ok(true)
    }
}

fn row_to_tag(row: TagRow) -> Tag {
    Tag {
        id: row.id,
        name: row.name,
        color: row.color,
        created_at: parse_db_timestamp(&row.created_at),
    }
}
