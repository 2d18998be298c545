//! Complaint repository
//!
//! Complaints are returned with their tags, loaded by a second query over the
//! junction table. Writes that touch several tables run in one transaction.
//! Search matches against lowercased copies of title and description, since
//! SQLite's `LIKE` only folds ASCII.

use std::collections::HashMap;

use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};

use super::{now_timestamp, parse_db_timestamp, parse_optional_timestamp, AuditRepository};
use crate::models::{
    Complaint, ComplaintFilter, CreateComplaintRequest, Tag, UpdateComplaintRequest,
};
use crate::utils::validation::{escape_like, fold_case};

#[derive(Debug, sqlx::FromRow)]
struct ComplaintRow {
    id: i64,
    title: String,
    description: String,
    status: String,
    priority: String,
    created_by_id: i64,
    assigned_to_id: Option<i64>,
    created_at: String,
    updated_at: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ComplaintTagRow {
    complaint_id: i64,
    id: i64,
    name: String,
    color: String,
    created_at: String,
}

/// Complaint ids bound per tag lookup, well under SQLite's variable limit
const TAG_LOOKUP_BATCH: usize = 500;

const COMPLAINT_COLUMNS: &str = "c.id, c.title, c.description, c.status, c.priority, \
     c.created_by_id, c.assigned_to_id, c.created_at, c.updated_at";

pub struct ComplaintRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ComplaintRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Filtered page of complaints, newest first
    pub async fn list(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>> {
        let mut sql = format!("SELECT {} FROM complaints c WHERE 1 = 1", COMPLAINT_COLUMNS);

        if filter.search.is_some() {
            sql.push_str(
                r" AND (c.title_folded LIKE ? ESCAPE '\' OR c.description_folded LIKE ? ESCAPE '\')",
            );
        }
        if filter.status.is_some() {
            sql.push_str(" AND c.status = ?");
        }
        if filter.priority.is_some() {
            sql.push_str(" AND c.priority = ?");
        }
        if filter.tag_id.is_some() {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM complaint_tags ct \
                 WHERE ct.complaint_id = c.id AND ct.tag_id = ?)",
            );
        }
        sql.push_str(" ORDER BY c.created_at DESC, c.id DESC LIMIT ? OFFSET ?");

        let mut q = sqlx::query_as::<_, ComplaintRow>(&sql);
        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", escape_like(&fold_case(search)));
            q = q.bind(pattern.clone()).bind(pattern);
        }
        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(tag_id) = filter.tag_id {
            q = q.bind(tag_id);
        }

        let rows = q
            .bind(i64::from(filter.limit))
            .bind(i64::from(filter.skip))
            .fetch_all(self.pool)
            .await
            .context("Failed to list complaints")?;

        self.attach_tags(rows).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Complaint>> {
        let row = sqlx::query_as::<_, ComplaintRow>(&format!(
            "SELECT {} FROM complaints c WHERE c.id = ?",
            COMPLAINT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to get complaint")?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.attach_tags(vec![row]).await?.into_iter().next())
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM complaints WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .context("Failed to check complaint")?;

        Ok(found.is_some())
    }

    /// Insert an open complaint and its tag associations
    pub async fn create(&self, req: &CreateComplaintRequest, created_by_id: i64) -> Result<Complaint> {
        let priority = req.priority.unwrap_or_default();
        let now = now_timestamp();

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let result = sqlx::query(
            r#"
            INSERT INTO complaints
                (title, title_folded, description, description_folded, status, priority, created_by_id, created_at)
            VALUES (?, ?, ?, ?, 'open', ?, ?, ?)
            "#,
        )
        .bind(&req.title)
        .bind(fold_case(&req.title))
        .bind(&req.description)
        .bind(fold_case(&req.description))
        .bind(priority.as_str())
        .bind(created_by_id)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .context("Failed to create complaint")?;

        let id = result.last_insert_rowid();

        if let Some(ref tag_ids) = req.tag_ids {
            link_tags(&mut tx, id, tag_ids).await?;
        }

        tx.commit().await.context("Failed to commit complaint")?;

        self.get_by_id(id)
            .await?
            .context("Created complaint could not be read back")
    }

    /// Apply a partial update, replace tags when supplied, and append one audit entry
    pub async fn update(
        &self,
        id: i64,
        req: &UpdateComplaintRequest,
        changed_by_id: i64,
    ) -> Result<Option<Complaint>> {
        // The UPDATE must be the first statement: it takes the write lock
        // before any read, so concurrent writers queue on busy_timeout.
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let (assign, assigned_to_id) = match req.assigned_to_id {
            Some(assignee) => (true, assignee),
            None => (false, None),
        };

        let result = sqlx::query(
            r#"
            UPDATE complaints
            SET title = COALESCE(?, title),
                title_folded = COALESCE(?, title_folded),
                description = COALESCE(?, description),
                description_folded = COALESCE(?, description_folded),
                status = COALESCE(?, status),
                priority = COALESCE(?, priority),
                assigned_to_id = CASE WHEN ? THEN ? ELSE assigned_to_id END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(req.title.as_deref())
        .bind(req.title.as_deref().map(fold_case))
        .bind(req.description.as_deref())
        .bind(req.description.as_deref().map(fold_case))
        .bind(req.status.map(|s| s.as_str()))
        .bind(req.priority.map(|p| p.as_str()))
        .bind(assign)
        .bind(assigned_to_id)
        .bind(now_timestamp())
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update complaint")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        if let Some(ref tag_ids) = req.tag_ids {
            sqlx::query("DELETE FROM complaint_tags WHERE complaint_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to clear complaint tags")?;
            link_tags(&mut tx, id, tag_ids).await?;
        }

        AuditRepository::insert(&mut tx, id, changed_by_id, &req.change_description()).await?;

        tx.commit().await.context("Failed to commit complaint update")?;

        self.get_by_id(id).await
    }

    async fn attach_tags(&self, rows: Vec<ComplaintRow>) -> Result<Vec<Complaint>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut tag_rows = Vec::new();
        for chunk in ids.chunks(TAG_LOOKUP_BATCH) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                r#"
                SELECT ct.complaint_id, t.id, t.name, t.color, t.created_at
                FROM complaint_tags ct
                JOIN tags t ON t.id = ct.tag_id
                WHERE ct.complaint_id IN ({})
                ORDER BY t.name
                "#,
                placeholders
            );

            let mut q = sqlx::query_as::<_, ComplaintTagRow>(&sql);
            for &id in chunk {
                q = q.bind(id);
            }
            tag_rows.extend(
                q.fetch_all(self.pool)
                    .await
                    .context("Failed to load complaint tags")?,
            );
        }

        let mut tags: HashMap<i64, Vec<Tag>> = HashMap::new();
        for tag in tag_rows {
            tags.entry(tag.complaint_id).or_default().push(Tag {
                id: tag.id,
                name: tag.name,
                color: tag.color,
                created_at: parse_db_timestamp(&tag.created_at),
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let complaint_tags = tags.remove(&row.id).unwrap_or_default();
                row_to_complaint(row, complaint_tags)
            })
            .collect())
    }
}

/// Associate existing tags with a complaint; unknown ids and repeats are skipped
async fn link_tags(conn: &mut SqliteConnection, complaint_id: i64, tag_ids: &[i64]) -> Result<()> {
    for &tag_id in tag_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO complaint_tags (complaint_id, tag_id) SELECT ?, id FROM tags WHERE id = ?",
        )
        .bind(complaint_id)
        .bind(tag_id)
        .execute(&mut *conn)
        .await
        .context("Failed to link tag")?;
    }
    Ok(())
}

fn row_to_complaint(row: ComplaintRow, tags: Vec<Tag>) -> Complaint {
    Complaint {
        id: row.id,
        title: row.title,
        description: row.description,
        status: row.status.parse().unwrap_or_default(),
        priority: row.priority.parse().unwrap_or_default(),
        created_by_id: row.created_by_id,
        assigned_to_id: row.assigned_to_id,
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_optional_timestamp(row.updated_at.as_deref()),
        tags,
    }
}
