//! Complaint audit trail repository

use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};

use super::{now_timestamp, parse_db_timestamp};
use crate::models::AuditLog;

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: i64,
    complaint_id: i64,
    changed_by_id: i64,
    change_description: String,
    timestamp: String,
}

pub struct AuditRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AuditRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an entry on the caller's connection so it commits with the change it records
    pub async fn insert(
        conn: &mut SqliteConnection,
        complaint_id: i64,
        changed_by_id: i64,
        change_description: &str,
    ) -> Result<AuditLog> {
        let timestamp = now_timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (complaint_id, changed_by_id, change_description, timestamp)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(complaint_id)
        .bind(changed_by_id)
        .bind(change_description)
        .bind(&timestamp)
        .execute(conn)
        .await
        .context("Failed to insert audit log entry")?;

        Ok(AuditLog {
            id: result.last_insert_rowid(),
            complaint_id,
            changed_by_id,
            change_description: change_description.to_string(),
            timestamp: parse_db_timestamp(&timestamp),
        })
    }

    /// Entries for one complaint, newest first
    pub async fn list_for_complaint(&self, complaint_id: i64) -> Result<Vec<AuditLog>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, complaint_id, changed_by_id, change_description, timestamp
            FROM audit_logs
            WHERE complaint_id = ?
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(complaint_id)
        .fetch_all(self.pool)
        .await
        .context("Failed to list audit logs")?;

        Ok(rows.into_iter().map(row_to_audit).collect())
    }
}

fn row_to_audit(row: AuditRow) -> AuditLog {
    AuditLog {
        id: row.id,
        complaint_id: row.complaint_id,
        changed_by_id: row.changed_by_id,
        change_description: row.change_description,
        timestamp: parse_db_timestamp(&row.timestamp),
    }
}
