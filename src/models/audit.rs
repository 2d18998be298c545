//! Audit log models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded change to a complaint. Rows are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: i64,
    pub complaint_id: i64,
    pub changed_by_id: i64,
    pub change_description: String,
    pub timestamp: DateTime<Utc>,
}
