//! Complaint models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::{user::default_limit, Tag};
use crate::utils::validation;

/// Lifecycle state of a complaint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Open => "open",
            ComplaintStatus::InProgress => "in_progress",
            ComplaintStatus::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(ComplaintStatus::Open),
            "in_progress" => Ok(ComplaintStatus::InProgress),
            "resolved" => Ok(ComplaintStatus::Resolved),
            _ => Err(format!("Invalid complaint status: {}", s)),
        }
    }
}

/// Urgency of a complaint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl ComplaintPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintPriority::Low => "low",
            ComplaintPriority::Medium => "medium",
            ComplaintPriority::High => "high",
            ComplaintPriority::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ComplaintPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComplaintPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(ComplaintPriority::Low),
            "medium" => Ok(ComplaintPriority::Medium),
            "high" => Ok(ComplaintPriority::High),
            "critical" => Ok(ComplaintPriority::Critical),
            _ => Err(format!("Invalid complaint priority: {}", s)),
        }
    }
}

/// Complaint with its tags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: ComplaintStatus,
    pub priority: ComplaintPriority,
    pub created_by_id: i64,
    pub assigned_to_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateComplaintRequest {
    #[validate(
        length(min = 1, max = 200, message = "title must be 1-200 characters"),
        custom(function = "validation::not_blank")
    )]
    pub title: String,
    #[validate(
        length(min = 1, max = 10000, message = "description must be 1-10000 characters"),
        custom(function = "validation::not_blank")
    )]
    pub description: String,
    #[serde(default)]
    pub priority: Option<ComplaintPriority>,
    #[serde(default)]
    pub tag_ids: Option<Vec<i64>>,
}

/// Partial complaint update
///
/// `assigned_to_id` distinguishes an absent key (leave unchanged) from an
/// explicit `null` (clear the assignee).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateComplaintRequest {
    #[validate(
        length(min = 1, max = 200, message = "title must be 1-200 characters"),
        custom(function = "validation::not_blank")
    )]
    pub title: Option<String>,
    #[validate(
        length(min = 1, max = 10000, message = "description must be 1-10000 characters"),
        custom(function = "validation::not_blank")
    )]
    pub description: Option<String>,
    pub status: Option<ComplaintStatus>,
    pub priority: Option<ComplaintPriority>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub assigned_to_id: Option<Option<i64>>,
    pub tag_ids: Option<Vec<i64>>,
}

impl UpdateComplaintRequest {
    /// Names of the supplied fields, in declaration order, as recorded in the audit log
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.priority.is_some() {
            fields.push("priority");
        }
        if self.assigned_to_id.is_some() {
            fields.push("assigned_to_id");
        }
        if self.tag_ids.is_some() {
            fields.push("tags");
        }
        fields
    }

    /// Audit log text for this update
    pub fn change_description(&self) -> String {
        format!("Updated: {}", self.changed_fields().join(", "))
    }
}

/// Maps a present key (including `null`) to `Some(..)`; absent keys keep the `None` default.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

/// Query string for the complaint listing
///
/// Enum filters arrive as strings and are parsed by the handler, so a bad
/// value produces a structured validation error.
#[derive(Debug, Clone, Deserialize)]
pub struct ComplaintListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tag_id: Option<i64>,
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for ComplaintListQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            priority: None,
            tag_id: None,
            skip: 0,
            limit: default_limit(),
        }
    }
}

/// Parsed filters handed to the repository
#[derive(Debug, Clone, Default)]
pub struct ComplaintFilter {
    pub search: Option<String>,
    pub status: Option<ComplaintStatus>,
    pub priority: Option<ComplaintPriority>,
    pub tag_id: Option<i64>,
    pub skip: u32,
    pub limit: u32,
}

impl TryFrom<ComplaintListQuery> for ComplaintFilter {
    type Error = String;

    fn try_from(query: ComplaintListQuery) -> Result<Self, Self::Error> {
        let status = match query.status.as_deref() {
            Some(s) if !s.is_empty() => Some(s.parse()?),
            _ => None,
        };
        let priority = match query.priority.as_deref() {
            Some(p) if !p.is_empty() => Some(p.parse()?),
            _ => None,
        };
        Ok(Self {
            search: query.search.filter(|s| !s.is_empty()),
            status,
            priority,
            tag_id: query.tag_id,
            skip: query.skip,
            limit: query.limit,
        })
    }
}
