//! Comment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::UserPublic;
use crate::utils::validation;

/// Comment annotated with its author
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub complaint_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user: Option<UserPublic>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(
        length(min = 1, max = 5000, message = "content must be 1-5000 characters"),
        custom(function = "validation::not_blank")
    )]
    pub content: String,
}
