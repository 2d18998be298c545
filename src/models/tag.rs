//! Tag models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::validation;

/// Colour given to tags created without one
pub const DEFAULT_TAG_COLOR: &str = "#3B82F6";

fn default_color() -> String {
    DEFAULT_TAG_COLOR.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTagRequest {
    #[validate(
        length(min = 1, max = 50, message = "name must be 1-50 characters"),
        custom(function = "validation::not_blank")
    )]
    pub name: String,
    #[serde(default = "default_color")]
    #[validate(custom(function = "validation::hex_color"))]
    pub color: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTagRequest {
    #[validate(
        length(min = 1, max = 50, message = "name must be 1-50 characters"),
        custom(function = "validation::not_blank")
    )]
    pub name: Option<String>,
    #[validate(custom(function = "validation::hex_color"))]
    pub color: Option<String>,
}
