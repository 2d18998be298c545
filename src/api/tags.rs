//! Tag endpoints, open to every authenticated user

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use validator::Validate;

use super::log_failure;
use crate::{
    db::TagRepository,
    middleware::AuthUser,
    models::{CreateTagRequest, Tag, UpdateTagRequest},
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags).post(create_tag))
        .route(
            "/tags/{id}",
            get(get_tag).put(update_tag).delete(delete_tag),
        )
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /tags
async fn list_tags(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<Tag>>, AppError> {
    let tags = TagRepository::new(&state.db)
        .list()
        .await
        .map_err(log_failure("Failed to list tags"))?;

    Ok(Json(tags))
}

/// GET /tags/{id}
async fn get_tag(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<Tag>, AppError> {
    TagRepository::new(&state.db)
        .get_by_id(id)
        .await
        .map_err(log_failure("Failed to get tag"))?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Tag not found"))
}

/// POST /tags
async fn create_tag(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    WithRejection(Json(payload), _): WithRejection<Json<CreateTagRequest>, AppError>,
) -> Result<Json<Tag>, AppError> {
    payload.validate()?;

    let repo = TagRepository::new(&state.db);
    let duplicate = repo
        .get_by_name(&payload.name)
        .await
        .map_err(log_failure("Failed to check tag name"))?;
    if duplicate.is_some() {
        return Err(AppError::conflict("Tag already exists"));
    }

    let tag = repo
        .create(&payload)
        .await
        .map_err(log_failure("Failed to create tag"))?;

    Ok(Json(tag))
}

/// PUT /tags/{id}
async fn update_tag(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateTagRequest>, AppError>,
) -> Result<Json<Tag>, AppError> {
    payload.validate()?;

    let repo = TagRepository::new(&state.db);
    if let Some(ref name) = payload.name {
        let holder = repo
            .get_by_name(name)
            .await
            .map_err(log_failure("Failed to check tag name"))?;
        if holder.is_some_and(|tag| tag.id != id) {
            return Err(AppError::conflict("Tag already exists"));
        }
    }

    repo.update(id, &payload)
        .await
        .map_err(log_failure("Failed to update tag"))?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Tag not found"))
}

/// DELETE /tags/{id}
async fn delete_tag(
    State(state): State<AppState>,
    auth_user: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    let deleted = TagRepository::new(&state.db)
        .delete(id)
        .await
        .map_err(log_failure("Failed to delete tag"))?;

    if !deleted {
        return Err(AppError::not_found("Tag not found"));
    }

    tracing::info!(tag_id = id, user_id = auth_user.id(), "Tag deleted");

    Ok(Json(MessageResponse {
        message: "Tag deleted successfully".to_string(),
    }))
}
