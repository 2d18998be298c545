//! Complaint, comment and audit history endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use super::log_failure;
use crate::{
    db::{AuditRepository, CommentRepository, ComplaintRepository, UserRepository},
    middleware::AuthUser,
    models::{
        AuditLog, Comment, Complaint, ComplaintFilter, ComplaintListQuery, CreateCommentRequest,
        CreateComplaintRequest, UpdateComplaintRequest,
    },
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/complaints", get(list_complaints).post(create_complaint))
        .route(
            "/complaints/{id}",
            get(get_complaint).put(update_complaint),
        )
        .route(
            "/complaints/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/complaints/{id}/audit-logs", get(list_audit_logs))
}

/// GET /complaints
async fn list_complaints(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<ComplaintListQuery>, AppError>,
) -> Result<Json<Vec<Complaint>>, AppError> {
    let filter = ComplaintFilter::try_from(query).map_err(AppError::ValidationError)?;

    let complaints = ComplaintRepository::new(&state.db)
        .list(&filter)
        .await
        .map_err(log_failure("Failed to list complaints"))?;

    Ok(Json(complaints))
}

/// POST /complaints
async fn create_complaint(
    State(state): State<AppState>,
    auth_user: AuthUser,
    WithRejection(Json(payload), _): WithRejection<Json<CreateComplaintRequest>, AppError>,
) -> Result<Json<Complaint>, AppError> {
    payload.validate()?;

    let complaint = ComplaintRepository::new(&state.db)
        .create(&payload, auth_user.id())
        .await
        .map_err(log_failure("Failed to create complaint"))?;

    tracing::info!(
        complaint_id = complaint.id,
        user_id = auth_user.id(),
        "Complaint created"
    );

    Ok(Json(complaint))
}

/// GET /complaints/{id}
async fn get_complaint(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<Complaint>, AppError> {
    ComplaintRepository::new(&state.db)
        .get_by_id(id)
        .await
        .map_err(log_failure("Failed to get complaint"))?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Complaint not found"))
}

/// PUT /complaints/{id}
async fn update_complaint(
    State(state): State<AppState>,
    auth_user: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateComplaintRequest>, AppError>,
) -> Result<Json<Complaint>, AppError> {
    payload.validate()?;

    if let Some(Some(assignee)) = payload.assigned_to_id {
        let exists = UserRepository::new(&state.db)
            .exists(assignee)
            .await
            .map_err(log_failure("Failed to check assignee"))?;
        if !exists {
            return Err(AppError::bad_request("Assigned user does not exist"));
        }
    }

    let complaint = ComplaintRepository::new(&state.db)
        .update(id, &payload, auth_user.id())
        .await
        .map_err(log_failure("Failed to update complaint"))?
        .ok_or_else(|| AppError::not_found("Complaint not found"))?;

    tracing::info!(
        complaint_id = complaint.id,
        user_id = auth_user.id(),
        fields = %payload.changed_fields().join(","),
        "Complaint updated"
    );

    Ok(Json(complaint))
}

/// GET /complaints/{id}/comments
async fn list_comments(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let comments = CommentRepository::new(&state.db)
        .list_for_complaint(id)
        .await
        .map_err(log_failure("Failed to list comments"))?;

    Ok(Json(comments))
}

/// POST /complaints/{id}/comments
async fn create_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateCommentRequest>, AppError>,
) -> Result<Json<Comment>, AppError> {
    payload.validate()?;

    let complaint_exists = ComplaintRepository::new(&state.db)
        .exists(id)
        .await
        .map_err(log_failure("Failed to check complaint"))?;
    if !complaint_exists {
        return Err(AppError::not_found("Complaint not found"));
    }

    let comment = CommentRepository::new(&state.db)
        .create(id, auth_user.id(), &payload.content)
        .await
        .map_err(log_failure("Failed to create comment"))?;

    Ok(Json(comment))
}

/// GET /complaints/{id}/audit-logs
async fn list_audit_logs(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    let logs = AuditRepository::new(&state.db)
        .list_for_complaint(id)
        .await
        .map_err(log_failure("Failed to list audit logs"))?;

    Ok(Json(logs))
}
