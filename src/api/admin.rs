//! Admin-only user management endpoints

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use super::log_failure;
use crate::{
    db::UserRepository,
    middleware::AuthUser,
    models::{
        CreateUserRequest, PasswordResetRequest, UpdateUserRequest, UserListQuery, UserPublic,
    },
    services::AuthService,
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/{id}", put(update_user))
        .route("/admin/users/{id}/reset-password", post(reset_password))
        .route("/admin/users/{id}/toggle-status", post(toggle_status))
}

/// GET /admin/users
async fn list_users(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<UserListQuery>, AppError>,
) -> Result<Json<Vec<UserPublic>>, AppError> {
    let users = UserRepository::new(&state.db)
        .list(&query)
        .await
        .map_err(log_failure("Failed to list users"))?;

    Ok(Json(users.into_iter().map(UserPublic::from).collect()))
}

/// POST /admin/users
async fn create_user(
    State(state): State<AppState>,
    admin: AuthUser,
    WithRejection(Json(payload), _): WithRejection<Json<CreateUserRequest>, AppError>,
) -> Result<Json<UserPublic>, AppError> {
    payload.validate()?;

    let existing = UserRepository::new(&state.db)
        .get_by_username(&payload.username)
        .await
        .map_err(log_failure("Failed to check username"))?;
    if existing.is_some() {
        return Err(AppError::conflict("Username already registered"));
    }

    let user = AuthService::new(state.db.clone())
        .create_user(&payload.username, &payload.password, payload.role)
        .await
        .map_err(log_failure("Failed to create user"))?;

    tracing::info!(
        admin = %admin.username(),
        user_id = user.id,
        username = %user.username,
        role = %user.role,
        "User created"
    );

    Ok(Json(user.into()))
}

/// PUT /admin/users/{id}
async fn update_user(
    State(state): State<AppState>,
    admin: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateUserRequest>, AppError>,
) -> Result<Json<UserPublic>, AppError> {
    payload.validate()?;

    let repo = UserRepository::new(&state.db);
    if let Some(ref username) = payload.username {
        let holder = repo
            .get_by_username(username)
            .await
            .map_err(log_failure("Failed to check username"))?;
        if holder.is_some_and(|user| user.id != id) {
            return Err(AppError::conflict("Username already registered"));
        }
    }

    let user = repo
        .update(id, &payload)
        .await
        .map_err(log_failure("Failed to update user"))?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    tracing::info!(admin = %admin.username(), user_id = user.id, "User updated");

    Ok(Json(user.into()))
}

/// POST /admin/users/{id}/reset-password
async fn reset_password(
    State(state): State<AppState>,
    admin: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<PasswordResetRequest>, AppError>,
) -> Result<Json<UserPublic>, AppError> {
    payload.validate()?;

    let user = AuthService::new(state.db.clone())
        .reset_password(id, &payload.new_password)
        .await
        .map_err(log_failure("Failed to reset password"))?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    tracing::info!(admin = %admin.username(), user_id = user.id, "Password reset");

    Ok(Json(user.into()))
}

/// POST /admin/users/{id}/toggle-status
async fn toggle_status(
    State(state): State<AppState>,
    admin: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<UserPublic>, AppError> {
    let user = UserRepository::new(&state.db)
        .toggle_active(id)
        .await
        .map_err(log_failure("Failed to toggle user status"))?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    tracing::info!(
        admin = %admin.username(),
        user_id = user.id,
        is_active = user.is_active,
        "User status toggled"
    );

    Ok(Json(user.into()))
}
