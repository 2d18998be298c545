//! Login and current-user endpoints

use axum::{
    extract::{FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    routing::{get, post},
    Form, Json, Router,
};

use super::log_failure;
use crate::{
    middleware::auth::{create_access_token, AuthUser},
    models::{LoginRequest, TokenResponse, UserPublic},
    services::AuthService,
    utils::AppError,
    AppState,
};

/// Routes reachable without a token
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/users/token", post(login))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_current_user))
}

/// Login credentials sent either as JSON or as an HTML form
pub struct Credentials(pub LoginRequest);

impl<S> FromRequest<S> for Credentials
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(login) = Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|e| AppError::ValidationError(e.body_text()))?;
            Ok(Self(login))
        } else {
            let Json(login) = Json::<LoginRequest>::from_request(req, state).await?;
            Ok(Self(login))
        }
    }
}

/// Exchange a username and password for a bearer token
///
/// POST /users/token
async fn login(
    State(state): State<AppState>,
    Credentials(payload): Credentials,
) -> Result<Json<TokenResponse>, AppError> {
    let auth_service = AuthService::new(state.db.clone());

    let user = auth_service
        .authenticate(&payload.username, &payload.password)
        .await
        .map_err(log_failure("Authentication failed"))?
        .ok_or_else(|| {
            tracing::info!(username = %payload.username, "Failed login attempt");
            AppError::unauthorized("Incorrect username or password")
        })?;

    if !user.is_active {
        tracing::warn!(username = %user.username, "Login attempt for inactive user");
        return Err(AppError::forbidden("Inactive user"));
    }

    let user = auth_service
        .record_login(user)
        .await
        .map_err(log_failure("Failed to record login"))?;

    let token = create_access_token(
        &user,
        &state.config.auth.jwt_secret,
        state.config.auth.token_expiry_minutes,
    )
    .map_err(|e| {
        tracing::error!("Failed to create access token: {}", e);
        AppError::internal("Failed to create access token")
    })?;

    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    Ok(Json(TokenResponse::bearer(token)))
}

/// GET /users/me
async fn get_current_user(auth_user: AuthUser) -> Json<UserPublic> {
    Json(UserPublic::from(auth_user.user))
}
