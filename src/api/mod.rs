//! API routes and handlers
//!
//! This module defines all API endpoints and their routing.

use axum::{middleware::from_fn, middleware::from_fn_with_state, routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    middleware::{auth_middleware, require_admin},
    utils::AppError,
    AppState,
};

mod admin;
mod complaints;
mod health;
mod tags;
mod users;

pub use health::*;

/// Public API routes (no authentication required)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness))
        .merge(users::public_routes())
}

/// Protected API routes (authentication required)
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .merge(users::routes())
        .merge(complaints::routes())
        .merge(tags::routes())
}

/// Admin API routes (authentication and the admin role required)
pub fn admin_routes() -> Router<AppState> {
    admin::routes()
}

/// Build the complete application with auth, CORS, compression and request tracing
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Layers added last run first: auth resolves the user before the admin gate
    let admin = admin_routes()
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let protected =
        protected_routes().route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes())
        .merge(protected)
        .merge(admin)
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(trace_layer)
}

/// Log a data-layer failure and convert it for the response
pub(crate) fn log_failure(context: &'static str) -> impl FnOnce(anyhow::Error) -> AppError {
    move |e| {
        tracing::error!("{}: {:#}", context, e);
        AppError::from(e)
    }
}
