//! Middleware components
//!
//! This module contains middleware for:
//! - Authentication (JWT bearer tokens)
//! - Authorization (admin role gate)

pub mod auth;

pub use auth::{auth_middleware, require_admin, AuthError, AuthUser, Claims};
