//! API routes

mod auth;
mod health;
pub mod types;
mod users;

use axum::{Router, extract::DefaultBodyLimit};

use crate::state::AppState;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .merge(health::routes())
        // Account flows
        .merge(auth::routes())
        // User management
        .merge(users::routes(&state))
        .with_state(state)
        .layer(DefaultBodyLimit::max(64 * 1024))
}
