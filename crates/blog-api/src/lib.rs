//! Blog Management REST API
//!
//! This crate provides the Axum-based HTTP API for the blog backend:
//! account registration, login, token refresh and user administration.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
