//! Blog Management Database Layer
//!
//! This crate provides the user directory for the blog backend: the
//! [`UserStore`] capability consumed by the authentication layer, and a
//! SQLite implementation of it via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod store;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::Database;
pub use store::UserStore;
