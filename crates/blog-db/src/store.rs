//! User directory trait

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NewUser, User, UserRole};

/// User directory
///
/// Lookups return `Ok(None)` when no account matches, so callers can tell a
/// missing account apart from a storage failure.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DbError>;

    /// Find a user by email address
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError>;

    /// Create a user; fails with [`DbError::Duplicate`] if the email or
    /// username is already taken
    async fn create(&self, user: NewUser) -> Result<User, DbError>;

    /// Change a user's role, returning the updated record
    async fn update_role(&self, id: Uuid, role: UserRole) -> Result<Option<User>, DbError>;

    /// Activate or deactivate a user, returning the updated record
    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<User>, DbError>;

    /// Set or clear a user's avatar URL, returning the updated record
    async fn update_avatar_url(
        &self,
        id: Uuid,
        avatar_url: Option<&str>,
    ) -> Result<Option<User>, DbError>;
}
