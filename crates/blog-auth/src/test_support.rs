//! In-memory collaborators for tests

use std::sync::Arc;

use async_trait::async_trait;
use blog_db::{DbError, NewUser, User, UserRole, UserStore};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::clock::ManualClock;
use crate::error::AuthError;
use crate::password::CredentialHasher;
use crate::session::{SessionConfig, SessionManager};

pub const ACCESS_TTL_SECS: i64 = 900;
pub const REFRESH_TTL_SECS: i64 = 7 * 24 * 3600;

/// User directory backed by a vector
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    fn modify(&self, id: Uuid, f: impl FnOnce(&mut User)) -> Option<User> {
        let mut users = self.users.write();
        let user = users.iter_mut().find(|u| u.id == id)?;
        f(user);
        user.updated_at = Utc::now();
        Some(user.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DbError> {
        Ok(self.users.read().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        Ok(self.users.read().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        Ok(self.users.read().iter().find(|u| u.username == username).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, DbError> {
        let mut users = self.users.write();
        if users.iter().any(|u| u.email == user.email) {
            return Err(DbError::Duplicate { field: "email", value: user.email });
        }
        if users.iter().any(|u| u.username == user.username) {
            return Err(DbError::Duplicate { field: "username", value: user.username });
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            avatar_url: None,
            is_active: user.is_active,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update_role(&self, id: Uuid, role: UserRole) -> Result<Option<User>, DbError> {
        Ok(self.modify(id, |u| u.role = role))
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<User>, DbError> {
        Ok(self.modify(id, |u| u.is_active = is_active))
    }

    async fn update_avatar_url(
        &self,
        id: Uuid,
        avatar_url: Option<&str>,
    ) -> Result<Option<User>, DbError> {
        Ok(self.modify(id, |u| u.avatar_url = avatar_url.map(str::to_string)))
    }
}

/// Reversible stand-in for a real password hash
#[derive(Default)]
pub struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, digest: &str, password: &str) -> Result<bool, AuthError> {
        match digest.strip_prefix("plain$") {
            Some(stored) => Ok(stored == password),
            None => Err(AuthError::Internal("unrecognised digest".to_string())),
        }
    }
}

pub fn manual_clock() -> Arc<ManualClock> {
    let start: DateTime<Utc> = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    Arc::new(ManualClock::new(start))
}

pub fn sessions_on(clock: Arc<ManualClock>) -> Arc<SessionManager> {
    Arc::new(SessionManager::with_clock(
        "test-access-secret",
        "test-refresh-secret",
        SessionConfig::new(ACCESS_TTL_SECS, REFRESH_TTL_SECS).unwrap(),
        clock,
    ))
}

pub fn past_access_expiry() -> Duration {
    Duration::seconds(ACCESS_TTL_SECS + 1)
}
