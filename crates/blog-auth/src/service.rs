//! Registration, login and token refresh flows

use std::sync::{Arc, OnceLock};

use blog_db::{DbError, NewUser, User, UserRole, UserStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AuthError;
use crate::password::CredentialHasher;
use crate::session::{SessionManager, TokenPair};

/// Public view of a user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            avatar_url: user.avatar_url.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// Payload returned by register, login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in_seconds: i64,
}

/// Logout acknowledgment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutAck {
    pub message: String,
}

/// Authentication orchestrator
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
    sessions: Arc<SessionManager>,
    /// Digest checked against when the email is unknown, so a miss costs
    /// about as much as a wrong password
    dummy_digest: OnceLock<Option<String>>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            users,
            hasher,
            sessions,
            dummy_digest: OnceLock::new(),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Register a new account with the default role and sign it in
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailConflict);
        }
        if self.users.find_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameConflict);
        }

        let password_hash = self.hasher.hash(password)?;

        let user = self
            .users
            .create(NewUser {
                email: email.to_string(),
                username: username.to_string(),
                password_hash,
                role: UserRole::User,
                is_active: true,
            })
            .await
            .map_err(|e| match e {
                DbError::Duplicate { field: "email", .. } => AuthError::EmailConflict,
                DbError::Duplicate { field: "username", .. } => AuthError::UsernameConflict,
                other => AuthError::from(other),
            })?;

        let tokens = self
            .sessions
            .issue(user.id, &user.username, &user.email, user.role)?;

        info!("Registered user {}", user.username);
        Ok(self.respond(&user, tokens))
    }

    /// Authenticate by email and password
    ///
    /// An unknown email and a wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        debug!("Login attempt for email: {}", email);

        let Some(user) = self.users.find_by_email(email).await? else {
            self.burn_verification(password);
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_active {
            return Err(AuthError::NotActive);
        }

        if !self.hasher.verify(&user.password_hash, password)? {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self
            .sessions
            .issue(user.id, &user.username, &user.email, user.role)?;

        info!("User {} logged in successfully", user.username);
        Ok(self.respond(&user, tokens))
    }

    /// Rotate a refresh token into a new pair
    ///
    /// The new tokens carry the identity embedded in the old refresh token,
    /// but the account is re-read so that deactivation takes effect on the
    /// next refresh.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        let rotated = self.sessions.refresh(refresh_token)?;
        let subject_id = rotated.claims.subject_id().ok_or(AuthError::InvalidToken)?;

        let user = self
            .users
            .find_by_id(subject_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.is_active {
            warn!("Refresh rejected for inactive user {}", user.username);
            return Err(AuthError::NotActive);
        }

        info!("Refreshed session for user {}", user.username);
        Ok(self.respond(&user, rotated.tokens))
    }

    /// Acknowledge a logout
    ///
    /// Sessions live entirely in the client-held tokens, so there is nothing
    /// to invalidate here.
    pub fn logout(&self) -> LogoutAck {
        LogoutAck {
            message: "Successfully logged out".to_string(),
        }
    }

    fn respond(&self, user: &User, tokens: TokenPair) -> AuthResponse {
        AuthResponse {
            user: UserProfile::from(user),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in_seconds: self.sessions.config().access_ttl_secs(),
        }
    }

    fn burn_verification(&self, password: &str) {
        let digest = self
            .dummy_digest
            .get_or_init(|| self.hasher.hash("timing-equaliser").ok());
        if let Some(digest) = digest {
            let _ = self.hasher.verify(digest, password);
        }
    }
}
