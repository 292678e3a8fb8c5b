//! Session token issuance, validation and rotation
//!
//! A session is a pair of independently signed JWTs: a short-lived access
//! token and a long-lived refresh token, each signed with its own secret.
//! Nothing is stored server-side; the tokens carry all session state.

use std::sync::Arc;

use blog_db::UserRole;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;
use crate::jwt::{Claims, ISSUER, SigningKey, TokenError, decode_claims, encode_claims};

/// Token lifetimes and verification policy
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Whether a refresh token may stand in for an access token on ordinary
    /// requests
    pub accept_refresh_as_bearer: bool,
}

/// Longest token lifetime accepted (ten years)
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 3600;

fn ttl_from_secs(secs: i64) -> Result<Duration, AuthError> {
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
        return Err(AuthError::Internal(format!(
            "Token lifetime must be between 1 and {} seconds, got {}",
            MAX_TOKEN_TTL_SECS, secs
        )));
    }
    Duration::try_seconds(secs)
        .ok_or_else(|| AuthError::Internal(format!("Token lifetime out of range: {}", secs)))
}

impl SessionConfig {
    pub fn new(access_ttl_secs: i64, refresh_ttl_secs: i64) -> Result<Self, AuthError> {
        Ok(Self {
            access_ttl: ttl_from_secs(access_ttl_secs)?,
            refresh_ttl: ttl_from_secs(refresh_ttl_secs)?,
            accept_refresh_as_bearer: true,
        })
    }

    pub fn with_refresh_as_bearer(mut self, accept: bool) -> Self {
        self.accept_refresh_as_bearer = accept;
        self
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
            accept_refresh_as_bearer: true,
        }
    }
}

/// Access and refresh token issued together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful refresh
#[derive(Debug, Clone)]
pub struct RotatedSession {
    /// Claims decoded from the presented refresh token
    pub claims: Claims,
    /// The newly minted pair
    pub tokens: TokenPair,
}

/// Session token manager
#[derive(Clone)]
pub struct SessionManager {
    access_key: SigningKey,
    refresh_key: SigningKey,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    /// Create a session manager on the system clock
    pub fn new(access_secret: &str, refresh_secret: &str, config: SessionConfig) -> Self {
        Self::with_clock(access_secret, refresh_secret, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        access_secret: &str,
        refresh_secret: &str,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            access_key: SigningKey::from_secret(access_secret.as_bytes()),
            refresh_key: SigningKey::from_secret(refresh_secret.as_bytes()),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Issue a new access/refresh pair for an identity
    pub fn issue(
        &self,
        subject_id: Uuid,
        username: &str,
        email: &str,
        role: UserRole,
    ) -> Result<TokenPair, AuthError> {
        debug!("Issuing session tokens for user: {}", username);

        let access_claims =
            self.claims_for(subject_id, username, email, role, self.config.access_ttl)?;
        let refresh_claims =
            self.claims_for(subject_id, username, email, role, self.config.refresh_ttl)?;

        let access_token = encode_claims(&access_claims, &self.access_key)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let refresh_token = encode_claims(&refresh_claims, &self.refresh_key)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    fn claims_for(
        &self,
        subject_id: Uuid,
        username: &str,
        email: &str,
        role: UserRole,
        ttl: Duration,
    ) -> Result<Claims, AuthError> {
        let iat = self.clock.now().timestamp();
        let exp = iat
            .checked_add(ttl.num_seconds())
            .ok_or_else(|| AuthError::Internal("Token expiry overflows".to_string()))?;
        Ok(Claims {
            sub: subject_id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            role,
            iat,
            nbf: iat,
            exp,
            iss: ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
        })
    }

    /// Validate a bearer token and return its claims
    ///
    /// The access secret is tried first. An access token that verifies but
    /// has expired is reported as expired straight away; any other failure
    /// falls back to the refresh secret when refresh tokens are accepted as
    /// bearer credentials.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let now = self.clock.now();

        match decode_claims(token, &self.access_key, now) {
            Ok(claims) => Ok(claims),
            Err(TokenError::Expired) => Err(AuthError::TokenExpired),
            Err(_) if !self.config.accept_refresh_as_bearer => Err(AuthError::InvalidToken),
            Err(_) => {
                let claims = decode_claims(token, &self.refresh_key, now)
                    .map_err(|_| AuthError::InvalidToken)?;
                debug!("Refresh token accepted as bearer for user: {}", claims.username);
                Ok(claims)
            }
        }
    }

    /// Exchange a refresh token for a brand-new pair
    ///
    /// Only the refresh secret is consulted. The new pair is built from the
    /// identity embedded in the presented token; the presented token itself
    /// stays valid until it expires.
    pub fn refresh(&self, refresh_token: &str) -> Result<RotatedSession, AuthError> {
        let claims = decode_claims(refresh_token, &self.refresh_key, self.clock.now())
            .map_err(|e| match e {
                TokenError::Expired => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })?;
        let subject_id = claims.subject_id().ok_or(AuthError::InvalidToken)?;

        let tokens = self.issue(subject_id, &claims.username, &claims.email, claims.role)?;

        Ok(RotatedSession { claims, tokens })
    }
}
