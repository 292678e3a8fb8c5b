//! JWT token encoding and decoding
//!
//! Tokens are HS256 JWTs. The library verifies the MAC; expiry and
//! not-before are checked here against the instant the caller passes in, so
//! a token that is correctly signed but past its expiry is reported as
//! [`TokenError::Expired`] rather than as a signature failure.

use std::fmt;

use blog_db::UserRole;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Issuer embedded in every token
pub const ISSUER: &str = "blog-management-api";

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Username at issuance time
    pub username: String,
    /// Email at issuance time
    pub email: String,
    /// User role at issuance time
    pub role: UserRole,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp)
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Token ID
    pub jti: String,
}

impl Claims {
    /// Subject parsed as a user ID
    pub fn subject_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// Token codec failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Token signature does not match")]
    SignatureInvalid,

    #[error("Token has expired")]
    Expired,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// HMAC key material derived from one secret
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// Sign a claim set
pub fn encode_claims(claims: &Claims, key: &SigningKey) -> Result<String, TokenError> {
    encode(&Header::new(Algorithm::HS256), claims, &key.encoding)
        .map_err(|e| TokenError::Encoding(e.to_string()))
}

/// Verify a token's signature and time window, returning its claims
pub fn decode_claims(
    token: &str,
    key: &SigningKey,
    now: DateTime<Utc>,
) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.leeway = 0;
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["sub", "iat", "nbf", "exp", "iss"]);

    let token_data = decode::<Claims>(token, &key.decoding, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
            _ => TokenError::Malformed,
        }
    })?;
    let claims = token_data.claims;

    let now = now.timestamp();
    if now > claims.exp {
        return Err(TokenError::Expired);
    }
    if now < claims.nbf || claims.nbf > claims.iat || claims.iat >= claims.exp {
        return Err(TokenError::Malformed);
    }

    Ok(claims)
}
