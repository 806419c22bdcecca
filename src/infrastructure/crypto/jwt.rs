//! JWT Token handling
//!
//! Two token kinds share one signing key: short-lived access tokens used as
//! `Authorization: Bearer` credentials, and long-lived refresh tokens that
//! can only be exchanged for a new access token.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Access token lifetime in minutes
    pub access_token_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_token_days: i64,
    /// Issuer claim
    pub issuer: String,
}

impl JwtConfig {
    /// Access token lifetime in seconds, as reported to clients.
    pub fn access_expires_in(&self) -> i64 {
        self.access_token_minutes * 60
    }
}

/// Which of the two token kinds a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT TokenClaims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Username
    pub username: String,
    /// User role
    pub role: String,
    /// Access or refresh
    pub token_type: TokenKind,
    /// Unique token id
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl TokenClaims {
    pub fn new(user_id: &str, username: &str, role: &str, kind: TokenKind, config: &JwtConfig) -> Self {
        let now = Utc::now();
        let lifetime = match kind {
            TokenKind::Access => Duration::minutes(config.access_token_minutes),
            TokenKind::Refresh => Duration::days(config.refresh_token_days),
        };

        Self {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            token_type: kind,
            jti: uuid::Uuid::new_v4().simple().to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
        }
    }
}

/// Create a signed JWT of the given kind for a user
pub fn create_token(
    user_id: &str,
    username: &str,
    role: &str,
    kind: TokenKind,
    config: &JwtConfig,
) -> Result<String, JwtError> {
    let token_claims = TokenClaims::new(user_id, username, role, kind, config);

    encode(
        &Header::default(),
        &token_claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature, issuer and expiry, and require the expected token kind.
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
    expected: TokenKind,
) -> Result<TokenClaims, JwtError> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    if token_data.claims.token_type != expected {
        return Err(ErrorKind::InvalidToken.into());
    }

    Ok(token_data.claims)
}
