//! Token issuance: credential check and JWT pair creation

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use super::login::LoginRequest;
use super::service::role_to_str;
use crate::domain::{DomainError, DomainResult, User, UserRepositoryInterface};
use crate::infrastructure::crypto::jwt::{create_token, verify_token, JwtConfig, TokenKind};
use crate::infrastructure::crypto::password::verify_password;

/// Access + refresh token pair returned on a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Verifies a username/password pair and mints tokens.
///
/// Only ever sees a literal username: any email-to-username translation
/// happens before the request reaches an issuer.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Fails with [`DomainError::InvalidCredentials`] for an unknown
    /// username, an inactive account, or a wrong password alike.
    async fn issue(&self, credentials: LoginRequest) -> DomainResult<TokenPair>;

    /// Exchange a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> DomainResult<AccessToken>;
}

/// JWT issuer backed by the user store.
pub struct JwtTokenIssuer<R: UserRepositoryInterface> {
    repo: Arc<R>,
    config: JwtConfig,
}

impl<R: UserRepositoryInterface> JwtTokenIssuer<R> {
    pub fn new(repo: Arc<R>, config: JwtConfig) -> Self {
        Self { repo, config }
    }

    fn sign(&self, user: &User, kind: TokenKind) -> DomainResult<String> {
        create_token(&user.id, &user.username, role_to_str(&user.role), kind, &self.config)
            .map_err(|e| DomainError::Internal(format!("Failed to create token: {}", e)))
    }
}

fn required(field: &str, value: Option<String>) -> DomainResult<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DomainError::validation(field, "This field is required.")),
    }
}

#[async_trait]
impl<R: UserRepositoryInterface> TokenIssuer for JwtTokenIssuer<R> {
    async fn issue(&self, credentials: LoginRequest) -> DomainResult<TokenPair> {
        let username = required("username", credentials.username)?;
        let password = required("password", credentials.password)?;

        let Some(user) = self.repo.find_by_username(&username).await? else {
            debug!(username = %username, "Login for unknown username");
            return Err(DomainError::InvalidCredentials);
        };

        if !user.is_active || !verify_password(&password, &user.password_hash) {
            debug!(user_id = %user.id, "Login rejected");
            return Err(DomainError::InvalidCredentials);
        }

        Ok(TokenPair {
            access_token: self.sign(&user, TokenKind::Access)?,
            refresh_token: self.sign(&user, TokenKind::Refresh)?,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_expires_in(),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> DomainResult<AccessToken> {
        let claims = verify_token(refresh_token, &self.config, TokenKind::Refresh).map_err(|e| {
            debug!("Refresh token rejected: {}", e);
            DomainError::Unauthorized("Token is invalid or expired".into())
        })?;

        let user = match self.repo.find_by_id(&claims.sub).await? {
            Some(user) if user.is_active => user,
            _ => {
                warn!(user_id = %claims.sub, "Refresh for missing or inactive user");
                return Err(DomainError::Unauthorized("Token is invalid or expired".into()));
            }
        };

        Ok(AccessToken {
            access_token: self.sign(&user, TokenKind::Access)?,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_expires_in(),
        })
    }
}
