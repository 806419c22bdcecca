//! Login resolution: lets one login form accept a username or an email
//!
//! The resolver never checks credentials. It only decides which username
//! the [`TokenIssuer`] should see, then forwards the request unchanged
//! otherwise and returns the issuer's outcome as-is.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::token::{TokenIssuer, TokenPair};
use crate::domain::{DomainError, DomainResult, UserRepositoryInterface};

/// Inbound login payload. The `username` field may carry an email address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub struct LoginResolver<R: UserRepositoryInterface, I: TokenIssuer> {
    repo: Arc<R>,
    issuer: Arc<I>,
}

impl<R: UserRepositoryInterface, I: TokenIssuer> LoginResolver<R, I> {
    pub fn new(repo: Arc<R>, issuer: Arc<I>) -> Self {
        Self { repo, issuer }
    }

    pub fn issuer(&self) -> &Arc<I> {
        &self.issuer
    }

    /// Build the request the issuer will receive.
    ///
    /// When `username` equals some account's email (exact match), the result
    /// carries that account's username instead. A miss is not an error; the
    /// value is passed through as a literal username. Store failures do
    /// propagate.
    pub async fn resolve(&self, request: &LoginRequest) -> DomainResult<LoginRequest> {
        let identifier = match request.username.as_deref() {
            Some(value) if !value.is_empty() => value,
            _ => return Ok(request.clone()),
        };

        match self.repo.find_by_email(identifier).await? {
            Some(user) => {
                debug!(user_id = %user.id, "Login identifier resolved from email");
                metrics::counter!("auth_email_rewrites_total").increment(1);
                Ok(LoginRequest {
                    username: Some(user.username),
                    password: request.password.clone(),
                })
            }
            None => Ok(request.clone()),
        }
    }

    /// Resolve the identifier, then delegate to the issuer.
    pub async fn login(&self, request: LoginRequest) -> DomainResult<TokenPair> {
        let forwarded = self.resolve(&request).await?;
        let result = self.issuer.issue(forwarded).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(DomainError::InvalidCredentials) => "invalid_credentials",
            Err(_) => "error",
        };
        metrics::counter!("auth_login_total", "outcome" => outcome).increment(1);

        result
    }
}
