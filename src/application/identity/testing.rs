//! In-memory collaborators for identity unit tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use super::login::LoginRequest;
use super::token::{AccessToken, TokenIssuer, TokenPair};
use crate::domain::{DomainError, DomainResult, User, UserRepositoryInterface, UserRole};

/// Vec-backed store that keeps insertion order and enforces unique usernames.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<Vec<User>>>,
    unavailable: AtomicBool,
}

impl InMemoryUserRepository {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(RwLock::new(users)),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Every subsequent call fails as if the database were unreachable.
    pub fn set_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> DomainResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::ServiceUnavailable("store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepositoryInterface for InMemoryUserRepository {
    async fn insert(&self, user: User) -> DomainResult<User> {
        self.check()?;
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == user.username) {
            return Err(DomainError::validation(
                "username",
                "A user with that username already exists.",
            ));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn list_all(&self) -> DomainResult<Vec<User>> {
        self.check()?;
        Ok(self.users.read().await.clone())
    }

    async fn filter_by_role(&self, role: UserRole, is_verified: bool) -> DomainResult<Vec<User>> {
        self.check()?;
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| u.role == role && u.is_verified == is_verified)
            .cloned()
            .collect())
    }

    async fn count(&self) -> DomainResult<u64> {
        self.check()?;
        Ok(self.users.read().await.len() as u64)
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        self.check()?;
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        self.check()?;
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        self.check()?;
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| u.email == email)
            .min_by_key(|u| u.created_at)
            .cloned())
    }
}

/// Issuer that records what it was handed and accepts only `alice`/`secret`.
#[derive(Default)]
pub struct RecordingIssuer {
    pub received: RwLock<Vec<LoginRequest>>,
}

#[async_trait]
impl TokenIssuer for RecordingIssuer {
    async fn issue(&self, credentials: LoginRequest) -> DomainResult<TokenPair> {
        self.received.write().await.push(credentials.clone());
        match (credentials.username.as_deref(), credentials.password.as_deref()) {
            (Some("alice"), Some("secret")) => Ok(TokenPair {
                access_token: "access".into(),
                refresh_token: "refresh".into(),
                token_type: "Bearer".into(),
                expires_in: 60,
            }),
            _ => Err(DomainError::InvalidCredentials),
        }
    }

    async fn refresh(&self, _refresh_token: &str) -> DomainResult<AccessToken> {
        Err(DomainError::Unauthorized("Token is invalid or expired".into()))
    }
}

/// An active user with a placeholder hash, created a minute ago.
pub fn sample_user(username: &str, email: &str, role: UserRole, is_verified: bool) -> User {
    let now = Utc::now() - Duration::minutes(1);
    User {
        id: uuid::Uuid::new_v4().to_string(),
        username: username.into(),
        email: email.into(),
        password_hash: "not-a-real-hash".into(),
        role,
        is_verified,
        is_active: true,
        first_name: String::new(),
        last_name: String::new(),
        specialization: None,
        phone: None,
        created_at: now,
        updated_at: now,
    }
}
