//! User management service: application-layer orchestration
//!
//! HTTP handlers are thin wrappers that delegate here. Every operation
//! performs at most one store read, or one write for creation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::{
    CreateUserDto, DomainError, DomainResult, User, UserRepositoryInterface, UserRole,
};
use crate::infrastructure::crypto::password::hash_password;

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

/// User service: list, create, profile and doctors directory.
///
/// Generic over `R: UserRepositoryInterface` so it stays decoupled from
/// the concrete persistence layer.
pub struct UserService<R: UserRepositoryInterface> {
    repo: Arc<R>,
}

impl<R: UserRepositoryInterface> UserService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Every account in the store, oldest first.
    pub async fn list_users(&self) -> DomainResult<Vec<User>> {
        self.repo.list_all().await
    }

    pub async fn get_user(&self, id: &str) -> DomainResult<User> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "User",
                field: "id",
                value: id.to_string(),
            })
    }

    /// The record bound to an authenticated session. `user_id` must come
    /// from verified token claims, never from request input.
    pub async fn profile(&self, user_id: &str) -> DomainResult<User> {
        match self.repo.find_by_id(user_id).await? {
            Some(user) if user.is_active => Ok(user),
            Some(_) => Err(DomainError::Unauthorized("User is inactive".into())),
            None => {
                warn!(user_id, "Token subject no longer exists");
                Err(DomainError::Unauthorized("User not found".into()))
            }
        }
    }

    /// Verified doctors, resolved by a single store-level filter.
    pub async fn list_doctors(&self) -> DomainResult<Vec<User>> {
        let doctors = self.repo.filter_by_role(UserRole::Doctor, true).await?;
        debug_assert!(doctors.iter().all(User::is_listed_doctor));
        Ok(doctors)
    }

    pub async fn count_users(&self) -> DomainResult<u64> {
        self.repo.count().await
    }

    // ── Commands ────────────────────────────────────────────────

    /// Create an account. Username uniqueness is left to the store's
    /// constraint; there is no lookup before the insert.
    pub async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User> {
        validate_username(&dto.username)?;
        if dto.email.trim().is_empty() {
            return Err(DomainError::validation("email", "This field may not be blank."));
        }
        if dto.password.chars().count() < PASSWORD_MIN_LEN {
            return Err(DomainError::validation(
                "password",
                format!("Ensure this field has at least {PASSWORD_MIN_LEN} characters."),
            ));
        }

        let password_hash = hash_password(&dto.password)
            .map_err(|e| DomainError::Internal(format!("Failed to hash password: {}", e)))?;

        let now = Utc::now();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: dto.username,
            email: dto.email,
            password_hash,
            role: dto.role,
            is_verified: dto.is_verified,
            is_active: true,
            first_name: dto.first_name,
            last_name: dto.last_name,
            specialization: dto.specialization,
            phone: dto.phone,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.insert(user).await?;

        info!(
            user_id = %created.id,
            username = %created.username,
            role = role_to_str(&created.role),
            "New user created"
        );
        Ok(created)
    }
}

/// Letters, digits and `@ . + - _`, up to 150 characters.
fn validate_username(username: &str) -> DomainResult<()> {
    if username.is_empty() {
        return Err(DomainError::validation("username", "This field may not be blank."));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(DomainError::validation(
            "username",
            format!("Ensure this field has no more than {USERNAME_MAX_LEN} characters."),
        ));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(DomainError::validation(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────

pub fn role_to_str(role: &UserRole) -> &'static str {
    match role {
        UserRole::Patient => "patient",
        UserRole::Doctor => "doctor",
        UserRole::Admin => "admin",
    }
}

pub fn str_to_role(s: &str) -> Option<UserRole> {
    match s.to_lowercase().as_str() {
        "patient" => Some(UserRole::Patient),
        "doctor" => Some(UserRole::Doctor),
        "admin" => Some(UserRole::Admin),
        _ => None,
    }
}
