use async_trait::async_trait;

use super::{User, UserRole};
use crate::domain::DomainResult;

/// User store. Usernames are unique at the storage level; emails are not.
#[async_trait]
pub trait UserRepositoryInterface: Send + Sync {
    /// Persist a new record. A duplicate username surfaces as a
    /// `Validation` error on the `username` field.
    async fn insert(&self, user: User) -> DomainResult<User>;

    async fn list_all(&self) -> DomainResult<Vec<User>>;
    async fn filter_by_role(&self, role: UserRole, is_verified: bool) -> DomainResult<Vec<User>>;
    async fn count(&self) -> DomainResult<u64>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;
    /// Exact-match lookup; the oldest account wins when several share an email.
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;
}
