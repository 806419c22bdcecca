//! Domain layer: the user aggregate and its store contract.

pub mod user;

pub use user::{CreateUserDto, User, UserRepositoryInterface, UserRole};

// Re-export DomainError from support for convenience
pub use crate::support::errors::{DomainError, DomainResult};
