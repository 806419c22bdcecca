//! Credential primitives: JWT signing and bcrypt password hashes.

pub mod jwt;
pub mod password;

pub use jwt::{create_token, verify_token, JwtConfig, TokenClaims, TokenKind};
pub use password::{hash_password, verify_password};
