//! Identity module: accounts and authentication
//!
//! - `service`: account queries and creation (`UserService`)
//! - `token`: the `TokenIssuer` seam and its JWT implementation
//! - `login`: `LoginResolver`, which maps an email to a username before
//!   handing the request to an issuer

pub mod login;
pub mod service;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use login::{LoginRequest, LoginResolver};
pub use service::{role_to_str, str_to_role, UserService};
pub use token::{AccessToken, JwtTokenIssuer, TokenIssuer, TokenPair};
