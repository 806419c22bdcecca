pub mod identity;

pub use identity::{JwtTokenIssuer, LoginResolver, TokenIssuer, UserService};
