//! Users module: account listing, creation, profile and doctors directory

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
