//! Authentication module: token login and refresh

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
