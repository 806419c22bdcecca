//! # MediCare accounts service
//!
//! User accounts and authentication for the MediCare platform: open
//! registration and listing, the caller's own profile, the verified
//! doctors directory, and JWT login by username or email.
//!
//! ## Architecture
//!
//! - **domain**: the user aggregate and the store contract
//! - **application**: account queries, token issuance, login resolution
//! - **infrastructure**: crypto (JWT, bcrypt) and the SeaORM database layer
//! - **interfaces**: REST API with Swagger documentation
//! - **support**: error taxonomy and graceful shutdown
//! - **server**: process lifecycle shared by the CLI

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod support;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig};

// Re-export API router
pub use interfaces::create_api_router;
