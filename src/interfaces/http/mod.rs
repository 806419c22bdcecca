//! HTTP REST API interfaces
//!
//! - `common`: error bodies and the `ValidatedJson` extractor
//! - `middleware`: bearer-token authentication
//! - `modules`: handlers and DTOs per resource
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::create_api_router;
