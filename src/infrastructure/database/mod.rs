pub mod entities;
pub mod migrator;
pub mod repositories;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./medicare.db?mode=rwc")
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./medicare.db?mode=rwc".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(8),
        }
    }
}

impl DatabaseConfig {
    /// Private in-memory SQLite database. Pinned to a single connection,
    /// since every SQLite connection to `:memory:` opens a separate database.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Self::default()
        }
    }
}

/// Initialize database connection
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    info!("Connecting to database: {}", config.url);

    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!("Database connected successfully");
    Ok(db)
}
