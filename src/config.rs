//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/medicare/config.toml`).
//! Every section and field is optional; a missing file yields defaults.
//! `DATABASE_URL` and `JWT_SECRET` from the environment override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::database::DatabaseConfig;

pub const DEFAULT_JWT_SECRET: &str = "super-secret-key-change-in-production";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// `<config_dir>/medicare/config.toml`, falling back to the working directory.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("medicare")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub security: SecuritySection,
    pub logging: LoggingSection,
    pub admin: AdminSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to let in-flight requests finish after a shutdown signal.
    pub shutdown_timeout: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            shutdown_timeout: 30,
        }
    }
}

impl ServerSection {
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 8,
        }
    }
}

impl DatabaseSection {
    /// The configured URL, or `medicare.db` in the working directory.
    pub fn connection_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| DatabaseConfig::default().url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub issuer: String,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            access_token_minutes: 60,
            refresh_token_days: 1,
            issuer: "medicare".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// An `EnvFilter` directive, e.g. `info` or `medicare=debug,tower_http=info`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Seed account created on first start when the store is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSection {
    pub enabled: bool,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Default for AdminSection {
    fn default() -> Self {
        Self {
            enabled: true,
            username: "admin".to_string(),
            email: "admin@medicare.local".to_string(),
            password: "admin12345".to_string(),
        }
    }
}

impl AppConfig {
    /// Read `path` if it exists, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml_str(&raw)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Defaults with environment overrides applied. Used when the config
    /// file cannot be read, so `JWT_SECRET` and `DATABASE_URL` still hold.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(secret) = lookup("JWT_SECRET").filter(|v| !v.is_empty()) {
            self.security.jwt_secret = secret;
        }
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.security.jwt_secret.clone(),
            access_token_minutes: self.security.access_token_minutes,
            refresh_token_days: self.security.refresh_token_days,
            issuer: self.security.issuer.clone(),
        }
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database.connection_url(),
            max_connections: self.database.max_connections,
            min_connections: self.database.min_connections,
            connect_timeout: Duration::from_secs(self.database.connect_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.api_address(), "0.0.0.0:8000");
        assert_eq!(config.security.access_token_minutes, 60);
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.admin.enabled);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            api_port = 9100

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [security]
            jwt_secret = "from-file"
            access_token_minutes = 15

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.api_address(), "0.0.0.0:9100");
        assert_eq!(config.database.connection_url(), "sqlite::memory:");
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");

        let jwt = config.jwt_config();
        assert_eq!(jwt.secret, "from-file");
        assert_eq!(jwt.access_expires_in(), 15 * 60);
        assert_eq!(jwt.refresh_token_days, 1);

        let db = config.database_config();
        assert_eq!(db.max_connections, 1);
        assert_eq!(db.connect_timeout, Duration::from_secs(8));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = AppConfig::from_toml_str("[server\napi_port = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(AppConfig::from_toml_str("[logging]\nformat = \"xml\"").is_err());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("medicare-no-such-config.toml");
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.server.api_port, 8000);
    }

    #[test]
    fn env_overrides_replace_secret_and_database_url() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            "JWT_SECRET" => Some("s3cr3t".to_string()),
            "DATABASE_URL" => Some("sqlite::memory:".to_string()),
            _ => None,
        });

        assert_eq!(config.jwt_config().secret, "s3cr3t");
        assert_eq!(config.database.connection_url(), "sqlite::memory:");
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(|_| Some(String::new()));

        assert_eq!(config.security.jwt_secret, DEFAULT_JWT_SECRET);
        assert_eq!(config.database.url, None);
    }

    #[test]
    fn default_path_ends_in_medicare_config() {
        assert!(default_config_path().ends_with("medicare/config.toml"));
    }
}
