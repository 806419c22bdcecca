//! MediCare accounts service: CLI server
//!
//! Headless REST server for user accounts, the doctors directory and
//! JWT login. Suitable for a systemd unit, a container, or a dev shell.
//!
//! ```sh
//! # Run with default config (~/.config/medicare/config.toml)
//! medicare-service
//!
//! # Custom config path
//! medicare-service --config /etc/medicare/config.toml
//!
//! # Override the listen port
//! medicare-service --api-port 8000
//!
//! # Validate config without starting
//! medicare-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use medicare::config::{AppConfig, ConfigError};
use medicare::server::{init_tracing, ServerHandle, ServerOptions};

/// MediCare accounts service: users, doctors and token login over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "medicare-service",
    version,
    about = "User accounts and authentication API for MediCare",
    long_about = "MediCare accounts service: REST API for user registration, \
                  profile lookup, the verified doctors directory and JWT login \
                  by username or email.\n\n\
                  Default config: ~/.config/medicare/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "MEDICARE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Skip creating the default admin user.
    #[arg(long)]
    no_admin: bool,
}

/// Resolve the effective configuration.
///
/// A config file that fails to load is fatal under `--check`. Otherwise the
/// service falls back to defaults plus environment overrides, and the load
/// error is handed back for logging once tracing is up. CLI overrides apply
/// either way.
fn resolve_config(
    cli: &Cli,
    loaded: Result<AppConfig, ConfigError>,
) -> Result<(AppConfig, Option<ConfigError>), ConfigError> {
    let (mut config, load_error) = match loaded {
        Ok(cfg) => (cfg, None),
        Err(e) if cli.check => return Err(e),
        Err(e) => (AppConfig::from_env(), Some(e)),
    };

    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(port) = cli.api_port {
        config.server.api_port = port;
    }
    Ok((config, load_error))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(medicare::default_config_path);

    let (config, load_error) = match resolve_config(&cli, AppConfig::load(&config_path)) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Configuration is invalid");
            eprintln!("   Config file : {}", config_path.display());
            eprintln!("   Error       : {}", e);
            std::process::exit(1);
        }
    };

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.server.api_address());
        println!("   Database    : {}", config.database.connection_url());
        println!("   Log level   : {}", config.logging.level);
        println!("   Admin seed  : {}", config.admin.enabled);
        return Ok(());
    }

    init_tracing(&config);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration with environment overrides.");
        }
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        create_default_admin: !cli.no_admin,
    })
    .await?;

    handle.install_signal_handler();

    info!("Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
