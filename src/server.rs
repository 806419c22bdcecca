//! Reusable server runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full server lifecycle:
//! database init, migrations, admin bootstrap, REST API, metrics, and
//! graceful shutdown.

use std::future::IntoFuture;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::application::identity::UserService;
use crate::config::{AppConfig, LogFormat, DEFAULT_JWT_SECRET};
use crate::domain::{CreateUserDto, DomainResult, UserRepositoryInterface, UserRole};
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::database::repositories::UserRepository;
use crate::infrastructure::init_database;
use crate::interfaces::create_api_router;
use crate::support::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the service.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Create the configured admin user if the store is empty (default: true).
    pub create_default_admin: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            create_default_admin: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running service.
///
/// # Examples
///
/// ```rust,no_run
/// use medicare::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     // ... wait for shutdown signal ...
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Address the REST API is bound to.
    pub local_addr: std::net::SocketAddr,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

/// The global metrics recorder can only be installed once per process.
/// A stop + start within the same process reuses it.
fn prometheus_handle() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("📊 Prometheus metrics recorder installed");
    Ok(PROM_HANDLE.get_or_init(|| handle).clone())
}

impl ServerHandle {
    /// Start the service with the given options.
    ///
    /// This will:
    /// 1. Install the Prometheus metrics recorder
    /// 2. Connect to the database and run migrations
    /// 3. Create the default admin user (if enabled)
    /// 4. Start the REST API server (with Swagger UI)
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;

        info!("Starting MediCare accounts service...");

        let prometheus_handle = prometheus_handle()?;

        // ── Build sub-configs ──────────────────────────────────
        let db_config = app_cfg.database_config();
        let jwt_config = app_cfg.jwt_config();
        if jwt_config.secret == DEFAULT_JWT_SECRET {
            warn!("⚠️  Using the built-in JWT secret; set security.jwt_secret or JWT_SECRET");
        }
        info!(
            access_minutes = jwt_config.access_token_minutes,
            refresh_days = jwt_config.refresh_token_days,
            "JWT configured"
        );

        // ── Database ───────────────────────────────────────────
        let db = init_database(&db_config).await?;

        if opts.auto_migrate {
            info!("Running database migrations...");
            Migrator::up(&db, None).await?;
            info!("Migrations completed");
        }

        if opts.create_default_admin && app_cfg.admin.enabled {
            let service = UserService::new(Arc::new(UserRepository::new(db.clone())));
            if let Err(e) = create_default_admin(&service, &app_cfg).await {
                error!("Failed to create admin user: {}", e);
            }
        }

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── REST API server ────────────────────────────────────
        let api_router = create_api_router(db.clone(), jwt_config, prometheus_handle);

        let api_addr = app_cfg.server.api_address();
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_shutdown = shutdown_signal.clone();
        let drain_timeout = shutdown.timeout();
        let api_task = tokio::spawn(async move {
            let server = axum::serve(listener, api_router)
                .with_graceful_shutdown(async move {
                    api_shutdown.wait().await;
                    info!("🛑 REST API server received shutdown signal");
                })
                .into_future();

            // In-flight requests get `drain_timeout` once shutdown starts.
            let drain_signal = shutdown_signal.clone();
            tokio::select! {
                result = server => {
                    if let Err(e) = result {
                        error!("REST API server error: {}", e);
                    }
                }
                _ = async {
                    drain_signal.wait().await;
                    tokio::time::sleep(drain_timeout).await;
                } => {
                    warn!("Shutdown timeout elapsed; dropping open connections");
                }
            }
        });

        info!("🚀 Server started.");

        Ok(Self {
            config: app_cfg,
            local_addr,
            db,
            shutdown,
            api_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    ///
    /// Call [`wait`](Self::wait) to block until everything has stopped.
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to fully stop after shutdown has been triggered.
    pub async fn wait(self) {
        info!("⏳ Waiting for server tasks to complete...");

        match self.api_task.await {
            Ok(()) => info!("REST API server stopped"),
            Err(e) => error!("REST API server task panicked: {}", e),
        }

        if let Err(e) = self.db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("✅ Database connection closed");
        }

        info!("👋 MediCare accounts service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the server is still running.
    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Create the configured admin account if no users exist yet.
///
/// Returns whether an account was created.
pub async fn create_default_admin<R: UserRepositoryInterface>(
    service: &UserService<R>,
    app_cfg: &AppConfig,
) -> DomainResult<bool> {
    if service.count_users().await? > 0 {
        return Ok(false);
    }

    info!("Creating default admin user...");
    let admin = service
        .create_user(CreateUserDto {
            username: app_cfg.admin.username.clone(),
            email: app_cfg.admin.email.clone(),
            password: app_cfg.admin.password.clone(),
            role: UserRole::Admin,
            is_verified: true,
            ..CreateUserDto::default()
        })
        .await?;

    info!("Default admin created: {}", admin.username);
    info!("⚠️  Please change the admin password immediately!");
    Ok(true)
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
/// `RUST_LOG` takes precedence over `logging.level`.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
