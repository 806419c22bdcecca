//! Health check handler

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

/// Health check state
#[derive(Clone)]
pub struct HealthState {
    pub db: DatabaseConnection,
    pub started_at: Arc<Instant>,
}

/// Service health response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: ComponentHealth,
}

/// Component health status
#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
}

async fn ping_database(db: &DatabaseConnection) -> ComponentHealth {
    let started = Instant::now();
    let ping = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());

    match db.execute(ping).await {
        Ok(_) => ComponentHealth {
            status: "ok".to_string(),
            latency_ms: Some(started.elapsed().as_millis() as u64),
        },
        Err(e) => {
            warn!("Database health check failed: {}", e);
            ComponentHealth {
                status: "error".to_string(),
                latency_ms: None,
            }
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is degraded", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = ping_database(&state.db).await;

    let (status, http_status) = if database.status == "ok" {
        ("ok", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        http_status,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            database,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::{init_database, DatabaseConfig};

    #[tokio::test]
    async fn reports_ok_with_a_live_database() {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        let state = HealthState {
            db,
            started_at: Arc::new(Instant::now()),
        };

        let (status, Json(body)) = health_check(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert!(body.database.latency_ms.is_some());
    }

    #[tokio::test]
    async fn reports_degraded_after_the_pool_is_closed() {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        let state = HealthState {
            db: db.clone(),
            started_at: Arc::new(Instant::now()),
        };
        db.close().await.unwrap();

        let (status, Json(body)) = health_check(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.database.status, "error");
    }
}
