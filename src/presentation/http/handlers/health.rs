//! Health Check Handlers
//!
//! # Endpoints
//! - `GET /health` - Basic health check
//! - `GET /health/live` - Liveness probe (is the server running?)
//! - `GET /health/ready` - Readiness probe (database and search index)
//! - `GET /metrics` - Prometheus text exposition

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::domain::{Post, Searchable};
use crate::infrastructure::metrics;
use crate::startup::AppState;

static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Pin the uptime origin to process start.
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: ServiceHealth,
    pub search_index: ServiceHealth,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness probe: 200 while the process serves requests.
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}

/// Readiness probe: 503 when the database is unreachable.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let database = check_database(&state).await;
    let search_index = check_search_index(&state);
    let status = determine_overall_status(&database, &search_index);

    let response = ReadinessResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        started_at: SERVER_START_TIME.to_rfc3339(),
        checks: HealthChecks {
            database,
            search_index,
        },
    };

    let status_code = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let idle = state.db.num_idle() as u32;
    let size = state.db.size();
    metrics::update_db_pool_stats(
        idle,
        size.saturating_sub(idle),
        state.settings.database.max_connections,
    );

    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics::gather_metrics(),
    )
}

async fn check_database(state: &AppState) -> ServiceHealth {
    let start = Instant::now();
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => {
            let latency = start.elapsed().as_millis() as u64;
            ServiceHealth {
                status: if latency < 100 {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded
                },
                latency_ms: Some(latency),
                message: None,
            }
        }
        Err(e) => ServiceHealth {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            message: Some(format!("Database connection failed: {}", e)),
        },
    }
}

/// Run a trivial query; the index never errors, so only latency matters.
fn check_search_index(state: &AppState) -> ServiceHealth {
    let start = Instant::now();
    state
        .synchronizer
        .index()
        .query(Post::COLLECTION, "health", 1, 1);
    let latency = start.elapsed().as_millis() as u64;

    ServiceHealth {
        status: if latency < 100 {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        latency_ms: Some(latency),
        message: None,
    }
}

/// The database is critical; a slow search index only degrades.
fn determine_overall_status(db: &ServiceHealth, index: &ServiceHealth) -> HealthStatus {
    if db.status == HealthStatus::Unhealthy {
        return HealthStatus::Unhealthy;
    }
    if db.status == HealthStatus::Degraded || index.status != HealthStatus::Healthy {
        return HealthStatus::Degraded;
    }
    HealthStatus::Healthy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health(status: HealthStatus) -> ServiceHealth {
        ServiceHealth {
            status,
            latency_ms: None,
            message: None,
        }
    }

    #[test]
    fn test_health_status_serialization() {
        let json = serde_json::to_string(&HealthStatus::Healthy).unwrap();
        assert_eq!(json, "\"healthy\"");
    }

    #[test]
    fn test_determine_overall_status() {
        use HealthStatus::*;

        assert_eq!(determine_overall_status(&health(Healthy), &health(Healthy)), Healthy);
        assert_eq!(determine_overall_status(&health(Degraded), &health(Healthy)), Degraded);
        assert_eq!(determine_overall_status(&health(Healthy), &health(Degraded)), Degraded);
        assert_eq!(determine_overall_status(&health(Unhealthy), &health(Healthy)), Unhealthy);
    }
}
