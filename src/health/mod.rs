/*!
 * # Health Check Module
 *
 * - `GET /health` pings the database and reports per-component status.
 * - `GET /api/status` reports build metadata and uptime.
 */

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::AppState;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Records process start; later calls are no-ops.
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn uptime_seconds() -> u64 {
    START_TIME.get_or_init(Instant::now).elapsed().as_secs()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct HealthChecks {
    pub database: HealthStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: HealthChecks,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub name: String,
    pub version: String,
    pub environment: String,
    pub status: HealthStatus,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

/// Pings the database; always answers 200 so load balancers read the body.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service health", body = HealthReport))
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let database = match crate::db::check_connection(&state.db).await {
        Ok(()) => HealthStatus::Up,
        Err(e) => {
            error!(error = %e, "database health check failed");
            HealthStatus::Down
        }
    };
    debug!(?database, "health check");

    (
        StatusCode::OK,
        Json(HealthReport {
            status: database,
            checks: HealthChecks { database },
            timestamp: Utc::now(),
        }),
    )
}

#[utoipa::path(
    get,
    path = "/api/status",
    tag = "health",
    responses((status = 200, description = "Build and runtime metadata", body = StatusReport))
)]
pub async fn api_status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(StatusReport {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        status: HealthStatus::Up,
        uptime_seconds: uptime_seconds(),
        timestamp: Utc::now(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/status", get(api_status))
}
