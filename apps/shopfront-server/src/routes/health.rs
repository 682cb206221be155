//! Health check for monitoring and load balancers.
//!
//! `GET /api/health` answers `200` while the database accepts queries and
//! `503` otherwise.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: bool,
    pub active_sessions: usize,
    pub server_time: String,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let database = state.db.health_check().await;
    let (code, status) = if database {
        (StatusCode::OK, "serving")
    } else {
        warn!("Health check failed: database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, "not_serving")
    };

    (
        code,
        Json(HealthStatus {
            status,
            database,
            active_sessions: state.sessions.len(),
            server_time: Utc::now().to_rfc3339(),
        }),
    )
}
