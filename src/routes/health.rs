//! Health check endpoint for container orchestration.
//!
//! Reports the database connection state as a readiness verdict: 200 when
//! connected, 503 otherwise. The raw driver ready-state code is included so
//! operators can tell "connecting" from "disconnected".

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Health verdict derived from a readable connection state
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub database: &'static str,
    pub mongodb_state: u8,
    pub timestamp: String,
}

/// Body returned when the connection state itself cannot be read
#[derive(Debug, Serialize)]
pub struct HealthFailure {
    pub status: &'static str,
    pub error: String,
}

/// UTC timestamp with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Health check handler.
pub async fn health(State(state): State<AppState>) -> Response {
    match state.connection.probe() {
        Ok(db_state) => {
            let connected = db_state.is_connected();
            let report = HealthReport {
                status: if connected { "healthy" } else { "unhealthy" },
                database: if connected { "connected" } else { "disconnected" },
                mongodb_state: db_state.code(),
                timestamp: timestamp(),
            };
            let status = if connected {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            (status, Json(report)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read connection state");
            let body = HealthFailure {
                status: "unhealthy",
                error: e.to_string(),
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}
