use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{ApiResponse, AppState, HealthResponse};

/// `GET /api/health`
///
/// Readiness check. Answers 503 while the database does not respond.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let db_ready = match state.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database ping failed");
            false
        }
    };

    let status = if db_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::success(HealthResponse {
            status: if db_ready { "ok" } else { "degraded" }.to_string(),
            database: if db_ready { "up" } else { "down" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
        })),
    )
        .into_response()
}
