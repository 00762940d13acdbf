use axum::{extract::State, response::IntoResponse, Json};

use crate::{services::metrics, AppState};

/// Service liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Observability",
    responses((status = 200, description = "The service is healthy"))
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
    }))
}

/// Prometheus text exposition of the service counters.
pub async fn get_metrics() -> impl IntoResponse {
    metrics::get_metrics()
}
