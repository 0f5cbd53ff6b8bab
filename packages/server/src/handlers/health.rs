use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use crate::models::health::HealthResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/health/liveness/",
    tag = "Health",
    operation_id = "liveness",
    summary = "Liveness probe",
    description = "Always succeeds while the process is serving requests.",
    responses((status = 200, description = "Process is alive", body = HealthResponse)),
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse { status: "alive" })
}

#[utoipa::path(
    get,
    path = "/health/readiness/",
    tag = "Health",
    operation_id = "readiness",
    summary = "Readiness probe",
    description = "Succeeds when the database answers a ping.",
    responses(
        (status = 200, description = "Ready to serve traffic", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse),
    ),
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ready" })),
        Err(e) => {
            warn!("Readiness check failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "not ready",
                }),
            )
        }
    }
}
