//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub store: &'static str,
    pub broker: &'static str,
}

/// GET /health returns service health status.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: state.service_name.clone(),
        store: state.store_kind,
        broker: state.broker_kind,
    })
}
