//! Booking lifecycle service.
//!
//! Wires the booking store, the lifecycle orchestrator, the NATS broker and
//! the payment event consumer together, and exposes the operational HTTP
//! surface: `/health` and `/metrics`.

pub mod broker;
pub mod config;
pub mod consumer_task;
pub mod routes;
pub mod telemetry;

use axum::Router;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the operational routes.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service_name: String,
    /// `"postgres"` or `"memory"`.
    pub store_kind: &'static str,
    /// `"nats"` or `"none"`.
    pub broker_kind: &'static str,
}

impl AppState {
    pub fn new(
        service_name: impl Into<String>,
        store_kind: &'static str,
        broker_kind: &'static str,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            store_kind,
            broker_kind,
        }
    }
}

/// Creates the Axum router with the health and metrics routes.
pub fn create_app(state: AppState, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
