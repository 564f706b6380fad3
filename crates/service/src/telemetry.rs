//! Tracing and metrics setup for the binary.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{Config, LogFormat};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when it parses.
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Installs the Prometheus recorder and registers metric descriptions.
pub fn install_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(handle)
}

fn describe_metrics() {
    metrics::describe_counter!(
        "booking_transitions_total",
        "Committed booking transitions, by transition"
    );
    metrics::describe_counter!(
        "booking_version_conflicts_total",
        "Updates rejected because the booking changed underneath"
    );
    metrics::describe_counter!(
        "booking_events_published_total",
        "Booking events handed to the broker"
    );
    metrics::describe_counter!(
        "booking_event_publish_failures_total",
        "Booking events that failed to publish after commit"
    );
    metrics::describe_counter!(
        "payment_events_received_total",
        "Messages read from the payment topic"
    );
    metrics::describe_counter!(
        "payment_events_dropped_total",
        "Payment messages dropped as malformed, by reason"
    );
    metrics::describe_histogram!(
        "booking_transition_duration_seconds",
        metrics::Unit::Seconds,
        "Time spent loading, transitioning and committing a booking"
    );
}
