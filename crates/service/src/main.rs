//! Booking service entry point.

use std::sync::Arc;

use booking_store::{BookingStore, InMemoryBookingStore, PostgresBookingStore};
use bytes::Bytes;
use futures_util::stream::BoxStream;
use lifecycle::{BookingService, EventPublisher, LoggingEventPublisher};
use metrics_exporter_prometheus::PrometheusHandle;
use service::broker::{self, NatsEventPublisher};
use service::config::Config;
use service::consumer_task::spawn_payment_consumer;
use service::{AppState, create_app, telemetry};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Picks the publisher and payment source, then serves until shutdown.
async fn run<S: BookingStore + 'static>(
    config: Config,
    store: S,
    store_kind: &'static str,
    metrics_handle: PrometheusHandle,
) {
    match config.nats_url.clone() {
        Some(url) => {
            let client = broker::connect(&url, &config.service_name)
                .await
                .expect("failed to connect to NATS");
            let payments = broker::subscribe_payment_events(
                &client,
                &config.payment_events_topic,
                &config.consumer_group,
            )
            .await
            .expect("failed to subscribe to payment events");

            let publisher = NatsEventPublisher::new(client);
            let service = Arc::new(
                BookingService::new(store, publisher.clone())
                    .with_settings(config.lifecycle_settings()),
            );
            let state = AppState::new(&config.service_name, store_kind, "nats");
            serve(&config, service, Some(payments), state, metrics_handle).await;

            if let Err(e) = publisher.flush().await {
                tracing::warn!(error = %e, "failed to flush pending booking events");
            }
        }
        None => {
            tracing::warn!(
                "NATS_URL not set, booking events are only logged and payment events are not consumed"
            );
            let service = Arc::new(
                BookingService::new(store, LoggingEventPublisher)
                    .with_settings(config.lifecycle_settings()),
            );
            let state = AppState::new(&config.service_name, store_kind, "none");
            serve(&config, service, None, state, metrics_handle).await;
        }
    }
}

async fn serve<S, P>(
    config: &Config,
    service: Arc<BookingService<S, P>>,
    payments: Option<BoxStream<'static, Bytes>>,
    state: AppState,
    metrics_handle: PrometheusHandle,
) where
    S: BookingStore + 'static,
    P: EventPublisher + 'static,
{
    let shutdown = CancellationToken::new();
    let consumer = payments
        .map(|messages| spawn_payment_consumer(service, messages, shutdown.clone()));

    let app = create_app(state.clone(), metrics_handle);

    let addr = config.addr();
    tracing::info!(
        %addr,
        store = state.store_kind,
        broker = state.broker_kind,
        "starting booking service"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    shutdown.cancel();
    if let Some(handle) = consumer {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "payment consumer task failed");
        }
    }

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Tracing
    telemetry::init_tracing(&config);

    // 2. Prometheus recorder
    let metrics_handle = telemetry::install_metrics().expect("failed to install Prometheus recorder");

    // 3. Store, then serve
    match config.database_url.clone() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await
                .expect("failed to connect to PostgreSQL");
            let store = PostgresBookingStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            run(config, store, "postgres", metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, bookings are kept in memory");
            run(config, InMemoryBookingStore::new(), "memory", metrics_handle).await;
        }
    }
}
