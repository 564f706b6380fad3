//! Service configuration loaded from environment variables.

use lifecycle::LifecycleSettings;

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL URL; the in-memory store is used when unset
/// - `NATS_URL`: broker URL; without it events are only logged and no
///   payment events are consumed
/// - `SERVICE_NAME`: envelope source (default: `"service-booking"`)
/// - `BOOKING_EVENTS_TOPIC` (default: `"booking.events"`)
/// - `PAYMENT_EVENTS_TOPIC` (default: `"payment.events"`)
/// - `CONSUMER_GROUP` (default: `"booking-service"`)
/// - `DEFAULT_CURRENCY` (default: `"MYR"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub service_name: String,
    pub booking_events_topic: String,
    pub payment_events_topic: String,
    pub consumer_group: String,
    pub default_currency: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str, default: String| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        };

        Self {
            host: var("HOST", defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG", defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            nats_url: lookup("NATS_URL").filter(|v| !v.trim().is_empty()),
            service_name: var("SERVICE_NAME", defaults.service_name),
            booking_events_topic: var("BOOKING_EVENTS_TOPIC", defaults.booking_events_topic),
            payment_events_topic: var("PAYMENT_EVENTS_TOPIC", defaults.payment_events_topic),
            consumer_group: var("CONSUMER_GROUP", defaults.consumer_group),
            default_currency: var("DEFAULT_CURRENCY", defaults.default_currency),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings handed to the booking service.
    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            source: self.service_name.clone(),
            booking_events_topic: self.booking_events_topic.clone(),
            currency: self.default_currency.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let lifecycle = LifecycleSettings::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            nats_url: None,
            service_name: lifecycle.source,
            booking_events_topic: lifecycle.booking_events_topic,
            payment_events_topic: lifecycle::topics::PAYMENT_EVENTS_TOPIC.to_string(),
            consumer_group: "booking-service".to_string(),
            default_currency: lifecycle.currency,
        }
    }
}
