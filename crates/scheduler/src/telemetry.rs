// Logging setup
//
// Console logging through tracing-subscriber. Output goes to stderr so that a
// stdio host bridge keeps stdout as a clean protocol channel.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Configuration for logging
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name recorded on startup
    pub service_name: String,
    /// Whether to enable console logging
    pub enable_console: bool,
    /// Log filter (e.g., "info", "debug", "duewatch_scheduler=debug")
    pub log_filter: Option<String>,
    /// Whether to include module targets in log lines
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "duewatch".to_string(),
            enable_console: true,
            log_filter: None,
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `SERVICE_NAME`: Service name (default: "duewatch")
    /// - `RUST_LOG` or `LOG_LEVEL`: Log filter
    pub fn from_env() -> Self {
        Self {
            service_name: std::env::var("SERVICE_NAME").unwrap_or_else(|_| "duewatch".to_string()),
            enable_console: true,
            log_filter: std::env::var("RUST_LOG")
                .ok()
                .or_else(|| std::env::var("LOG_LEVEL").ok()),
            with_target: true,
        }
    }

    /// The filter directive that will be applied
    pub fn filter_directive(&self) -> String {
        self.log_filter
            .as_deref()
            .filter(|f| EnvFilter::try_new(f).is_ok())
            .unwrap_or("info")
            .to_string()
    }
}

/// Initialize the global subscriber
///
/// Call once, early in `main`. Falls back to `info` when the configured
/// filter does not parse.
pub fn init_telemetry(config: TelemetryConfig) {
    let filter = EnvFilter::new(config.filter_directive());

    let console_layer = if config.enable_console {
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.with_target)
                .with_filter(filter),
        )
    } else {
        None
    };

    tracing_subscriber::registry().with(console_layer).init();

    tracing::debug!(service = %config.service_name, "logging initialized");
}
