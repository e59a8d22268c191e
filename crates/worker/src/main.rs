use anyhow::{Context, Result};
use duewatch_scheduler::telemetry::{init_telemetry, TelemetryConfig};
use duewatch_scheduler::{NotificationService, SchedulerConfig};
use duewatch_worker::BridgeWorker;
use tokio::io::BufReader;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Configure via environment variables:
    // - SERVICE_NAME: Service name (default: "duewatch-worker")
    // - RUST_LOG or LOG_LEVEL: Log filter (default: "duewatch=info")
    let mut telemetry_config = TelemetryConfig::from_env();
    if telemetry_config.service_name == "duewatch" {
        telemetry_config.service_name = "duewatch-worker".to_string();
    }
    if telemetry_config.log_filter.is_none() {
        telemetry_config.log_filter =
            Some("duewatch_worker=info,duewatch_scheduler=info".to_string());
    }
    init_telemetry(telemetry_config);

    tracing::info!("duewatch-worker starting...");

    let config = SchedulerConfig::from_env().context("Invalid scheduler configuration")?;
    let store = NotificationService::store_for(&config).context("Failed to create event store")?;

    tracing::info!(
        window_secs = config.window.as_secs(),
        cadence_secs = config.cadence.as_secs(),
        wake_tag = %config.wake_tag,
        past_due = %config.past_due,
        persistent = config.database_url.is_some(),
        "Starting bridge"
    );

    let worker = BridgeWorker::new(store, config);
    let trigger = worker.shutdown_trigger();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal");
            trigger.trigger();
        }
    });

    let mut stdout = tokio::io::stdout();
    let summary = worker
        .run(BufReader::new(tokio::io::stdin()), &mut stdout)
        .await
        .context("Host bridge failed")?;

    tracing::info!(
        messages = summary.messages,
        passes = summary.passes,
        "Worker shutdown complete"
    );
    Ok(())
}
