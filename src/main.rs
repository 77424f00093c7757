// Main entry point - Dependency injection and the polling loop
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use vehicle_telemetry::application::poll_service::PollService;
use vehicle_telemetry::domain::charge_estimator::ChargeEstimator;
use vehicle_telemetry::infrastructure::api_client::{ReqwestTransport, VehicleApiClient};
use vehicle_telemetry::infrastructure::config::{TOKENS_PATH, load_app_config};
use vehicle_telemetry::infrastructure::token_store::FileTokenStore;
use vehicle_telemetry::presentation::summary::cycle_summary;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration and the last known credential pair
    let config = load_app_config()?;
    let store = FileTokenStore::new(TOKENS_PATH);
    let credentials = store
        .load()
        .context("no stored credentials; run the `link` tool first")?;

    // Build the transport (infrastructure layer)
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.api.request_timeout_secs))
        .build()?;
    let transport = Arc::new(ReqwestTransport::new(http, config.api.base_url.clone()));
    let client = VehicleApiClient::new(transport, config.vehicle.car_id.clone(), credentials);

    // Assemble the poll service (application layer)
    let estimator = ChargeEstimator::new(config.estimator.rate_window_points);
    let mut service = PollService::new(Box::new(client), Box::new(store), estimator);

    println!(
        "Starting vehicle-telemetry poller for {} (every {}s)",
        config.vehicle.car_id, config.vehicle.scan_interval_secs
    );

    // The scheduler: one cycle per tick, never overlapping. Retryable
    // failures wait for the next natural tick; the rest halt the daemon.
    let mut ticker =
        tokio::time::interval(Duration::from_secs(config.vehicle.scan_interval_secs));
    loop {
        ticker.tick().await;
        match service.poll_once().await {
            Ok(result) => tracing::info!("{}", cycle_summary(&result)),
            Err(err) if err.is_retryable() => {
                tracing::warn!("poll cycle failed: {err}; retrying next interval");
            }
            Err(err) => {
                return Err(err).context(
                    "polling halted; re-link the vehicle with the `link` tool",
                );
            }
        }
    }
}
