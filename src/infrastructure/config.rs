// Configuration loading
use serde::Deserialize;

use crate::domain::charge_estimator::DEFAULT_RATE_WINDOW_POINTS;

/// Where the daemon keeps the durable credential pair.
pub const TOKENS_PATH: &str = "config/tokens.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiSettings,
    pub vehicle: VehicleSettings,
    #[serde(default)]
    pub estimator: EstimatorSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VehicleSettings {
    pub car_id: String,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EstimatorSettings {
    #[serde(default = "default_rate_window_points")]
    pub rate_window_points: usize,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            rate_window_points: default_rate_window_points(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_scan_interval_secs() -> u64 {
    60
}

fn default_rate_window_points() -> usize {
    DEFAULT_RATE_WINDOW_POINTS
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/vehicle"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
