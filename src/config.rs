use anyhow::{Context, Result};
use chrono::NaiveDate;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::prices::SimulatedPriceConfig;

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub battery: BatteryConfig,

    #[serde(default)]
    #[validate(nested)]
    pub optimization: OptimizationConfig,

    #[serde(default)]
    #[validate(nested)]
    pub prices: PricesConfig,

    #[validate(nested)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Battery asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_battery_config"))]
pub struct BatteryConfig {
    #[validate(range(min = 0.001, max = 10000.0))]
    pub capacity_mwh: f64,

    #[serde(default = "default_efficiency")]
    #[validate(range(min = 0.5, max = 1.0))]
    pub charge_efficiency: f64,

    #[serde(default = "default_efficiency")]
    #[validate(range(min = 0.5, max = 1.0))]
    pub discharge_efficiency: f64,

    #[serde(default = "default_initial_soc")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub initial_soc: f64,

    #[serde(default = "default_initial_soh")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub initial_soh: f64,

    /// Defaults to one full capacity per hour when unset.
    #[serde(default)]
    pub max_charge_rate_mw: Option<f64>,

    #[serde(default)]
    pub max_discharge_rate_mw: Option<f64>,

    #[serde(default = "default_temperature_c")]
    #[validate(range(min = -40.0, max = 60.0))]
    pub temperature_c: f64,
}

fn validate_battery_config(config: &BatteryConfig) -> Result<(), validator::ValidationError> {
    for rate in [config.max_charge_rate_mw, config.max_discharge_rate_mw]
        .into_iter()
        .flatten()
    {
        if rate <= 0.0 {
            return Err(validator::ValidationError::new(
                "power rates must be positive when set",
            ));
        }
    }
    Ok(())
}

/// Planner configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_optimization_config"))]
pub struct OptimizationConfig {
    #[serde(default = "default_horizon_intervals")]
    pub horizon_intervals: usize,

    #[serde(default = "default_timestep_hours")]
    #[validate(range(min = 0.05, max = 24.0))]
    pub timestep_hours: f64,

    #[serde(default = "default_soc_min")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub soc_min: f64,

    #[serde(default = "default_soc_max")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub soc_max: f64,

    #[serde(default = "default_max_cycles")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub max_cycles: f64,

    #[serde(default = "default_solver_timeout_secs")]
    pub solver_timeout_secs: u64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            horizon_intervals: default_horizon_intervals(),
            timestep_hours: default_timestep_hours(),
            soc_min: default_soc_min(),
            soc_max: default_soc_max(),
            max_cycles: default_max_cycles(),
            solver_timeout_secs: default_solver_timeout_secs(),
        }
    }
}

fn validate_optimization_config(
    config: &OptimizationConfig,
) -> Result<(), validator::ValidationError> {
    if config.soc_min >= config.soc_max {
        return Err(validator::ValidationError::new(
            "soc_min must be less than soc_max",
        ));
    }
    if !(1..=288).contains(&config.horizon_intervals) {
        return Err(validator::ValidationError::new(
            "horizon_intervals must be between 1 and 288",
        ));
    }
    Ok(())
}

/// Which price feed drives the back-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PriceSourceKind {
    Simulated,
    HistoricalAverage,
    Forecast,
}

/// Price feed configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_prices_config"))]
pub struct PricesConfig {
    #[serde(default = "default_price_source")]
    pub source: PriceSourceKind,

    /// Dataset path; required for the historical and forecast sources.
    #[serde(default)]
    pub csv_path: Option<PathBuf>,

    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,

    #[serde(default = "default_price_column")]
    pub price_column: String,

    #[serde(default = "default_lookback_days")]
    #[validate(range(min = 1, max = 60))]
    pub lookback_days: u32,

    #[serde(default)]
    pub simulated: SimulatedPriceConfig,
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            source: default_price_source(),
            csv_path: None,
            timestamp_column: default_timestamp_column(),
            price_column: default_price_column(),
            lookback_days: default_lookback_days(),
            simulated: SimulatedPriceConfig::default(),
        }
    }
}

fn validate_prices_config(config: &PricesConfig) -> Result<(), validator::ValidationError> {
    let simulated = &config.simulated;
    if simulated.max_price <= simulated.min_price {
        return Err(validator::ValidationError::new(
            "simulated.max_price must exceed simulated.min_price",
        ));
    }
    if simulated.noise_level < 0.0 {
        return Err(validator::ValidationError::new(
            "simulated.noise_level must be non-negative",
        ));
    }
    if !(0.0..=1.0).contains(&simulated.spike_chance) {
        return Err(validator::ValidationError::new(
            "simulated.spike_chance must be a probability",
        ));
    }
    Ok(())
}

/// Back-test window configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_simulation_config"))]
pub struct SimulationConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// When set, the full run log is written here as JSON.
    #[serde(default)]
    pub report_path: Option<PathBuf>,
}

fn validate_simulation_config(
    config: &SimulationConfig,
) -> Result<(), validator::ValidationError> {
    if config.end_date < config.start_date {
        return Err(validator::ValidationError::new(
            "end_date must not precede start_date",
        ));
    }
    Ok(())
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

// Default value functions
fn default_efficiency() -> f64 { 0.9 }
fn default_initial_soc() -> f64 { 0.5 }
fn default_initial_soh() -> f64 { 1.0 }
fn default_temperature_c() -> f64 { 25.0 }
fn default_horizon_intervals() -> usize { 24 }
fn default_timestep_hours() -> f64 { 1.0 }
fn default_soc_min() -> f64 { 0.05 }
fn default_soc_max() -> f64 { 0.95 }
fn default_max_cycles() -> f64 { 5.0 }
fn default_solver_timeout_secs() -> u64 { 30 }
fn default_price_source() -> PriceSourceKind { PriceSourceKind::Simulated }
fn default_timestamp_column() -> String { "utc_timestamp".to_owned() }
fn default_price_column() -> String { "GB_GBN_price_day_ahead".to_owned() }
fn default_lookback_days() -> u32 { 7 }
fn default_log_level() -> String { "info".to_owned() }

impl AppConfig {
    /// Load configuration from `config/default.toml`, overridden by
    /// `ARB__`-prefixed environment variables (`ARB__BATTERY__CAPACITY_MWH`
    /// maps to `battery.capacity_mwh`).
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("ARB__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .context("failed to parse configuration")?;
        config
            .validate()
            .context("configuration validation failed")?;
        Ok(config)
    }
}
