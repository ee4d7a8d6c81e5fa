use std::fs::File;

use anyhow::{Context, Result};
use energy_arbitrage::backtest::{MarketSimulator, PnlCalculator};
use energy_arbitrage::config::{AppConfig, PriceSourceKind};
use energy_arbitrage::domain::{Battery, BatteryParams};
use energy_arbitrage::optimizer::{OptimizerOptions, Scheduler};
use energy_arbitrage::prices::{
    ForecastPriceModel, HistoricalAveragePriceModel, PriceModel, PriceSeries,
    SeasonalNaiveForecaster, SimulatedPriceModel,
};
use energy_arbitrage::telemetry;
use tracing::{debug, info};

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    telemetry::init_tracing(&config.telemetry);
    info!(
        start = %config.simulation.start_date,
        end = %config.simulation.end_date,
        source = %config.prices.source,
        "starting arbitrage back-test"
    );

    let battery = Battery::new(battery_params(&config))?;
    let price_model = build_price_model(&config)?;
    let scheduler = Scheduler::new(optimizer_options(&config));
    let mut simulator = MarketSimulator::new(
        config.simulation.start_date,
        config.simulation.end_date,
        battery,
        price_model,
        scheduler,
        PnlCalculator,
    )?;

    let run = simulator.run()?;
    for day in &run.days {
        info!(date = %day.date, pnl = day.pnl, "daily result");
        debug!("schedule for {}:\n{}", day.date, day.schedule);
    }
    info!(
        days = run.days.len(),
        total_pnl = run.total_pnl,
        final_soc = simulator.battery().soc(),
        soh = simulator.battery().soh(),
        cycles = simulator.battery().cycle_count(),
        "run finished"
    );

    if let Some(path) = &config.simulation.report_path {
        let file = File::create(path)
            .with_context(|| format!("failed to create report file {}", path.display()))?;
        serde_json::to_writer_pretty(file, &run).context("failed to write the run log")?;
        info!(path = %path.display(), "run log written");
    }
    Ok(())
}

fn battery_params(config: &AppConfig) -> BatteryParams {
    BatteryParams {
        capacity_mwh: config.battery.capacity_mwh,
        charge_efficiency: config.battery.charge_efficiency,
        discharge_efficiency: config.battery.discharge_efficiency,
        max_charge_rate_mw: config.battery.max_charge_rate_mw,
        max_discharge_rate_mw: config.battery.max_discharge_rate_mw,
        initial_soc: config.battery.initial_soc,
        initial_soh: config.battery.initial_soh,
        temperature_c: config.battery.temperature_c,
        duration_hours: config.optimization.timestep_hours,
    }
}

fn optimizer_options(config: &AppConfig) -> OptimizerOptions {
    OptimizerOptions {
        timestep_hours: config.optimization.timestep_hours,
        soc_min: config.optimization.soc_min,
        soc_max: config.optimization.soc_max,
        max_cycles: config.optimization.max_cycles,
        solver_timeout_secs: config.optimization.solver_timeout_secs,
    }
}

fn build_price_model(config: &AppConfig) -> Result<PriceModel> {
    let horizon = config.optimization.horizon_intervals;
    match config.prices.source {
        PriceSourceKind::Simulated => Ok(PriceModel::Simulated(SimulatedPriceModel::new(
            config.prices.simulated.clone(),
            horizon,
        ))),
        PriceSourceKind::HistoricalAverage => {
            Ok(PriceModel::HistoricalAverage(HistoricalAveragePriceModel::new(
                load_series(config)?,
                horizon,
                config.optimization.timestep_hours,
                config.prices.lookback_days,
            )))
        }
        PriceSourceKind::Forecast => Ok(PriceModel::Forecast(ForecastPriceModel::new(
            load_series(config)?,
            Box::new(SeasonalNaiveForecaster),
            horizon,
            config.prices.lookback_days,
        ))),
    }
}

fn load_series(config: &AppConfig) -> Result<PriceSeries> {
    let path = config.prices.csv_path.as_deref().with_context(|| {
        format!(
            "prices.csv_path is required for the {} source",
            config.prices.source
        )
    })?;
    Ok(PriceSeries::from_csv(
        path,
        &config.prices.timestamp_column,
        &config.prices.price_column,
    )?)
}
