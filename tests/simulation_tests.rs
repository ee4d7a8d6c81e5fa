//! End-to-end scenarios for the rolling simulator: plan, apply, account,
//! carry battery state across days.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use energy_arbitrage::backtest::{MarketSimulator, PnlCalculator, SimulationError};
use energy_arbitrage::domain::{Battery, BatteryParams};
use energy_arbitrage::optimizer::{OptimizerOptions, Scheduler};
use energy_arbitrage::prices::{
    HistoricalAveragePriceModel, PriceError, PricePair, PriceSeries, PriceSource,
    SimulatedPriceConfig, SimulatedPriceModel,
};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 2, day).unwrap()
}

fn battery() -> Battery {
    Battery::new(BatteryParams::default()).unwrap()
}

fn simulated_simulator(start: NaiveDate, end: NaiveDate) -> MarketSimulator<SimulatedPriceModel> {
    MarketSimulator::new(
        start,
        end,
        battery(),
        SimulatedPriceModel::new(SimulatedPriceConfig::default(), 24),
        Scheduler::new(OptimizerOptions::default()),
        PnlCalculator,
    )
    .unwrap()
}

struct FixedPrices(Vec<f64>);

impl PriceSource for FixedPrices {
    fn get_prices(&self, _date: NaiveDate) -> Result<PricePair, PriceError> {
        Ok(PricePair {
            planning: self.0.clone(),
            actual: self.0.clone(),
        })
    }
}

#[test]
fn five_day_simulated_run_is_reproducible() {
    let first = simulated_simulator(date(1), date(5)).run().unwrap();
    let second = simulated_simulator(date(1), date(5)).run().unwrap();

    assert_eq!(first.days.len(), 5);
    assert_eq!(second.days.len(), 5);
    for (a, b) in first.days.iter().zip(&second.days) {
        assert_eq!(a.date, b.date);
        assert_eq!(a.pnl.to_bits(), b.pnl.to_bits());
        assert_eq!(a.schedule, b.schedule);
    }
    assert_eq!(first.total_pnl.to_bits(), second.total_pnl.to_bits());
}

#[test]
fn total_pnl_is_the_sum_of_daily_results() {
    let run = simulated_simulator(date(1), date(5)).run().unwrap();
    let daily_sum: f64 = run.days.iter().map(|day| day.pnl).sum();
    assert_relative_eq!(run.total_pnl, daily_sum, epsilon = 1e-9);
}

#[test]
fn battery_state_stays_physical_across_a_run() {
    let mut simulator = simulated_simulator(date(1), date(10));
    simulator.run().unwrap();

    let battery = simulator.battery();
    assert!((0.0..=1.0).contains(&battery.soc()));
    assert!((0.0..=1.0).contains(&battery.soh()));
    // Positive prices guarantee at least one discharge, so the battery aged.
    assert!(battery.soh() < 1.0);
    assert!(battery.cycle_count() > 0.0);
    assert!(battery.energy_cycled_mwh() > 0.0);
}

#[test]
fn fixed_two_step_prices_drain_the_battery_across_days() {
    // Day one liquidates and fully discharges the final interval, leaving
    // the battery empty; day two plans from the floor and can only use the
    // final interval again.
    let mut simulator = MarketSimulator::new(
        date(1),
        date(2),
        battery(),
        FixedPrices(vec![20.0, 30.0]),
        Scheduler::new(OptimizerOptions::default()),
        PnlCalculator,
    )
    .unwrap();

    let run = simulator.run().unwrap();
    assert_eq!(run.days.len(), 2);
    assert_relative_eq!(run.days[0].pnl, 34.29, epsilon = 1e-6);
    assert_relative_eq!(run.days[1].pnl, 27.0, epsilon = 1e-6);
    assert_relative_eq!(run.total_pnl, 61.29, epsilon = 1e-6);
    assert_relative_eq!(simulator.battery().soc(), 0.0, epsilon = 1e-9);
}

#[test]
fn schedules_in_the_run_log_respect_planning_bounds() {
    let run = simulated_simulator(date(1), date(3)).run().unwrap();
    for day in &run.days {
        for row in &day.schedule.rows {
            assert!((0.0..=1.0).contains(&row.charge_mwh));
            assert!((0.0..=1.0).contains(&row.discharge_mwh));
            assert!((0.05..=0.95).contains(&row.soc));
        }
    }
}

#[test]
fn historical_source_drives_a_run_end_to_end() {
    let mut points = Vec::new();
    for day in 1..=10 {
        for hour in 0..24 {
            let timestamp = NaiveDate::from_ymd_opt(2015, 2, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap()
                .and_utc();
            points.push((timestamp, 50.0));
        }
    }
    let model = HistoricalAveragePriceModel::new(PriceSeries::new(points), 24, 1.0, 7);

    let mut simulator = MarketSimulator::new(
        date(8),
        date(9),
        battery(),
        model,
        Scheduler::new(OptimizerOptions::default()),
        PnlCalculator,
    )
    .unwrap();

    let run = simulator.run().unwrap();
    assert_eq!(run.days.len(), 2);
    assert!(run.total_pnl.is_finite());
    // Flat positive prices: inventory is liquidated, never bought.
    assert!(run.total_pnl > 0.0);
    for day in &run.days {
        assert_relative_eq!(day.schedule.total_charge_mwh(), 0.0, epsilon = 1e-6);
    }
}

#[test]
fn missing_price_data_aborts_the_run() {
    let mut points = Vec::new();
    for day in 1..=8 {
        for hour in 0..24 {
            let timestamp = NaiveDate::from_ymd_opt(2015, 2, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap()
                .and_utc();
            points.push((timestamp, 50.0));
        }
    }
    let model = HistoricalAveragePriceModel::new(PriceSeries::new(points), 24, 1.0, 7);

    // Day 9 has no recorded prices, so the second day fails.
    let mut simulator = MarketSimulator::new(
        date(8),
        date(9),
        battery(),
        model,
        Scheduler::new(OptimizerOptions::default()),
        PnlCalculator,
    )
    .unwrap();

    match simulator.run() {
        Err(SimulationError::Price { date: failed, .. }) => assert_eq!(failed, date(9)),
        other => panic!("expected a price error, got {:?}", other.map(|run| run.days.len())),
    }
}
