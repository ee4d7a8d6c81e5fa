use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{Battery, DayResult, Schedule, SimulationRun};
use crate::optimizer::{OptimizerError, Scheduler};
use crate::prices::{PriceError, PricePair, PriceSource};

use super::pnl::PnlCalculator;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("end date {end} precedes start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("planning and actual price vectors differ in length on {date}: {planning} vs {actual}")]
    MismatchedPrices {
        date: NaiveDate,
        planning: usize,
        actual: usize,
    },
    #[error("price data failed on {date}")]
    Price {
        date: NaiveDate,
        #[source]
        source: PriceError,
    },
    #[error("optimization failed on {date}")]
    Optimization {
        date: NaiveDate,
        #[source]
        source: OptimizerError,
    },
}

/// Drives the daily plan → apply → account loop over a calendar window.
///
/// Days run strictly in order because each one mutates the shared battery:
/// the plan is produced from a snapshot, applied row by row to the real
/// state, and accounted against realized prices. Whatever SOC the day ends
/// on is carried into the next day unchanged.
pub struct MarketSimulator<P> {
    start_date: NaiveDate,
    end_date: NaiveDate,
    battery: Battery,
    price_source: P,
    scheduler: Scheduler,
    pnl_calculator: PnlCalculator,
}

impl<P: PriceSource> MarketSimulator<P> {
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        battery: Battery,
        price_source: P,
        scheduler: Scheduler,
        pnl_calculator: PnlCalculator,
    ) -> Result<Self, SimulationError> {
        if end_date < start_date {
            return Err(SimulationError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
            battery,
            price_source,
            scheduler,
            pnl_calculator,
        })
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    /// Run the whole window, aborting on the first failed day.
    pub fn run(&mut self) -> Result<SimulationRun, SimulationError> {
        let mut run = SimulationRun::default();
        let dates: Vec<NaiveDate> = self
            .start_date
            .iter_days()
            .take_while(|date| *date <= self.end_date)
            .collect();
        for date in dates {
            let day = self.run_day(date)?;
            run.total_pnl += day.pnl;
            run.days.push(day);
        }
        info!(
            start = %self.start_date,
            end = %self.end_date,
            total_pnl = run.total_pnl,
            "back-test complete"
        );
        Ok(run)
    }

    fn run_day(&mut self, date: NaiveDate) -> Result<DayResult, SimulationError> {
        let PricePair { planning, actual } = self
            .price_source
            .get_prices(date)
            .map_err(|source| SimulationError::Price { date, source })?;
        if planning.len() != actual.len() {
            return Err(SimulationError::MismatchedPrices {
                date,
                planning: planning.len(),
                actual: actual.len(),
            });
        }

        let snapshot = self.battery.snapshot();
        let schedule = self
            .scheduler
            .create_schedule(&planning, &snapshot)
            .map_err(|source| SimulationError::Optimization { date, source })?;

        self.apply_schedule(&schedule);

        let pnl = self.pnl_calculator.calculate(
            &schedule,
            &actual,
            self.scheduler.timestep_hours(),
            &snapshot,
        );
        debug!(%date, pnl, soc = self.battery.soc(), "daily operation finished");
        Ok(DayResult {
            date,
            schedule,
            pnl,
        })
    }

    /// Apply the plan to the battery in interval order. Each row is a charge
    /// xor a discharge; zero rows are no-ops.
    fn apply_schedule(&mut self, schedule: &Schedule) {
        for row in &schedule.rows {
            if row.charge_mwh > 0.0 {
                self.battery.charge(row.charge_mwh);
            } else if row.discharge_mwh > 0.0 {
                self.battery.discharge(row.discharge_mwh);
            }
        }
    }
}
