use std::time::Instant;

use good_lp::{default_solver, ResolutionError, Solution, SolverModel};
use tracing::{debug, warn};

use crate::domain::{BatterySnapshot, Schedule, ScheduleRow};

use super::model::{build_problem, DispatchProblem, OptimizerOptions};
use super::OptimizerError;

/// Builds and solves the dispatch LP for one day at a time.
#[derive(Debug, Clone)]
pub struct Scheduler {
    options: OptimizerOptions,
}

impl Scheduler {
    pub fn new(options: OptimizerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &OptimizerOptions {
        &self.options
    }

    pub fn timestep_hours(&self) -> f64 {
        self.options.timestep_hours
    }

    /// Produce the optimal `(charge, discharge, soc)` plan for the given
    /// planning prices and battery snapshot.
    ///
    /// Any termination other than optimal is fatal for the day and surfaces
    /// as [`OptimizerError::Failed`] with the solver's status and condition.
    pub fn create_schedule(
        &self,
        prices: &[f64],
        battery: &BatterySnapshot,
    ) -> Result<Schedule, OptimizerError> {
        if prices.is_empty() {
            return Err(OptimizerError::EmptyHorizon);
        }
        if let Some(position) = prices.iter().position(|price| !price.is_finite()) {
            return Err(OptimizerError::NonFinitePrice(position));
        }

        let num_intervals = prices.len();
        let DispatchProblem {
            vars,
            charge,
            discharge,
            soc,
            objective,
            constraints,
            ..
        } = build_problem(prices, battery, &self.options);

        let started = Instant::now();
        let mut model = vars.maximise(objective).using(default_solver);
        for constraint in constraints {
            model = model.with(constraint);
        }

        let solution = model.solve().map_err(|error| {
            let (status, condition) = match &error {
                ResolutionError::Infeasible => ("warning", "infeasible".to_owned()),
                ResolutionError::Unbounded => ("warning", "unbounded".to_owned()),
                other => ("error", other.to_string()),
            };
            warn!(status, condition = %condition, "solver returned a non-optimal status");
            OptimizerError::Failed {
                status: status.to_owned(),
                condition,
            }
        })?;

        let elapsed = started.elapsed();
        if self.options.solver_timeout_secs > 0
            && elapsed.as_secs() >= self.options.solver_timeout_secs
        {
            return Err(OptimizerError::Failed {
                status: "timeout".to_owned(),
                condition: format!(
                    "solve took {:.1}s against a budget of {}s",
                    elapsed.as_secs_f64(),
                    self.options.solver_timeout_secs
                ),
            });
        }
        debug!(intervals = num_intervals, elapsed_ms = elapsed.as_millis() as u64, "schedule solved");

        // Solver tolerance can leave tiny negatives or hair-width bound
        // overshoots; clamp before the values become physical commands.
        let capacity = battery.capacity_mwh;
        let rows = (0..num_intervals)
            .map(|t| ScheduleRow {
                interval: t,
                charge_mwh: solution.value(charge[t]).clamp(0.0, capacity),
                discharge_mwh: solution.value(discharge[t]).clamp(0.0, capacity),
                soc: solution
                    .value(soc[t])
                    .clamp(self.options.soc_min, self.options.soc_max),
            })
            .collect();
        Ok(Schedule::new(rows))
    }
}
