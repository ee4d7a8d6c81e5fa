//! The single-day dispatch LP.
//!
//! Pure linear program over four variable families per interval: grid-side
//! charge and discharge energy, start-of-interval state of charge, and
//! cumulative cycled energy. No binary charge/discharge indicator is needed:
//! the round-trip loss makes simultaneous charge and discharge strictly
//! unprofitable, so the relaxation is tight.
//!
//! The model is assembled as plain data — variable handles, one objective
//! expression, and a constraint list — and handed to the solver by the
//! scheduler, which keeps the formulation itself inspectable in tests.

use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};
use serde::{Deserialize, Serialize};

use crate::domain::BatterySnapshot;

/// Planner knobs shared by every day of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OptimizerOptions {
    /// Length of one interval in hours.
    pub timestep_hours: f64,
    /// Lower planning bound on SOC, above the physical floor.
    pub soc_min: f64,
    /// Upper planning bound on SOC, below the physical ceiling.
    pub soc_max: f64,
    /// Throughput budget for the horizon, in equivalent full cycles.
    pub max_cycles: f64,
    /// Wall-clock budget for one solve; 0 disables the check.
    pub solver_timeout_secs: u64,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            timestep_hours: 1.0,
            soc_min: 0.05,
            soc_max: 0.95,
            max_cycles: 5.0,
            solver_timeout_secs: 30,
        }
    }
}

/// The assembled LP, ready to be attached to a solver.
pub struct DispatchProblem {
    pub vars: ProblemVariables,
    pub charge: Vec<Variable>,
    pub discharge: Vec<Variable>,
    pub soc: Vec<Variable>,
    pub energy_cycled: Vec<Variable>,
    pub objective: Expression,
    pub constraints: Vec<Constraint>,
}

/// Build the day's LP from a price vector and a battery snapshot.
///
/// Objective (maximized): `Σ d[t]·p[t]·η_d/Δh − c[t]·p[t]/(η_c·Δh)` —
/// revenue per MWh delivered after discharge losses, cost per MWh drawn
/// before charge losses. The P&L calculator mirrors the same asymmetry.
///
/// Constraints:
/// - `soc[0]` equals the battery's current SOC, projected onto
///   `[soc_min, soc_max]` (the physical state may sit outside the planning
///   band after a day-boundary carry);
/// - `c[t] + d[t] ≤ capacity` each interval;
/// - SOC recursion `soc[t] = soc[t−1] + c[t−1]·η_c/cap − d[t−1]/(η_d·cap)`;
/// - cycled-energy recursion `cyc[t] = cyc[t−1] + c[t−1]·η_c + d[t−1]/η_d`
///   with `cyc[0] = 0`;
/// - throughput cap `cyc[N−1] ≤ max_cycles · capacity · 2`.
///
/// The price vector must be non-empty; [`Scheduler`](super::Scheduler)
/// guards this before building.
pub fn build_problem(
    prices: &[f64],
    battery: &BatterySnapshot,
    options: &OptimizerOptions,
) -> DispatchProblem {
    let num_intervals = prices.len();
    let capacity = battery.capacity_mwh;
    let eta_c = battery.charge_efficiency;
    let eta_d = battery.discharge_efficiency;
    let dt = options.timestep_hours;

    let mut vars = ProblemVariables::new();
    let charge = vars.add_vector(variable().min(0.0).max(capacity), num_intervals);
    let discharge = vars.add_vector(variable().min(0.0).max(capacity), num_intervals);
    let soc = vars.add_vector(
        variable().min(options.soc_min).max(options.soc_max),
        num_intervals,
    );
    let energy_cycled = vars.add_vector(variable().min(0.0), num_intervals);

    let objective = (0..num_intervals)
        .map(|t| {
            discharge[t] * (prices[t] * eta_d / dt) - charge[t] * (prices[t] / (eta_c * dt))
        })
        .sum::<Expression>();

    let mut constraints = Vec::with_capacity(3 * num_intervals + 1);

    let initial_soc = battery.soc.clamp(options.soc_min, options.soc_max);
    constraints.push(constraint!(soc[0] == initial_soc));
    constraints.push(constraint!(energy_cycled[0] == 0.0));

    for t in 0..num_intervals {
        constraints.push(constraint!(charge[t] + discharge[t] <= capacity));
    }

    for t in 1..num_intervals {
        let soc_delta =
            charge[t - 1] * (eta_c / capacity) - discharge[t - 1] * (1.0 / (eta_d * capacity));
        constraints.push(constraint!(soc[t] == soc[t - 1] + soc_delta));

        let cycled_delta = charge[t - 1] * eta_c + discharge[t - 1] * (1.0 / eta_d);
        constraints.push(constraint!(energy_cycled[t] == energy_cycled[t - 1] + cycled_delta));
    }

    constraints.push(constraint!(
        energy_cycled[num_intervals - 1] <= options.max_cycles * capacity * 2.0
    ));

    DispatchProblem {
        vars,
        charge,
        discharge,
        soc,
        energy_cycled,
        objective,
        constraints,
    }
}
