pub mod model;
pub mod scheduler;

pub use model::{build_problem, DispatchProblem, OptimizerOptions};
pub use scheduler::Scheduler;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptimizerError {
    /// The solver terminated without an optimal solution. Fatal for the day.
    #[error("optimization failed with status: {status}, condition: {condition}")]
    Failed { status: String, condition: String },
    #[error("cannot build a schedule over an empty price vector")]
    EmptyHorizon,
    #[error("price vector contains a non-finite value at interval {0}")]
    NonFinitePrice(usize),
}
