pub mod pnl;
pub mod simulator;

pub use pnl::PnlCalculator;
pub use simulator::{MarketSimulator, SimulationError};
