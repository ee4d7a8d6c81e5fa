pub mod battery;
pub mod schedule;

pub use battery::{Battery, BatteryError, BatteryParams, BatterySnapshot};
pub use schedule::{DayResult, Schedule, ScheduleRow, SimulationRun};
