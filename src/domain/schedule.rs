use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One interval of the day-ahead dispatch plan.
///
/// `charge_mwh` and `discharge_mwh` are grid-side energy requests for the
/// interval; `soc` is the planned state of charge at the start of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub interval: usize,
    pub charge_mwh: f64,
    pub discharge_mwh: f64,
    pub soc: f64,
}

/// The dispatch plan for a single day, ordered by interval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub rows: Vec<ScheduleRow>,
}

impl Schedule {
    pub fn new(rows: Vec<ScheduleRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_charge_mwh(&self) -> f64 {
        self.rows.iter().map(|row| row.charge_mwh).sum()
    }

    pub fn total_discharge_mwh(&self) -> f64 {
        self.rows.iter().map(|row| row.discharge_mwh).sum()
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>8}  {:>12}  {:>13}  {:>8}",
            "interval", "charge_mwh", "discharge_mwh", "soc"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:>8}  {:>12.6}  {:>13.6}  {:>8.4}",
                row.interval, row.charge_mwh, row.discharge_mwh, row.soc
            )?;
        }
        Ok(())
    }
}

/// Outcome of one simulated trading day.
#[derive(Debug, Clone, Serialize)]
pub struct DayResult {
    pub date: NaiveDate,
    pub schedule: Schedule,
    pub pnl: f64,
}

/// Ordered log of a whole back-test, one entry per calendar day.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationRun {
    pub days: Vec<DayResult>,
    pub total_pnl: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn schedule() -> Schedule {
        Schedule::new(vec![
            ScheduleRow {
                interval: 0,
                charge_mwh: 0.4,
                discharge_mwh: 0.0,
                soc: 0.5,
            },
            ScheduleRow {
                interval: 1,
                charge_mwh: 0.0,
                discharge_mwh: 0.3,
                soc: 0.86,
            },
        ])
    }

    #[test]
    fn totals_sum_over_rows() {
        let schedule = schedule();
        assert_relative_eq!(schedule.total_charge_mwh(), 0.4);
        assert_relative_eq!(schedule.total_discharge_mwh(), 0.3);
    }

    #[test]
    fn display_renders_one_line_per_row() {
        let rendered = schedule().to_string();
        // Header plus two rows.
        assert_eq!(rendered.lines().count(), 3);
        assert!(rendered.contains("discharge_mwh"));
    }

    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_string(&schedule()).unwrap();
        assert!(json.contains("\"charge_mwh\":0.4"));
    }
}
