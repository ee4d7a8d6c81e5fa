use crate::domain::{BatterySnapshot, Schedule};

/// Accounts a day's schedule against realized prices.
///
/// Mirrors the planner's objective exactly: charged energy costs
/// `c·p·Δh/η_c` (grid-side, before losses) and discharged energy earns
/// `d·p·Δh·η_d` (delivered, after losses). The efficiencies come from the
/// same battery snapshot the planner saw, so plan and accounting can never
/// drift apart. Charge and discharge branches are applied independently per
/// interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct PnlCalculator;

impl PnlCalculator {
    pub fn calculate(
        &self,
        schedule: &Schedule,
        actual_prices: &[f64],
        timestep_hours: f64,
        battery: &BatterySnapshot,
    ) -> f64 {
        let mut pnl = 0.0;
        for (row, price) in schedule.rows.iter().zip(actual_prices) {
            let weighted_price = price * timestep_hours;
            if row.charge_mwh > 0.0 {
                pnl -= row.charge_mwh * weighted_price / battery.charge_efficiency;
            }
            if row.discharge_mwh > 0.0 {
                pnl += row.discharge_mwh * weighted_price * battery.discharge_efficiency;
            }
        }
        pnl
    }
}
