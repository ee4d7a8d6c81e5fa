use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Aging rate per MWh of throughput at shallow depth of discharge.
const BASE_DEGRADATION_PER_MWH: f64 = 5e-6;

/// Depth-of-discharge threshold above which aging doubles.
const DEEP_DISCHARGE_DOD: f64 = 0.5;

/// Reference cell temperature at which the nameplate efficiencies hold.
const NOMINAL_TEMPERATURE_C: f64 = 25.0;

#[derive(Debug, Error)]
pub enum BatteryError {
    #[error("invalid battery configuration: {0}")]
    InvalidConfig(String),
}

/// Initial conditions and ratings for a [`Battery`].
///
/// Rates default to one full capacity per hour when left unset, matching a
/// 1C cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryParams {
    pub capacity_mwh: f64,
    pub charge_efficiency: f64,
    pub discharge_efficiency: f64,
    pub max_charge_rate_mw: Option<f64>,
    pub max_discharge_rate_mw: Option<f64>,
    pub initial_soc: f64,
    pub initial_soh: f64,
    pub temperature_c: f64,
    /// Length of one control interval in hours.
    pub duration_hours: f64,
}

impl Default for BatteryParams {
    fn default() -> Self {
        Self {
            capacity_mwh: 1.0,
            charge_efficiency: 0.9,
            discharge_efficiency: 0.9,
            max_charge_rate_mw: None,
            max_discharge_rate_mw: None,
            initial_soc: 0.5,
            initial_soh: 1.0,
            temperature_c: NOMINAL_TEMPERATURE_C,
            duration_hours: 1.0,
        }
    }
}

/// Read-only view of the parameters the planner needs for one day.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatterySnapshot {
    pub capacity_mwh: f64,
    pub charge_efficiency: f64,
    pub discharge_efficiency: f64,
    pub soc: f64,
}

/// A single grid-connected storage asset.
///
/// The simulator owns the battery exclusively for the lifetime of a run and
/// is the only caller of [`Battery::charge`] and [`Battery::discharge`].
/// Both operations clamp rather than fail: requests are limited by the rated
/// power, and SOC saturates at the physical `[0, 1]` bounds.
#[derive(Debug, Clone, Serialize)]
pub struct Battery {
    capacity_mwh: f64,
    charge_efficiency: f64,
    discharge_efficiency: f64,
    max_charge_rate_mw: f64,
    max_discharge_rate_mw: f64,
    soc: f64,
    soh: f64,
    temperature_c: f64,
    cycle_count: f64,
    energy_cycled_mwh: f64,
    duration_hours: f64,
}

impl Battery {
    pub fn new(params: BatteryParams) -> Result<Self, BatteryError> {
        if params.capacity_mwh <= 0.0 {
            return Err(BatteryError::InvalidConfig(format!(
                "capacity must be greater than 0, got {}",
                params.capacity_mwh
            )));
        }
        if !(0.0..=1.0).contains(&params.initial_soc) {
            return Err(BatteryError::InvalidConfig(format!(
                "initial SOC must be between 0 and 1, got {}",
                params.initial_soc
            )));
        }
        if !(0.0..=1.0).contains(&params.initial_soh) {
            return Err(BatteryError::InvalidConfig(format!(
                "initial SOH must be between 0 and 1, got {}",
                params.initial_soh
            )));
        }

        Ok(Self {
            capacity_mwh: params.capacity_mwh,
            charge_efficiency: params.charge_efficiency,
            discharge_efficiency: params.discharge_efficiency,
            max_charge_rate_mw: params.max_charge_rate_mw.unwrap_or(params.capacity_mwh),
            max_discharge_rate_mw: params
                .max_discharge_rate_mw
                .unwrap_or(params.capacity_mwh),
            soc: params.initial_soc,
            soh: params.initial_soh,
            temperature_c: params.temperature_c,
            cycle_count: 0.0,
            energy_cycled_mwh: 0.0,
            duration_hours: params.duration_hours,
        })
    }

    pub fn capacity_mwh(&self) -> f64 {
        self.capacity_mwh
    }

    pub fn soc(&self) -> f64 {
        self.soc
    }

    pub fn soh(&self) -> f64 {
        self.soh
    }

    pub fn cycle_count(&self) -> f64 {
        self.cycle_count
    }

    pub fn energy_cycled_mwh(&self) -> f64 {
        self.energy_cycled_mwh
    }

    pub fn charge_efficiency(&self) -> f64 {
        self.charge_efficiency
    }

    pub fn discharge_efficiency(&self) -> f64 {
        self.discharge_efficiency
    }

    /// Parameters handed to the optimizer and the P&L calculator for one
    /// planning call.
    pub fn snapshot(&self) -> BatterySnapshot {
        BatterySnapshot {
            capacity_mwh: self.capacity_mwh,
            charge_efficiency: self.charge_efficiency,
            discharge_efficiency: self.discharge_efficiency,
            soc: self.soc,
        }
    }

    /// Derate both efficiencies by 1% per degree away from nominal, keeping
    /// them inside `[0.5, 1.0]`. Applied to the current values at the start
    /// of every charge or discharge.
    pub fn adjust_efficiency_for_temperature(&mut self) {
        let temp_effect = (self.temperature_c - NOMINAL_TEMPERATURE_C).abs() * 0.01;
        self.charge_efficiency = (self.charge_efficiency - temp_effect).clamp(0.5, 1.0);
        self.discharge_efficiency = (self.discharge_efficiency - temp_effect).clamp(0.5, 1.0);
    }

    /// Draw `energy_mwh` from the grid. The stored amount is the request
    /// after charge losses; SOC saturates at 1.0.
    pub fn charge(&mut self, energy_mwh: f64) {
        self.adjust_efficiency_for_temperature();
        let energy_mwh = energy_mwh
            .max(0.0)
            .min(self.max_charge_rate_mw * self.duration_hours);
        let stored_mwh = energy_mwh * self.charge_efficiency;
        self.soc = (self.soc + stored_mwh / self.capacity_mwh).min(1.0);
        self.update_soh_and_cycles(energy_mwh);
    }

    /// Deliver `energy_mwh` towards the grid. The stored amount removed is
    /// the request after discharge losses; SOC saturates at 0.0.
    pub fn discharge(&mut self, energy_mwh: f64) {
        self.adjust_efficiency_for_temperature();
        let energy_mwh = energy_mwh
            .max(0.0)
            .min(self.max_discharge_rate_mw * self.duration_hours);
        let removed_mwh = energy_mwh * self.discharge_efficiency;
        self.soc = (self.soc - removed_mwh / self.capacity_mwh).max(0.0);
        self.update_soh_and_cycles(energy_mwh);
    }

    /// Throughput-based aging: deep-discharge operation ages twice as fast,
    /// and a full round trip of capacity energy counts as one cycle.
    fn update_soh_and_cycles(&mut self, energy_mwh: f64) {
        self.energy_cycled_mwh += energy_mwh;
        let dod = 1.0 - self.soc;
        let dod_factor = if dod > DEEP_DISCHARGE_DOD { 2.0 } else { 1.0 };
        let degradation = BASE_DEGRADATION_PER_MWH * energy_mwh * dod_factor;
        self.soh *= 1.0 - degradation;
        self.cycle_count += energy_mwh / (2.0 * self.capacity_mwh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use proptest::prelude::*;
    use rstest::rstest;

    fn battery(params: BatteryParams) -> Battery {
        Battery::new(params).unwrap()
    }

    #[rstest]
    #[case(0.0, 0.5, 1.0)]
    #[case(-1.0, 0.5, 1.0)]
    #[case(1.0, 1.5, 1.0)]
    #[case(1.0, -0.1, 1.0)]
    #[case(1.0, 0.5, 1.2)]
    #[case(1.0, 0.5, -0.2)]
    fn new_rejects_invalid_initial_conditions(
        #[case] capacity_mwh: f64,
        #[case] initial_soc: f64,
        #[case] initial_soh: f64,
    ) {
        let result = Battery::new(BatteryParams {
            capacity_mwh,
            initial_soc,
            initial_soh,
            ..BatteryParams::default()
        });
        assert!(matches!(result, Err(BatteryError::InvalidConfig(_))));
    }

    #[test]
    fn charge_stores_energy_after_losses() {
        let mut b = battery(BatteryParams::default());
        b.charge(0.2);
        // 0.2 MWh requested, 0.18 MWh stored in a 1 MWh battery.
        assert_relative_eq!(b.soc(), 0.68, epsilon = 1e-12);
        assert_relative_eq!(b.energy_cycled_mwh(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(b.cycle_count(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn discharge_removes_energy_after_losses() {
        let mut b = battery(BatteryParams::default());
        b.discharge(0.2);
        assert_relative_eq!(b.soc(), 0.32, epsilon = 1e-12);
        assert_relative_eq!(b.cycle_count(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn charge_is_clamped_to_rated_power() {
        let mut b = battery(BatteryParams {
            max_charge_rate_mw: Some(0.1),
            ..BatteryParams::default()
        });
        b.charge(5.0);
        // Only 0.1 MW over one hour made it through.
        assert_relative_eq!(b.soc(), 0.5 + 0.1 * 0.9, epsilon = 1e-12);
        assert_relative_eq!(b.energy_cycled_mwh(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn soc_saturates_at_physical_bounds() {
        let mut b = battery(BatteryParams {
            initial_soc: 0.95,
            ..BatteryParams::default()
        });
        b.charge(1.0);
        assert_abs_diff_eq!(b.soc(), 1.0);

        let mut b = battery(BatteryParams {
            initial_soc: 0.05,
            ..BatteryParams::default()
        });
        b.discharge(1.0);
        assert_abs_diff_eq!(b.soc(), 0.0);
    }

    #[rstest]
    #[case(35.0)]
    #[case(15.0)]
    fn off_nominal_temperature_derates_efficiency(#[case] temperature_c: f64) {
        // 10 degrees either side of nominal costs 10 points of efficiency.
        let mut b = battery(BatteryParams {
            temperature_c,
            ..BatteryParams::default()
        });
        b.adjust_efficiency_for_temperature();
        assert_relative_eq!(b.charge_efficiency(), 0.8, epsilon = 1e-12);
        assert_relative_eq!(b.discharge_efficiency(), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn efficiency_never_leaves_the_valid_band() {
        let mut b = battery(BatteryParams {
            temperature_c: 90.0,
            ..BatteryParams::default()
        });
        for _ in 0..10 {
            b.charge(0.1);
        }
        assert_abs_diff_eq!(b.charge_efficiency(), 0.5);
        assert_abs_diff_eq!(b.discharge_efficiency(), 0.5);
    }

    #[test]
    fn deep_discharge_ages_twice_as_fast() {
        let mut shallow = battery(BatteryParams {
            initial_soc: 1.0,
            ..BatteryParams::default()
        });
        let mut deep = battery(BatteryParams {
            initial_soc: 0.4,
            ..BatteryParams::default()
        });
        shallow.discharge(0.1);
        deep.discharge(0.1);
        let shallow_loss = 1.0 - shallow.soh();
        let deep_loss = 1.0 - deep.soh();
        assert_relative_eq!(deep_loss, 2.0 * shallow_loss, epsilon = 1e-9);
    }

    #[test]
    fn soh_decreases_under_any_nonzero_operation() {
        let mut b = battery(BatteryParams::default());
        let mut last = b.soh();
        for _ in 0..5 {
            b.charge(0.2);
            assert!(b.soh() < last);
            last = b.soh();
            b.discharge(0.2);
            assert!(b.soh() < last);
            last = b.soh();
        }
    }

    #[test]
    fn round_trip_counts_one_cycle() {
        let mut b = battery(BatteryParams::default());
        b.charge(1.0);
        b.discharge(1.0);
        assert_relative_eq!(b.cycle_count(), 1.0, epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn state_stays_physical_under_arbitrary_dispatch(
            ops in prop::collection::vec((any::<bool>(), 0.0f64..2.0), 0..50),
            initial_soc in 0.0f64..=1.0,
            temperature_c in -20.0f64..60.0,
        ) {
            let mut b = battery(BatteryParams {
                initial_soc,
                temperature_c,
                ..BatteryParams::default()
            });
            for (is_charge, energy) in ops {
                if is_charge {
                    b.charge(energy);
                } else {
                    b.discharge(energy);
                }
                prop_assert!((0.0..=1.0).contains(&b.soc()));
                prop_assert!((0.0..=1.0).contains(&b.soh()));
                prop_assert!((0.5..=1.0).contains(&b.charge_efficiency()));
                prop_assert!((0.5..=1.0).contains(&b.discharge_efficiency()));
                prop_assert!(b.cycle_count() >= 0.0);
            }
        }
    }
}
