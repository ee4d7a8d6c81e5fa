//! Deterministic synthetic price feed.
//!
//! The planning vector is a sinusoidal daily envelope with an evening peak
//! window; the realized vector adds uniform noise and occasional
//! multiplicative spikes. Both are driven by a single RNG seeded from the
//! date ordinal, so a given `(date, config)` always produces the same pair.

use std::f64::consts::{FRAC_PI_2, TAU};

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{PriceError, PricePair, PriceSource};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedPriceConfig {
    /// Envelope floor in currency per MWh.
    pub min_price: f64,
    /// Envelope ceiling in currency per MWh.
    pub max_price: f64,
    /// First interval (fractional) of the peak window.
    pub peak_start: f64,
    /// One past the last interval of the peak window.
    pub peak_end: f64,
    /// Half-width of the uniform noise added to realized prices.
    pub noise_level: f64,
    /// Per-interval probability of a price spike.
    pub spike_chance: f64,
    /// Multiplier applied when a spike occurs.
    pub spike_multiplier: f64,
}

impl Default for SimulatedPriceConfig {
    fn default() -> Self {
        Self {
            min_price: 0.0,
            max_price: 200.0,
            peak_start: 16.0,
            peak_end: 32.0,
            noise_level: 5.0,
            spike_chance: 0.05,
            spike_multiplier: 1.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedPriceModel {
    config: SimulatedPriceConfig,
    num_intervals: usize,
}

impl SimulatedPriceModel {
    pub fn new(config: SimulatedPriceConfig, num_intervals: usize) -> Self {
        Self {
            config,
            num_intervals,
        }
    }

    /// Smooth daily curve: a full-amplitude sine through the peak window and
    /// a quarter-amplitude double-frequency ripple off peak, each interval
    /// nudged by up to 5% of the price span.
    fn envelope(&self, rng: &mut StdRng) -> Vec<f64> {
        let span = self.config.max_price - self.config.min_price;
        (0..self.num_intervals)
            .map(|interval| {
                let x = TAU * (interval as f64 / self.num_intervals as f64);
                let base = if (self.config.peak_start..self.config.peak_end)
                    .contains(&(interval as f64))
                {
                    let sine = ((x - FRAC_PI_2).sin() + 1.0) / 2.0;
                    self.config.min_price + span * sine
                } else {
                    let sine = ((x * 2.0 - FRAC_PI_2).sin() + 1.0) / 2.0;
                    self.config.min_price + (span / 4.0) * sine
                };
                let adjustment = rng.gen_range(-1.0..1.0) * span / 20.0;
                (base + adjustment).clamp(self.config.min_price, self.config.max_price)
            })
            .collect()
    }

    /// Realized prices: envelope plus uniform noise and occasional spikes,
    /// floored at zero.
    fn add_noise(&self, envelope: &[f64], rng: &mut StdRng) -> Vec<f64> {
        envelope
            .iter()
            .map(|price| {
                let noise = rng.gen_range(-1.0..1.0) * self.config.noise_level;
                let mut price = price + noise;
                if rng.gen::<f64>() < self.config.spike_chance {
                    price *= self.config.spike_multiplier;
                }
                price.max(0.0)
            })
            .collect()
    }
}

impl PriceSource for SimulatedPriceModel {
    fn get_prices(&self, date: NaiveDate) -> Result<PricePair, PriceError> {
        let mut rng = StdRng::seed_from_u64(date.num_days_from_ce() as u64);
        let planning = self.envelope(&mut rng);
        let actual = self.add_noise(&planning, &mut rng);
        Ok(PricePair { planning, actual })
    }
}
