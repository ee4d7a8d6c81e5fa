use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::data::day_start;
use super::{PriceError, PricePair, PriceSeries, PriceSource};

/// Black-box day-ahead price predictor. Trained models live outside this
/// crate; the core only requires a prediction of the next `horizon` values
/// from a window of recorded history.
pub trait PriceForecaster: std::fmt::Debug + Send + Sync {
    fn forecast(
        &self,
        history: &[(DateTime<Utc>, f64)],
        horizon: usize,
    ) -> Result<Vec<f64>, PriceError>;
}

/// Built-in baseline predictor: repeat the most recent `horizon` observations
/// (i.e. yesterday becomes tomorrow).
#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonalNaiveForecaster;

impl PriceForecaster for SeasonalNaiveForecaster {
    fn forecast(
        &self,
        history: &[(DateTime<Utc>, f64)],
        horizon: usize,
    ) -> Result<Vec<f64>, PriceError> {
        if history.len() < horizon {
            return Err(PriceError::InsufficientHistory {
                have: history.len(),
                need: horizon,
            });
        }
        Ok(history[history.len() - horizon..]
            .iter()
            .map(|(_, price)| *price)
            .collect())
    }
}

/// Plans each day against a forecaster's prediction over the lookback
/// window; the realized vector is the day's own record.
#[derive(Debug)]
pub struct ForecastPriceModel {
    series: PriceSeries,
    forecaster: Box<dyn PriceForecaster>,
    num_intervals: usize,
    lookback_days: u32,
}

impl ForecastPriceModel {
    pub fn new(
        series: PriceSeries,
        forecaster: Box<dyn PriceForecaster>,
        num_intervals: usize,
        lookback_days: u32,
    ) -> Self {
        Self {
            series,
            forecaster,
            num_intervals,
            lookback_days,
        }
    }
}

impl PriceSource for ForecastPriceModel {
    fn get_prices(&self, date: NaiveDate) -> Result<PricePair, PriceError> {
        let end = day_start(date);
        let start = end - Duration::days(i64::from(self.lookback_days));
        let history = self.series.window(start, end);

        let planning = self.forecaster.forecast(history, self.num_intervals)?;
        if planning.len() != self.num_intervals || planning.iter().any(|price| !price.is_finite())
        {
            return Err(PriceError::Unavailable {
                date,
                reason: format!(
                    "forecaster returned {} values for a horizon of {}",
                    planning.len(),
                    self.num_intervals
                ),
            });
        }

        let actual = self.series.day_prices(date, self.num_intervals)?;
        Ok(PricePair { planning, actual })
    }
}
