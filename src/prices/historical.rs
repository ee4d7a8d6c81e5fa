use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use itertools::Itertools;

use super::data::day_start;
use super::{PriceError, PricePair, PriceSeries, PriceSource};

/// Plans each day against the per-interval-of-day average over a lookback
/// window of recorded prices; the realized vector is the day's own record.
#[derive(Debug, Clone)]
pub struct HistoricalAveragePriceModel {
    series: PriceSeries,
    num_intervals: usize,
    timestep_hours: f64,
    lookback_days: u32,
}

impl HistoricalAveragePriceModel {
    pub fn new(
        series: PriceSeries,
        num_intervals: usize,
        timestep_hours: f64,
        lookback_days: u32,
    ) -> Self {
        Self {
            series,
            num_intervals,
            timestep_hours,
            lookback_days,
        }
    }

    fn interval_of_day(&self, timestamp: &DateTime<Utc>) -> usize {
        let seconds = f64::from(timestamp.time().num_seconds_from_midnight());
        (seconds / (self.timestep_hours * 3600.0)) as usize
    }
}

impl PriceSource for HistoricalAveragePriceModel {
    fn get_prices(&self, date: NaiveDate) -> Result<PricePair, PriceError> {
        let end = day_start(date);
        let start = end - Duration::days(i64::from(self.lookback_days));

        let buckets = self
            .series
            .window(start, end)
            .iter()
            .map(|(timestamp, price)| (self.interval_of_day(timestamp), *price))
            .filter(|(interval, _)| *interval < self.num_intervals)
            .into_group_map();

        let planning = (0..self.num_intervals)
            .map(|interval| {
                buckets
                    .get(&interval)
                    .map(|prices| prices.iter().sum::<f64>() / prices.len() as f64)
                    .ok_or_else(|| PriceError::Unavailable {
                        date,
                        reason: format!(
                            "no history for interval {interval} in the prior {} days",
                            self.lookback_days
                        ),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let actual = self.series.day_prices(date, self.num_intervals)?;
        Ok(PricePair { planning, actual })
    }
}
