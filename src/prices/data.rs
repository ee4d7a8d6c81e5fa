use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::debug;

use super::PriceError;

/// Immutable, timestamp-ordered price series backing the historical and
/// forecast models. Built once at startup; read-only afterwards.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    points: Vec<(DateTime<Utc>, f64)>,
}

impl PriceSeries {
    pub fn new(mut points: Vec<(DateTime<Utc>, f64)>) -> Self {
        points.sort_by_key(|(timestamp, _)| *timestamp);
        Self { points }
    }

    /// Load a tabular dataset with a UTC timestamp column and a named price
    /// column. Empty price cells are linearly interpolated between their
    /// nearest known neighbours; runs at either end take the closest known
    /// value.
    pub fn from_csv(
        path: &Path,
        timestamp_column: &str,
        price_column: &str,
    ) -> Result<Self, PriceError> {
        let csv_error = |source| PriceError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let missing_column = |column: &str| PriceError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_owned(),
        };

        let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
        let headers = reader.headers().map_err(csv_error)?.clone();
        let timestamp_idx = headers
            .iter()
            .position(|name| name == timestamp_column)
            .ok_or_else(|| missing_column(timestamp_column))?;
        let price_idx = headers
            .iter()
            .position(|name| name == price_column)
            .ok_or_else(|| missing_column(price_column))?;

        let mut raw: Vec<(DateTime<Utc>, Option<f64>)> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            let timestamp_value = record.get(timestamp_idx).unwrap_or("").trim();
            let timestamp = DateTime::parse_from_rfc3339(timestamp_value)
                .map_err(|source| PriceError::Timestamp {
                    value: timestamp_value.to_owned(),
                    source,
                })?
                .with_timezone(&Utc);
            let price_value = record.get(price_idx).unwrap_or("").trim();
            let price = if price_value.is_empty() {
                None
            } else {
                Some(
                    price_value
                        .parse::<f64>()
                        .map_err(|source| PriceError::Price {
                            value: price_value.to_owned(),
                            source,
                        })?,
                )
            };
            raw.push((timestamp, price));
        }
        raw.sort_by_key(|(timestamp, _)| *timestamp);

        let points = interpolate_gaps(&raw);
        debug!(
            rows = points.len(),
            path = %path.display(),
            "loaded price dataset"
        );
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points with timestamps in the half-open window `[start, end)`.
    pub fn window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> &[(DateTime<Utc>, f64)] {
        let lo = self.points.partition_point(|(timestamp, _)| *timestamp < start);
        let hi = self.points.partition_point(|(timestamp, _)| *timestamp < end);
        &self.points[lo..hi]
    }

    /// All points on the given calendar day.
    pub fn day(&self, date: NaiveDate) -> &[(DateTime<Utc>, f64)] {
        let start = day_start(date);
        self.window(start, start + Duration::days(1))
    }

    /// The day's price vector, requiring exactly `expected_len` rows.
    pub fn day_prices(&self, date: NaiveDate, expected_len: usize) -> Result<Vec<f64>, PriceError> {
        let rows = self.day(date);
        if rows.len() != expected_len {
            return Err(PriceError::Unavailable {
                date,
                reason: format!(
                    "expected {expected_len} price rows, found {}",
                    rows.len()
                ),
            });
        }
        Ok(rows.iter().map(|(_, price)| *price).collect())
    }
}

/// Midnight UTC of the given day.
pub(crate) fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn interpolate_gaps(raw: &[(DateTime<Utc>, Option<f64>)]) -> Vec<(DateTime<Utc>, f64)> {
    let known: Vec<usize> = raw
        .iter()
        .enumerate()
        .filter_map(|(idx, (_, price))| price.map(|_| idx))
        .collect();
    let Some((&first, &last)) = known.first().zip(known.last()) else {
        return Vec::new();
    };

    let mut values = vec![0.0; raw.len()];
    for (idx, (_, price)) in raw.iter().enumerate() {
        if let Some(price) = price {
            values[idx] = *price;
        }
    }
    for idx in 0..first {
        values[idx] = values[first];
    }
    for idx in last + 1..raw.len() {
        values[idx] = values[last];
    }
    for pair in known.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        let span = (hi - lo) as f64;
        for idx in lo + 1..hi {
            let t = (idx - lo) as f64 / span;
            values[idx] = values[lo] * (1.0 - t) + values[hi] * t;
        }
    }

    raw.iter()
        .zip(values)
        .map(|((timestamp, _), value)| (*timestamp, value))
        .collect()
}
