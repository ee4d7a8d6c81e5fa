pub mod data;
pub mod forecast;
pub mod historical;
pub mod simulated;

pub use data::PriceSeries;
pub use forecast::{ForecastPriceModel, PriceForecaster, SeasonalNaiveForecaster};
pub use historical::HistoricalAveragePriceModel;
pub use simulated::{SimulatedPriceConfig, SimulatedPriceModel};

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Planning and realized price vectors for one trading day, both per MWh and
/// of the optimizer's horizon length. Negative prices are valid and
/// meaningful.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePair {
    pub planning: Vec<f64>,
    pub actual: Vec<f64>,
}

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("price data unavailable for {date}: {reason}")]
    Unavailable { date: NaiveDate, reason: String },
    #[error("failed to read price dataset {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("price dataset {path} has no column named {column:?}")]
    MissingColumn { path: PathBuf, column: String },
    #[error("unparseable timestamp {value:?} in price dataset")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("unparseable price {value:?} in price dataset")]
    Price {
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error("insufficient price history: have {have} points, need {need}")]
    InsufficientHistory { have: usize, need: usize },
}

/// A day-ahead price feed. Implementations must return vectors of the
/// configured horizon length and be reproducible for a given date.
pub trait PriceSource {
    fn get_prices(&self, date: NaiveDate) -> Result<PricePair, PriceError>;
}

/// The closed set of price feeds the back-tester knows about.
#[derive(Debug)]
pub enum PriceModel {
    Simulated(SimulatedPriceModel),
    HistoricalAverage(HistoricalAveragePriceModel),
    Forecast(ForecastPriceModel),
}

impl PriceSource for PriceModel {
    fn get_prices(&self, date: NaiveDate) -> Result<PricePair, PriceError> {
        match self {
            Self::Simulated(model) => model.get_prices(date),
            Self::HistoricalAverage(model) => model.get_prices(date),
            Self::Forecast(model) => model.get_prices(date),
        }
    }
}
