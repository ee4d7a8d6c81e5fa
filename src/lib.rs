//! Day-ahead battery energy arbitrage optimizer and back-tester.
//!
//! Given forecast wholesale prices for a day, the optimizer solves a linear
//! program for the battery's charge/discharge schedule; the simulator
//! applies that schedule to the battery state, accounts realized P&L
//! against actual prices, and rolls day by day over a calendar window with
//! SOC, state of health, and cycle count carried across days.
//!
//! - [`domain`] — the battery state model and schedule types
//! - [`prices`] — simulated, historical-average, and forecast price feeds
//! - [`optimizer`] — the dispatch LP and its solve driver
//! - [`backtest`] — P&L accounting and the rolling simulator
//! - [`config`] / [`telemetry`] — configuration and logging plumbing

pub mod backtest;
pub mod config;
pub mod domain;
pub mod optimizer;
pub mod prices;
pub mod telemetry;
