//! Backtest engine — static-weight buy-and-hold against a benchmark.
//!
//! The portfolio is bought once at the first row of the reconciled table
//! and never rebalanced. The benchmark curve is the benchmark's own price
//! path, rebased. Both curves start at the base value and share the
//! table's dates.

pub mod holdings;
pub mod simulate;

pub use holdings::Holdings;
pub use simulate::{benchmark_curve, portfolio_curve, simulate, Simulation};

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("price table has no rows")]
    EmptyTable,

    #[error("no price column for '{0}'")]
    MissingColumn(String),

    #[error("starting price for {symbol} is not positive ({price})")]
    InvalidStartPrice { symbol: String, price: f64 },

    #[error("allocation has no holdings")]
    NoHoldings,
}
