//! Backtest request and its pre-flight validation.

use chrono::NaiveDate;
use foliolab_core::domain::{AllocationError, AllocationSet};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BENCHMARK: &str = "SPY";

/// What to backtest: holdings, target weights, benchmark and optional start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRequest {
    pub symbols: Vec<String>,
    /// Fractions in `[0, 1]`, parallel to `symbols`.
    pub weights: Vec<f64>,
    pub benchmark: String,
    /// Resolved from data availability when absent.
    pub start_date: Option<NaiveDate>,
}

/// Trim and upper-case a ticker symbol.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

impl BacktestRequest {
    /// Build a request with normalized symbols; blank symbols are dropped.
    pub fn new<S: AsRef<str>>(symbols: &[S], weights: Vec<f64>, benchmark: &str) -> Self {
        let benchmark = normalize_symbol(benchmark);
        Self {
            symbols: symbols
                .iter()
                .map(|s| normalize_symbol(s.as_ref()))
                .filter(|s| !s.is_empty())
                .collect(),
            weights,
            benchmark: if benchmark.is_empty() {
                DEFAULT_BENCHMARK.to_string()
            } else {
                benchmark
            },
            start_date: None,
        }
    }

    pub fn with_start_date(mut self, start: NaiveDate) -> Self {
        self.start_date = Some(start);
        self
    }

    /// Validate holdings and weights before any network call.
    ///
    /// Checks, in order: empty portfolio, length mismatch, per-weight range,
    /// duplicate symbols, then the weight total against `tolerance`.
    pub fn allocation(&self, tolerance: f64) -> Result<AllocationSet, AllocationError> {
        let set = AllocationSet::from_pairs(&self.symbols, &self.weights)?;
        set.check_sum(tolerance)?;
        Ok(set)
    }
}
