//! EquityCurve — a simulated strategy's indexed value over time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Value every curve starts at.
pub const BASE_VALUE: f64 = 100.0;

/// Which simulated strategy a curve belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    Portfolio,
    Benchmark,
}

impl StrategyKind {
    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::Portfolio => "Portfolio",
            StrategyKind::Benchmark => "Benchmark",
        }
    }
}

/// Dated values for one strategy, base-normalized so the first value is
/// [`BASE_VALUE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityCurve {
    pub kind: StrategyKind,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl EquityCurve {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_value(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Iterate `(date, value)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}
