//! AllocationSet — symbol-keyed target weights and their normalization.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default tolerance on `|sum(weights) - 1|`.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    #[error("Portfolio is empty. Please add at least one holding.")]
    Empty,

    #[error("Number of tickers ({symbols}) and allocations ({weights}) must match.")]
    LengthMismatch { symbols: usize, weights: usize },

    #[error("Allocation for {symbol} must be between 0% and 100% (got {:.2}%)", .weight * 100.0)]
    WeightOutOfRange { symbol: String, weight: f64 },

    #[error("Ticker {0} appears more than once in the portfolio.")]
    DuplicateSymbol(String),

    #[error("Allocations must sum to 100%. Current sum: {:.2}%", .sum * 100.0)]
    SumOutOfTolerance { sum: f64 },

    #[error("No holdings left with positive weight after data filtering.")]
    NoPositiveWeight,
}

/// Ordered mapping from symbol to target weight.
///
/// Symbols are unique and keep insertion order; each weight lies in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSet {
    entries: Vec<(String, f64)>,
}

impl AllocationSet {
    /// Zip parallel symbol/weight lists into a set, validating each entry.
    ///
    /// Does not check the total; see [`AllocationSet::check_sum`].
    pub fn from_pairs<S: AsRef<str>>(symbols: &[S], weights: &[f64]) -> Result<Self, AllocationError> {
        if symbols.is_empty() || weights.is_empty() {
            return Err(AllocationError::Empty);
        }
        if symbols.len() != weights.len() {
            return Err(AllocationError::LengthMismatch {
                symbols: symbols.len(),
                weights: weights.len(),
            });
        }

        let mut entries: Vec<(String, f64)> = Vec::with_capacity(symbols.len());
        for (symbol, &weight) in symbols.iter().zip(weights) {
            let symbol = symbol.as_ref().to_string();
            if !(0.0..=1.0).contains(&weight) {
                return Err(AllocationError::WeightOutOfRange { symbol, weight });
            }
            if entries.iter().any(|(s, _)| *s == symbol) {
                return Err(AllocationError::DuplicateSymbol(symbol));
            }
            entries.push((symbol, weight));
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(s, w)| (s.as_str(), *w))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Reject sets whose weights do not sum to 1 within `tolerance`.
    pub fn check_sum(&self, tolerance: f64) -> Result<(), AllocationError> {
        let sum = self.total();
        if (sum - 1.0).abs() > tolerance {
            return Err(AllocationError::SumOutOfTolerance { sum });
        }
        Ok(())
    }

    /// Restrict the set to `survivors` and rescale if the remaining total
    /// drifts more than `tolerance` away from 1.
    ///
    /// Totals inside the tolerance band are kept as they are.
    pub fn normalize_to<S: AsRef<str>>(
        &self,
        survivors: &[S],
        tolerance: f64,
    ) -> Result<AllocationSet, AllocationError> {
        let kept: Vec<(String, f64)> = self
            .entries
            .iter()
            .filter(|(s, _)| survivors.iter().any(|k| k.as_ref() == s))
            .cloned()
            .collect();

        let total: f64 = kept.iter().map(|(_, w)| w).sum();
        if total == 0.0 {
            return Err(AllocationError::NoPositiveWeight);
        }

        if (total - 1.0).abs() <= tolerance {
            return Ok(AllocationSet { entries: kept });
        }

        let factor = 1.0 / total;
        Ok(AllocationSet {
            entries: kept.into_iter().map(|(s, w)| (s, w * factor)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, f64)]) -> AllocationSet {
        let symbols: Vec<&str> = pairs.iter().map(|(s, _)| *s).collect();
        let weights: Vec<f64> = pairs.iter().map(|(_, w)| *w).collect();
        AllocationSet::from_pairs(&symbols, &weights).unwrap()
    }

    #[test]
    fn empty_is_rejected() {
        let none: [&str; 0] = [];
        assert_eq!(
            AllocationSet::from_pairs(&none, &[]).unwrap_err(),
            AllocationError::Empty
        );
    }

    #[test]
    fn sum_message_reports_actual_sum() {
        let s = set(&[("AAPL", 0.5), ("MSFT", 0.4)]);
        let err = s.check_sum(WEIGHT_TOLERANCE).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Allocations must sum to 100%. Current sum: 90.00%"
        );
    }

    #[test]
    fn sum_within_tolerance_passes() {
        let s = set(&[("AAPL", 0.5), ("MSFT", 0.495)]);
        assert!(s.check_sum(WEIGHT_TOLERANCE).is_ok());
    }

    #[test]
    fn out_of_range_weight_rejected() {
        let err = AllocationSet::from_pairs(&["AAPL"], &[1.5]).unwrap_err();
        assert!(matches!(err, AllocationError::WeightOutOfRange { .. }));
    }

    #[test]
    fn duplicate_symbol_rejected() {
        let err = AllocationSet::from_pairs(&["AAPL", "AAPL"], &[0.5, 0.5]).unwrap_err();
        assert_eq!(err, AllocationError::DuplicateSymbol("AAPL".into()));
    }

    #[test]
    fn normalize_drops_missing_and_rescales() {
        let s = set(&[("AAPL", 0.5), ("MSFT", 0.3), ("GOOG", 0.2)]);
        let n = s.normalize_to(&["AAPL", "GOOG"], WEIGHT_TOLERANCE).unwrap();
        assert_eq!(n.len(), 2);
        assert!(n.get("MSFT").is_none());
        assert!((n.get("AAPL").unwrap() - 0.5 / 0.7).abs() < 1e-12);
        assert!((n.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_leaves_small_drift_alone() {
        let s = set(&[("AAPL", 0.6), ("MSFT", 0.395)]);
        let n = s.normalize_to(&["AAPL", "MSFT"], WEIGHT_TOLERANCE).unwrap();
        assert_eq!(n, s);
    }

    #[test]
    fn normalize_zero_total_fails() {
        let s = set(&[("AAPL", 1.0), ("CASH", 0.0)]);
        assert_eq!(
            s.normalize_to(&["CASH"], WEIGHT_TOLERANCE).unwrap_err(),
            AllocationError::NoPositiveWeight
        );
    }

    #[test]
    fn normalize_keeps_insertion_order() {
        let s = set(&[("MSFT", 0.25), ("AAPL", 0.25), ("GOOG", 0.5)]);
        let n = s.normalize_to(&["GOOG", "MSFT"], WEIGHT_TOLERANCE).unwrap();
        let order: Vec<&str> = n.symbols().collect();
        assert_eq!(order, vec!["MSFT", "GOOG"]);
    }
}
