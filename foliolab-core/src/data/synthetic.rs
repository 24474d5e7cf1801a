//! Deterministic synthetic price provider for offline runs and tests.
//!
//! Each symbol gets its own random walk seeded from the BLAKE3 hash of its
//! name, so the same symbol always produces the same path. These prices are
//! clearly fake and their display names say so.

use super::provider::{DataError, DataProvider};
use crate::domain::{PricePoint, PriceSeries};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Walk origin used when a symbol has no listing date configured.
fn default_listing() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 3).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider {
    listings: HashMap<String, NaiveDate>,
    unknown: Vec<String>,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// First trading day of `symbol`. Requests before it return nothing earlier.
    pub fn with_listing(mut self, symbol: impl Into<String>, date: NaiveDate) -> Self {
        self.listings.insert(symbol.into(), date);
        self
    }

    /// Make `symbol` fail permanently, as an unknown ticker would.
    pub fn with_unknown(mut self, symbol: impl Into<String>) -> Self {
        self.unknown.push(symbol.into());
        self
    }

    fn listing(&self, symbol: &str) -> NaiveDate {
        self.listings
            .get(symbol)
            .copied()
            .unwrap_or_else(default_listing)
    }

    /// Walk from the listing date to `end`, keeping the points on or after `start`.
    ///
    /// The walk always starts at the listing date so a given day has the
    /// same price regardless of the requested window.
    fn generate(symbol: &str, listing: NaiveDate, start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut points = Vec::new();
        let mut price = rng.gen_range(20.0..200.0_f64);
        let drift: f64 = rng.gen_range(-0.0002..0.0008);
        let mut current = listing;

        while current <= end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += chrono::Duration::days(1);
                continue;
            }
            if current >= start {
                points.push(PricePoint::new(current, price));
            }
            let shock: f64 = rng.gen_range(-0.02..0.02);
            price *= 1.0 + drift + shock;
            current += chrono::Duration::days(1);
        }
        points
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        if self.unknown.iter().any(|s| s == symbol) {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let points = Self::generate(symbol, self.listing(symbol), start, end);
        if points.is_empty() {
            return Err(DataError::PricesMissing {
                symbol: symbol.to_string(),
                start,
            });
        }
        Ok(PriceSeries::from_unsorted(symbol, points))
    }

    fn display_name(&self, symbol: &str) -> Result<Option<String>, DataError> {
        if self.unknown.iter().any(|s| s == symbol) {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(Some(format!("{symbol} (synthetic)")))
    }
}
