//! PriceSeries — one symbol's daily adjusted closes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single daily observation. Missing prices are stored as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }

    /// True when the observation carries a usable price.
    pub fn is_valid(&self) -> bool {
        self.price.is_finite()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("{symbol}: dates must be strictly increasing ({prev} followed by {next})")]
    OutOfOrder {
        symbol: String,
        prev: NaiveDate,
        next: NaiveDate,
    },
}

/// Ordered `(date, price)` observations for one symbol.
///
/// Dates are strictly increasing with no duplicates. The series is immutable
/// once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, rejecting unsorted or duplicated dates.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::OutOfOrder {
                    symbol,
                    prev: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self { symbol, points })
    }

    /// Build a series from observations in any order. Later duplicates win.
    pub fn from_unsorted(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self {
            symbol: symbol.into(),
            points: deduped,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of observations with a usable price.
    pub fn valid_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_valid()).count()
    }

    /// First date carrying a usable price, if any.
    pub fn first_valid_date(&self) -> Option<NaiveDate> {
        self.points.iter().find(|p| p.is_valid()).map(|p| p.date)
    }
}
