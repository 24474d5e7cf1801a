//! Calendar resampling of equity curves.
//!
//! A period's value is the curve's last value inside it; a period return is
//! the change between consecutive period-end values, so the first period
//! has no return of its own.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    Year,
    Quarter,
}

impl Period {
    fn key(self, date: NaiveDate) -> (i32, u32) {
        match self {
            Period::Year => (date.year(), 0),
            Period::Quarter => (date.year(), (date.month() - 1) / 3 + 1),
        }
    }

    fn label(self, (year, quarter): (i32, u32)) -> String {
        match self {
            Period::Year => year.to_string(),
            Period::Quarter => format!("{year}-Q{quarter}"),
        }
    }
}

/// Return over one calendar period, as a fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReturn {
    /// `"2021"` or `"2021-Q3"`.
    pub label: String,
    /// Last date of the curve inside the period.
    pub end: NaiveDate,
    pub value: f64,
}

/// Last `(date, value)` of each period, in date order.
pub fn period_ends(dates: &[NaiveDate], values: &[f64], period: Period) -> Vec<(NaiveDate, f64)> {
    let mut ends: Vec<(NaiveDate, f64)> = Vec::new();
    for (&date, &value) in dates.iter().zip(values) {
        match ends.last_mut() {
            Some(last) if period.key(last.0) == period.key(date) => *last = (date, value),
            _ => ends.push((date, value)),
        }
    }
    ends
}

/// Period-over-period returns of the period-end values.
///
/// Fewer than two periods give an empty list. Non-finite changes are skipped.
pub fn period_returns(dates: &[NaiveDate], values: &[f64], period: Period) -> Vec<PeriodReturn> {
    period_ends(dates, values, period)
        .windows(2)
        .filter_map(|w| {
            let (_, prev) = w[0];
            let (end, cur) = w[1];
            let value = cur / prev - 1.0;
            value.is_finite().then(|| PeriodReturn {
                label: period.label(period.key(end)),
                end,
                value,
            })
        })
        .collect()
}
