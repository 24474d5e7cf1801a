//! Multi-symbol time alignment.
//!
//! Outer-joins per-symbol series onto the union of their dates. Dates a
//! symbol did not trade on become NaN; [`fill_gaps`] and
//! [`drop_incomplete_rows`] then turn the aligned frame into a gap-free table.

use crate::domain::PriceSeries;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Prices for several symbols on a common date axis, NaN where missing.
#[derive(Debug, Clone)]
pub struct AlignedFrame {
    /// The common date axis (sorted ascending).
    pub dates: Vec<NaiveDate>,
    /// Symbols in input order.
    pub symbols: Vec<String>,
    /// One column per symbol, same length as `dates`.
    pub columns: HashMap<String, Vec<f64>>,
}

impl AlignedFrame {
    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.columns.get(symbol).map(|v| v.as_slice())
    }

    /// Non-missing observations in a column.
    pub fn valid_count(&self, symbol: &str) -> usize {
        self.column(symbol)
            .map(|c| c.iter().filter(|v| v.is_finite()).count())
            .unwrap_or(0)
    }

    /// Remove columns without a single valid price and return their symbols.
    pub fn drop_empty_columns(&mut self) -> Vec<String> {
        let empty: Vec<String> = self
            .symbols
            .iter()
            .filter(|s| self.valid_count(s) == 0)
            .cloned()
            .collect();
        for symbol in &empty {
            self.columns.remove(symbol);
        }
        self.symbols.retain(|s| !empty.contains(s));
        empty
    }

    pub fn into_columns(self) -> Vec<(String, Vec<f64>)> {
        let AlignedFrame {
            symbols,
            mut columns,
            ..
        } = self;
        symbols
            .into_iter()
            .filter_map(|s| columns.remove(&s).map(|c| (s, c)))
            .collect()
    }
}

/// Align several series to the union of their dates.
pub fn align_series(series: &[PriceSeries]) -> AlignedFrame {
    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points().iter().map(|p| p.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let index: HashMap<NaiveDate, usize> =
        dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

    let mut symbols = Vec::with_capacity(series.len());
    let mut columns = HashMap::with_capacity(series.len());
    for s in series {
        let mut column = vec![f64::NAN; dates.len()];
        for point in s.points() {
            if let Some(&i) = index.get(&point.date) {
                column[i] = point.price;
            }
        }
        symbols.push(s.symbol().to_string());
        columns.insert(s.symbol().to_string(), column);
    }

    AlignedFrame {
        dates,
        symbols,
        columns,
    }
}

/// Forward-fill, then back-fill, every column in place.
///
/// Leading gaps take the first valid price; all-NaN columns are left alone.
pub fn fill_gaps(frame: &mut AlignedFrame) {
    for column in frame.columns.values_mut() {
        let mut last = f64::NAN;
        for v in column.iter_mut() {
            if v.is_finite() {
                last = *v;
            } else {
                *v = last;
            }
        }
        let mut next = f64::NAN;
        for v in column.iter_mut().rev() {
            if v.is_finite() {
                next = *v;
            } else {
                *v = next;
            }
        }
    }
}

/// Drop every row where any column is still missing.
pub fn drop_incomplete_rows(frame: &mut AlignedFrame) {
    let keep: Vec<bool> = (0..frame.dates.len())
        .map(|i| frame.columns.values().all(|c| c[i].is_finite()))
        .collect();
    if keep.iter().all(|k| *k) {
        return;
    }

    let mut i = 0;
    frame.dates.retain(|_| {
        let k = keep[i];
        i += 1;
        k
    });
    for column in frame.columns.values_mut() {
        let mut i = 0;
        column.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricePoint;

    fn series(symbol: &str, rows: &[(&str, f64)]) -> PriceSeries {
        PriceSeries::from_unsorted(
            symbol,
            rows.iter()
                .map(|(d, p)| {
                    PricePoint::new(NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap(), *p)
                })
                .collect(),
        )
    }

    #[test]
    fn align_fills_missing_with_nan() {
        let aligned = align_series(&[
            series(
                "SPY",
                &[
                    ("2024-01-02", 100.0),
                    ("2024-01-03", 101.0),
                    ("2024-01-04", 102.0),
                ],
            ),
            series("QQQ", &[("2024-01-02", 200.0), ("2024-01-04", 202.0)]),
        ]);

        assert_eq!(aligned.dates.len(), 3);
        assert_eq!(aligned.symbols, vec!["SPY", "QQQ"]);
        assert_eq!(aligned.column("SPY").unwrap()[1], 101.0);
        assert!(aligned.column("QQQ").unwrap()[1].is_nan());
    }

    #[test]
    fn fill_forward_then_backward() {
        let mut frame = align_series(&[
            series(
                "SPY",
                &[
                    ("2024-01-02", 100.0),
                    ("2024-01-03", 101.0),
                    ("2024-01-04", 102.0),
                    ("2024-01-05", 103.0),
                ],
            ),
            series("NEW", &[("2024-01-03", 50.0), ("2024-01-05", 52.0)]),
        ]);
        fill_gaps(&mut frame);
        assert_eq!(frame.column("NEW").unwrap(), &[50.0, 50.0, 50.0, 52.0]);
    }

    #[test]
    fn drops_empty_columns_and_incomplete_rows() {
        let mut frame = align_series(&[
            series("SPY", &[("2024-01-02", 100.0), ("2024-01-03", 101.0)]),
            series("DEAD", &[("2024-01-02", f64::NAN)]),
        ]);
        assert_eq!(frame.drop_empty_columns(), vec!["DEAD".to_string()]);
        assert_eq!(frame.symbols, vec!["SPY"]);

        frame.columns.get_mut("SPY").unwrap()[0] = f64::NAN;
        drop_incomplete_rows(&mut frame);
        assert_eq!(frame.dates.len(), 1);
        assert_eq!(frame.column("SPY").unwrap(), &[101.0]);
    }
}
