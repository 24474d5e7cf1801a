//! Dataset reconciliation.
//!
//! Fetches every requested symbol independently, joins the survivors on
//! date, fills gaps and enforces the minimum-history invariant. A failed
//! symbol is recorded and the run goes on; only a reconciled table missing
//! every symbol, every portfolio holding, or the benchmark is fatal.

use super::align::{align_series, drop_incomplete_rows, fill_gaps};
use super::fetch::SymbolFetcher;
use super::provider::DataError;
use crate::domain::{PriceSeries, PriceTable, TableError};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reason recorded for a symbol whose fetched series had no usable price.
pub const NO_VALID_DATA: &str = "no valid data in range";

/// Minimum number of aligned rows a backtest needs.
pub const DEFAULT_MIN_ROWS: usize = 20;

/// One symbol that could not be used, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub reason: String,
}

impl SymbolFailure {
    pub fn new(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SymbolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.symbol, self.reason)
    }
}

/// `"A: reason; B: reason"`.
pub fn join_failures(failures: &[SymbolFailure]) -> String {
    failures
        .iter()
        .map(SymbolFailure::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error, PartialEq)]
pub enum ReconcileError {
    #[error("Could not download data for any ticker. Failed: {}", join_failures(.failures))]
    NoData { failures: Vec<SymbolFailure> },

    #[error(
        "Insufficient data points (need at least {min_rows} trading days) for: {}. \
         Please adjust the start date or choose tickers with longer history.",
        .symbols.join(", ")
    )]
    InsufficientHistory { symbols: Vec<String>, min_rows: usize },

    #[error("No portfolio tickers found with valid data to perform backtest.")]
    NoPortfolioHoldings,

    #[error(
        "Benchmark ticker '{benchmark}' not found or has no valid data. Failed downloads: {}",
        join_failures(.failures)
    )]
    BenchmarkUnavailable {
        benchmark: String,
        failures: Vec<SymbolFailure>,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Output of a successful reconciliation.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub table: PriceTable,
    /// Portfolio symbols present in `table`, in request order.
    pub portfolio_symbols: Vec<String>,
    pub benchmark: String,
    /// Symbols dropped along the way. Non-empty means a partial success.
    pub failures: Vec<SymbolFailure>,
}

impl Reconciled {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn dropped_symbols(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.symbol.clone()).collect()
    }
}

/// Portfolio symbols followed by the benchmark, first occurrence wins.
pub fn request_order(portfolio: &[String], benchmark: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(portfolio.len() + 1);
    for symbol in portfolio.iter().map(String::as_str).chain(std::iter::once(benchmark)) {
        if !out.iter().any(|s| s == symbol) {
            out.push(symbol.to_string());
        }
    }
    out
}

pub struct Reconciler<'a> {
    fetcher: SymbolFetcher<'a>,
    min_rows: usize,
    parallel: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(fetcher: SymbolFetcher<'a>) -> Self {
        Self {
            fetcher,
            min_rows: DEFAULT_MIN_ROWS,
            parallel: true,
        }
    }

    pub fn with_min_rows(mut self, min_rows: usize) -> Self {
        self.min_rows = min_rows;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Fetch every symbol in `[start, end]`, keeping request order.
    ///
    /// Parallel fetches run on a pool with one thread per symbol, so a
    /// symbol sleeping through its backoff never holds up another.
    fn fetch_all(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<Result<PriceSeries, DataError>> {
        let fetcher = self.fetcher;
        let sequential = || -> Vec<Result<PriceSeries, DataError>> {
            symbols.iter().map(|s| fetcher.fetch(s, start, end)).collect()
        };
        if !self.parallel || symbols.len() < 2 {
            return sequential();
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(symbols.len())
            .thread_name(|i| format!("foliolab-fetch-{i}"))
            .build()
        {
            Ok(pool) => pool.install(|| {
                symbols
                    .par_iter()
                    .map(|s| fetcher.fetch(s, start, end))
                    .collect()
            }),
            Err(err) => {
                warn!(error = %err, "could not build fetch pool, fetching sequentially");
                sequential()
            }
        }
    }

    pub fn reconcile(
        &self,
        portfolio: &[String],
        benchmark: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Reconciled, ReconcileError> {
        let requested = request_order(portfolio, benchmark);
        info!(symbols = requested.len(), %start, %end, "fetching price histories");

        let mut series = Vec::with_capacity(requested.len());
        let mut failures = Vec::new();
        for (symbol, result) in requested.iter().zip(self.fetch_all(&requested, start, end)) {
            match result {
                Ok(s) => {
                    debug!(%symbol, rows = s.len(), "fetched");
                    series.push(s);
                }
                Err(err) => {
                    warn!(%symbol, error = %err, "fetch failed, dropping symbol");
                    failures.push(SymbolFailure::new(symbol, err.to_string()));
                }
            }
        }
        if series.is_empty() {
            return Err(ReconcileError::NoData { failures });
        }

        let mut frame = align_series(&series);
        for symbol in frame.drop_empty_columns() {
            warn!(%symbol, "no valid prices in range, dropping symbol");
            failures.push(SymbolFailure::new(symbol, NO_VALID_DATA));
        }
        if frame.symbols.is_empty() {
            return Err(ReconcileError::NoData { failures });
        }

        fill_gaps(&mut frame);
        drop_incomplete_rows(&mut frame);

        if frame.dates.len() < self.min_rows {
            let short: Vec<String> = frame
                .symbols
                .iter()
                .filter(|s| frame.valid_count(s) < self.min_rows)
                .cloned()
                .collect();
            return Err(ReconcileError::InsufficientHistory {
                symbols: short,
                min_rows: self.min_rows,
            });
        }

        let portfolio_symbols: Vec<String> = portfolio
            .iter()
            .filter(|s| frame.columns.contains_key(s.as_str()))
            .cloned()
            .collect();
        if portfolio_symbols.is_empty() {
            return Err(ReconcileError::NoPortfolioHoldings);
        }
        if !frame.columns.contains_key(benchmark) {
            return Err(ReconcileError::BenchmarkUnavailable {
                benchmark: benchmark.to_string(),
                failures,
            });
        }

        let dates = std::mem::take(&mut frame.dates);
        let table = PriceTable::new(dates, frame.into_columns())?;
        info!(
            rows = table.row_count(),
            symbols = table.symbols().len(),
            dropped = failures.len(),
            "reconciled price table"
        );

        Ok(Reconciled {
            table,
            portfolio_symbols,
            benchmark: benchmark.to_string(),
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::DataProvider;
    use crate::data::retry::RetryPolicy;
    use crate::domain::PricePoint;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// `rows` consecutive days of rising prices per known symbol.
    struct Fixed {
        known: Vec<(&'static str, usize)>,
    }

    impl DataProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<PriceSeries, DataError> {
            let (_, rows) = self
                .known
                .iter()
                .find(|(s, _)| *s == symbol)
                .ok_or_else(|| DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })?;
            let points = (0..*rows)
                .map(|i| {
                    PricePoint::new(start + chrono::Duration::days(i as i64), 10.0 + i as f64)
                })
                .collect();
            Ok(PriceSeries::from_unsorted(symbol, points))
        }
    }

    fn syms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn reconcile(
        provider: &Fixed,
        portfolio: &[&str],
        benchmark: &str,
    ) -> Result<Reconciled, ReconcileError> {
        let fetcher = SymbolFetcher::new(provider, RetryPolicy::immediate(2));
        Reconciler::new(fetcher)
            .with_parallel(false)
            .reconcile(&syms(portfolio), benchmark, d(2024, 1, 1), d(2024, 12, 31))
    }

    #[test]
    fn request_order_dedupes_benchmark() {
        assert_eq!(
            request_order(&syms(&["AAPL", "SPY", "AAPL"]), "SPY"),
            syms(&["AAPL", "SPY"])
        );
    }

    #[test]
    fn partial_failure_is_recorded() {
        let p = Fixed {
            known: vec![("AAPL", 30), ("SPY", 30)],
        };
        let r = reconcile(&p, &["AAPL", "BAD"], "SPY").unwrap();
        assert_eq!(r.portfolio_symbols, syms(&["AAPL"]));
        assert_eq!(r.dropped_symbols(), syms(&["BAD"]));
        assert_eq!(r.table.row_count(), 30);
        assert!(r.is_partial());
    }

    #[test]
    fn everything_failing_is_no_data() {
        let p = Fixed { known: vec![] };
        let err = reconcile(&p, &["A"], "B").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not download data for any ticker. Failed: A: symbol not found: A; B: symbol not found: B"
        );
    }

    #[test]
    fn short_history_names_every_symbol() {
        let p = Fixed {
            known: vec![("AAPL", 10), ("SPY", 10)],
        };
        let err = reconcile(&p, &["AAPL"], "SPY").unwrap_err();
        assert_eq!(
            err,
            ReconcileError::InsufficientHistory {
                symbols: syms(&["AAPL", "SPY"]),
                min_rows: 20,
            }
        );
        assert!(err.to_string().starts_with(
            "Insufficient data points (need at least 20 trading days) for: AAPL, SPY."
        ));
    }

    #[test]
    fn missing_benchmark_is_distinct() {
        let p = Fixed {
            known: vec![("AAPL", 30)],
        };
        let err = reconcile(&p, &["AAPL"], "NOPE").unwrap_err();
        assert!(matches!(err, ReconcileError::BenchmarkUnavailable { .. }));
        assert!(err
            .to_string()
            .starts_with("Benchmark ticker 'NOPE' not found or has no valid data."));
    }

    #[test]
    fn no_portfolio_survivor_is_fatal() {
        let p = Fixed {
            known: vec![("SPY", 30)],
        };
        let err = reconcile(&p, &["GONE"], "SPY").unwrap_err();
        assert_eq!(err, ReconcileError::NoPortfolioHoldings);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let p = Fixed {
            known: vec![("A", 25), ("B", 40), ("C", 30)],
        };
        let fetcher = SymbolFetcher::new(&p, RetryPolicy::immediate(1));
        let seq = Reconciler::new(fetcher)
            .with_parallel(false)
            .reconcile(&syms(&["A", "B"]), "C", d(2024, 1, 1), d(2024, 12, 31))
            .unwrap();
        let par = Reconciler::new(fetcher)
            .reconcile(&syms(&["A", "B"]), "C", d(2024, 1, 1), d(2024, 12, 31))
            .unwrap();
        assert_eq!(seq.table.dataset_hash(), par.table.dataset_hash());
        assert_eq!(seq.table.symbols(), par.table.symbols());
    }

    /// Blocks every fetch until all symbols are in flight at once, or
    /// gives up after a timeout.
    struct Rendezvous {
        expected: usize,
        in_flight: std::sync::Mutex<usize>,
        peak: std::sync::Mutex<usize>,
        all_in: std::sync::Condvar,
    }

    impl DataProvider for Rendezvous {
        fn name(&self) -> &str {
            "rendezvous"
        }

        fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<PriceSeries, DataError> {
            let mut n = self.in_flight.lock().unwrap();
            *n += 1;
            {
                let mut peak = self.peak.lock().unwrap();
                *peak = (*peak).max(*n);
            }
            self.all_in.notify_all();
            let (n, _) = self
                .all_in
                .wait_timeout_while(n, std::time::Duration::from_secs(5), |n| {
                    *n < self.expected
                })
                .unwrap();
            drop(n);
            let points = (0..25)
                .map(|i| PricePoint::new(start + chrono::Duration::days(i), 10.0 + i as f64))
                .collect();
            Ok(PriceSeries::from_unsorted(symbol, points))
        }
    }

    #[test]
    fn every_symbol_gets_its_own_fetch_thread() {
        let portfolio = syms(&["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K"]);
        let p = Rendezvous {
            expected: portfolio.len() + 1,
            in_flight: std::sync::Mutex::new(0),
            peak: std::sync::Mutex::new(0),
            all_in: std::sync::Condvar::new(),
        };
        let fetcher = SymbolFetcher::new(&p, RetryPolicy::immediate(1));
        let out = Reconciler::new(fetcher)
            .reconcile(&portfolio, "SPY", d(2024, 1, 1), d(2024, 12, 31))
            .unwrap();
        assert_eq!(out.table.symbols().len(), 12);
        assert_eq!(*p.peak.lock().unwrap(), 12);
    }
}
