//! Symbol fetcher — one provider call per attempt, driven by a retry policy.

use super::provider::{DataError, DataProvider};
use super::retry::RetryPolicy;
use crate::domain::PriceSeries;
use chrono::NaiveDate;

/// Fetches single symbols through a provider, retrying transient failures.
#[derive(Clone, Copy)]
pub struct SymbolFetcher<'a> {
    provider: &'a dyn DataProvider,
    policy: RetryPolicy,
}

impl<'a> SymbolFetcher<'a> {
    pub fn new(provider: &'a dyn DataProvider, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn provider(&self) -> &'a dyn DataProvider {
        self.provider
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch `[start, end]` for one symbol.
    ///
    /// A response without a single usable price counts as a transient
    /// "prices missing" failure so it goes through the retry loop.
    pub fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        self.policy.run(symbol, |_| {
            let series = self.provider.fetch(symbol, start, end)?;
            if series.valid_count() == 0 {
                return Err(DataError::PricesMissing {
                    symbol: symbol.to_string(),
                    start,
                });
            }
            Ok(series)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricePoint;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Returns empty series for the first `empty_for` calls.
    struct Flaky {
        calls: AtomicU32,
        empty_for: u32,
    }

    impl DataProvider for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<PriceSeries, DataError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.empty_for {
                return Ok(PriceSeries::from_unsorted(symbol, vec![]));
            }
            Ok(PriceSeries::from_unsorted(
                symbol,
                vec![PricePoint::new(start, 10.0)],
            ))
        }
    }

    fn d() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn empty_result_is_retried() {
        let provider = Flaky {
            calls: AtomicU32::new(0),
            empty_for: 2,
        };
        let fetcher = SymbolFetcher::new(&provider, RetryPolicy::immediate(5));
        let series = fetcher.fetch("SPY", d(), d()).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn persistent_empty_surfaces_prices_missing() {
        let provider = Flaky {
            calls: AtomicU32::new(0),
            empty_for: u32::MAX,
        };
        let fetcher = SymbolFetcher::new(&provider, RetryPolicy::immediate(5));
        let err = fetcher.fetch("SPY", d(), d()).unwrap_err();
        assert!(matches!(err, DataError::PricesMissing { .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
    }
}
