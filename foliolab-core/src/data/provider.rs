//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over price sources (Yahoo Finance, the
//! synthetic generator, scripted test doubles) so the pipeline never depends
//! on a concrete network client. Providers make exactly one attempt per call;
//! retrying is the fetcher's job.

use crate::domain::PriceSeries;
use chrono::NaiveDate;
use thiserror::Error;

/// Earliest date a "maximum history" request reaches back to.
pub fn earliest_history() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Structured error types for data operations.
///
/// Displayable in CLI output and embedded verbatim in pipeline warnings.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DataError {
    #[error("no price data returned for {symbol} starting {start}")]
    PricesMissing { symbol: String, start: NaiveDate },

    #[error("{symbol}: no timezone found, symbol may be delisted")]
    TimezoneMissing { symbol: String },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("provider temporarily unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Whether a later attempt might succeed.
    ///
    /// Missing prices, missing time-zone metadata, timeouts, throttling and
    /// 5xx responses are transient. Everything else is permanent.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DataError::PricesMissing { .. }
                | DataError::TimezoneMissing { .. }
                | DataError::Timeout(_)
                | DataError::RateLimited { .. }
                | DataError::ServiceUnavailable(_)
        )
    }
}

/// Trait for price providers.
///
/// Implementations handle the specifics of one source. They never retry and
/// never cache.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily adjusted closes for one symbol over `[start, end]`.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<PriceSeries, DataError>;

    /// Fetch the longest history available for every symbol in one batch.
    ///
    /// The outer error is reserved for the batch call itself failing. A
    /// symbol that cannot be served gets its own `Err` entry, in request
    /// order, and does not affect the others.
    fn fetch_max_history(
        &self,
        symbols: &[String],
        end: NaiveDate,
    ) -> Result<Vec<Result<PriceSeries, DataError>>, DataError> {
        Ok(symbols
            .iter()
            .map(|symbol| self.fetch(symbol, earliest_history(), end))
            .collect())
    }

    /// Display name for a symbol (company or fund name), if the source knows it.
    fn display_name(&self, _symbol: &str) -> Result<Option<String>, DataError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(DataError::PricesMissing {
            symbol: "X".into(),
            start: d
        }
        .is_transient());
        assert!(DataError::TimezoneMissing { symbol: "X".into() }.is_transient());
        assert!(DataError::Timeout("30s".into()).is_transient());
        assert!(!DataError::SymbolNotFound { symbol: "X".into() }.is_transient());
        assert!(!DataError::InvalidRequest("bad".into()).is_transient());
        assert!(!DataError::ResponseFormatChanged("?".into()).is_transient());
    }

    #[test]
    fn earliest_history_is_1900() {
        assert_eq!(earliest_history().to_string(), "1900-01-01");
    }
}
