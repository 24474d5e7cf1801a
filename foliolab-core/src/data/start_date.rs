//! Start-date resolution for runs without an explicit start.
//!
//! The common start is the latest "first available" date across all
//! requested symbols, so every column has data from day one. Lookup
//! failures never abort a run; they fall back to a fixed lookback.

use super::provider::DataProvider;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Where a resolved start date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartSource {
    /// Supplied by the caller.
    Explicit,
    /// Latest first-valid date across the batch.
    Resolved,
    /// Batch lookup failed; `today - lookback`.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStart {
    pub date: NaiveDate,
    pub source: StartSource,
}

/// `today - 365 * years` days.
pub fn fallback_start(today: NaiveDate, lookback_years: u32) -> NaiveDate {
    today - chrono::Duration::days(365 * i64::from(lookback_years))
}

/// Resolve the common start date for `symbols`.
///
/// Issues one batched maximum-history call. Symbols the batch could not
/// serve are skipped. If the call itself errors, or no symbol in the batch
/// has a single valid price, falls back to [`fallback_start`] and logs a
/// warning.
pub fn resolve_start_date(
    provider: &dyn DataProvider,
    symbols: &[String],
    today: NaiveDate,
    lookback_years: u32,
) -> ResolvedStart {
    let fallback = || ResolvedStart {
        date: fallback_start(today, lookback_years),
        source: StartSource::Fallback,
    };

    let batch = match provider.fetch_max_history(symbols, today) {
        Ok(batch) => batch,
        Err(err) => {
            let resolved = fallback();
            warn!(error = %err, fallback = %resolved.date, "start-date lookup failed, using fallback");
            return resolved;
        }
    };

    let mut first_dates = Vec::with_capacity(batch.len());
    for (symbol, entry) in symbols.iter().zip(&batch) {
        match entry {
            Ok(series) => first_dates.extend(series.first_valid_date()),
            Err(err) => warn!(%symbol, error = %err, "no history for start-date lookup, skipping"),
        }
    }

    match first_dates.into_iter().max() {
        Some(date) => {
            info!(%date, symbols = symbols.len(), "resolved common start date");
            ResolvedStart {
                date,
                source: StartSource::Resolved,
            }
        }
        None => {
            let resolved = fallback();
            warn!(fallback = %resolved.date, "start-date lookup returned no valid prices, using fallback");
            resolved
        }
    }
}
