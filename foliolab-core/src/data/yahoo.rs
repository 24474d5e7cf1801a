//! Yahoo Finance data provider.
//!
//! Fetches daily adjusted closes from Yahoo's v8 chart API. Each call is a
//! single HTTP request; transient failures are classified here and retried
//! by [`SymbolFetcher`](super::fetch::SymbolFetcher).
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use super::provider::{DataError, DataProvider};
use crate::domain::{PricePoint, PriceSeries};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const CHART_BASE: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
    gmtoffset: Option<i64>,
    long_name: Option<String>,
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Option<Vec<QuoteData>>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
}

impl YahooProvider {
    pub fn new(timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Build the chart API URL for a symbol and date range.
    fn range_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = (end + chrono::Duration::days(1))
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "{CHART_BASE}/{symbol}?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true&events=div%2Csplit"
        )
    }

    fn max_range_url(symbol: &str) -> String {
        format!("{CHART_BASE}/{symbol}?range=max&interval=1d&includeAdjustedClose=true")
    }

    fn meta_url(symbol: &str) -> String {
        format!("{CHART_BASE}/{symbol}?range=5d&interval=1d")
    }

    /// Issue one GET and map transport and status failures onto [`DataError`].
    fn get_chart(&self, symbol: &str, url: &str) -> Result<ChartData, DataError> {
        debug!(%symbol, %url, "GET chart");
        let resp = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                DataError::Timeout(format!("{symbol}: {e}"))
            } else {
                DataError::NetworkUnreachable(e.to_string())
            }
        })?;

        let status = resp.status();
        match status.as_u16() {
            429 => {
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
            }
            401 | 403 => {
                return Err(DataError::AuthenticationRequired(format!(
                    "Yahoo Finance refused the request for {symbol} (HTTP {status})"
                )))
            }
            400 | 422 => {
                return Err(DataError::InvalidRequest(format!(
                    "HTTP {status} for {symbol}"
                )))
            }
            500..=599 => {
                return Err(DataError::ServiceUnavailable(format!(
                    "HTTP {status} for {symbol}"
                )))
            }
            _ => {}
        }

        // 404 still carries a chart error body naming the cause.
        let body = resp.text().map_err(|e| {
            if e.is_timeout() {
                DataError::Timeout(format!("{symbol}: {e}"))
            } else {
                DataError::NetworkUnreachable(e.to_string())
            }
        })?;
        let chart: ChartResponse = serde_json::from_str(&body).map_err(|e| {
            if status.as_u16() == 404 {
                DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                }
            } else {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse response for {symbol}: {e}"
                ))
            }
        })?;
        Self::first_result(symbol, chart)
    }

    fn first_result(symbol: &str, resp: ChartResponse) -> Result<ChartData, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => DataError::InvalidRequest(format!("{}: {}", err.code, err.description)),
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))
    }

    /// Turn one chart payload into a price series.
    ///
    /// Prefers adjusted closes and falls back to raw closes when the payload
    /// has no adjusted column. Rows with neither are dropped.
    fn parse_series(symbol: &str, start: NaiveDate, data: ChartData) -> Result<PriceSeries, DataError> {
        let meta = data.meta.ok_or_else(|| DataError::TimezoneMissing {
            symbol: symbol.to_string(),
        })?;
        if meta.exchange_timezone_name.is_none() {
            return Err(DataError::TimezoneMissing {
                symbol: symbol.to_string(),
            });
        }
        let offset = meta.gmtoffset.unwrap_or(0);

        let missing = || DataError::PricesMissing {
            symbol: symbol.to_string(),
            start,
        };
        let timestamps = data.timestamp.ok_or_else(missing)?;
        let indicators = data.indicators.ok_or_else(missing)?;

        let adj = indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);
        let raw = indicators
            .quote
            .and_then(|v| v.into_iter().next())
            .and_then(|q| q.close);
        let closes = adj.or(raw).ok_or_else(missing)?;

        let mut points = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let Some(price) = closes.get(i).copied().flatten() else {
                continue;
            };
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;
            points.push(PricePoint::new(date, price));
        }

        if points.is_empty() {
            return Err(missing());
        }
        Ok(PriceSeries::from_unsorted(symbol, points))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let data = self.get_chart(symbol, &Self::range_url(symbol, start, end))?;
        Self::parse_series(symbol, start, data)
    }

    fn fetch_max_history(
        &self,
        symbols: &[String],
        _end: NaiveDate,
    ) -> Result<Vec<Result<PriceSeries, DataError>>, DataError> {
        let earliest = super::provider::earliest_history();
        Ok(symbols
            .iter()
            .map(|symbol| {
                let data = self.get_chart(symbol, &Self::max_range_url(symbol))?;
                Self::parse_series(symbol, earliest, data)
            })
            .collect())
    }

    fn display_name(&self, symbol: &str) -> Result<Option<String>, DataError> {
        let data = self.get_chart(symbol, &Self::meta_url(symbol))?;
        Ok(data.meta.and_then(|m| m.long_name.or(m.short_name)))
    }
}
