//! FolioLab Runner — pipeline configuration, the backtest boundary, metrics.
//!
//! This crate builds on `foliolab-core` to provide:
//! - Pipeline configuration loaded from TOML
//! - Request validation ahead of any network call
//! - `run_portfolio_backtest()`, which turns a request into a result, an
//!   error, or a result with a warning
//! - Performance metrics and the flat metrics report
//! - Display-name lookup for presentation layers

pub mod config;
pub mod metrics;
pub mod names;
pub mod periods;
pub mod request;
pub mod result;
pub mod runner;

pub use config::{ConfigError, PipelineConfig, RetryConfig};
pub use metrics::{MetricPair, MetricRow, MetricUnit, MetricsReport};
pub use names::{display_name, display_names, truncate_name, NAME_NOT_FOUND};
pub use periods::{Period, PeriodReturn};
pub use request::{BacktestRequest, DEFAULT_BENCHMARK};
pub use result::{BacktestOutcome, BacktestResult, PipelineError};
pub use runner::{partial_data_warning, run_portfolio_backtest};
