//! Backtest runner — wires together validation, reconciliation, the engine
//! and metrics.
//!
//! `run_portfolio_backtest()` is the public boundary: it never returns a
//! Rust error and never unwinds. Whatever happens inside ends up as a
//! [`BacktestOutcome`].

use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::NaiveDate;
use tracing::{info, warn};

use foliolab_core::data::reconcile::request_order;
use foliolab_core::data::{
    join_failures, resolve_start_date, DataProvider, Reconciler, ResolvedStart, StartSource,
    SymbolFetcher,
};
use foliolab_core::engine::simulate;

use crate::config::PipelineConfig;
use crate::metrics::MetricsReport;
use crate::request::BacktestRequest;
use crate::result::{BacktestOutcome, BacktestResult, PipelineError, SCHEMA_VERSION};

/// Warning attached to a result when some symbols were dropped.
pub fn partial_data_warning(failures: &[foliolab_core::data::SymbolFailure]) -> String {
    format!(
        "Backtest completed with some data issues. Failed downloads: {}",
        join_failures(failures)
    )
}

/// Run one portfolio backtest end to end.
///
/// `today` is the last date requested from the provider and the anchor of
/// the fallback start date.
pub fn run_portfolio_backtest(
    request: &BacktestRequest,
    provider: &dyn DataProvider,
    config: &PipelineConfig,
    today: NaiveDate,
) -> BacktestOutcome {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        run_pipeline(request, provider, config, today)
    }));
    match outcome {
        Ok(Ok((result, warning))) => BacktestOutcome::Completed {
            result: Box::new(result),
            warning,
        },
        Ok(Err(err)) => BacktestOutcome::Failed(err),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic with non-string payload".to_string());
            warn!(%msg, "backtest panicked");
            BacktestOutcome::Failed(PipelineError::Unexpected(msg))
        }
    }
}

fn run_pipeline(
    request: &BacktestRequest,
    provider: &dyn DataProvider,
    config: &PipelineConfig,
    today: NaiveDate,
) -> Result<(BacktestResult, Option<String>), PipelineError> {
    let allocation = request
        .allocation(config.weight_tolerance)
        .map_err(PipelineError::InvalidInput)?;
    info!(
        holdings = allocation.len(),
        benchmark = %request.benchmark,
        provider = provider.name(),
        "validated backtest request"
    );

    let start = match request.start_date {
        Some(date) => ResolvedStart {
            date,
            source: StartSource::Explicit,
        },
        None => resolve_start_date(
            provider,
            &request_order(&request.symbols, &request.benchmark),
            today,
            config.fallback_lookback_years,
        ),
    };

    let fetcher = SymbolFetcher::new(provider, config.retry_policy());
    let reconciled = Reconciler::new(fetcher)
        .with_min_rows(config.min_history_rows)
        .with_parallel(config.parallel_fetch)
        .reconcile(&request.symbols, &request.benchmark, start.date, today)?;

    let normalized = allocation
        .normalize_to(&reconciled.portfolio_symbols, config.weight_tolerance)
        .map_err(PipelineError::Allocation)?;
    if normalized.len() < allocation.len() {
        info!(
            kept = normalized.len(),
            requested = allocation.len(),
            total = normalized.total(),
            "renormalized allocation to surviving holdings"
        );
    }

    let sim = simulate(
        &reconciled.table,
        &normalized,
        &reconciled.benchmark,
        config.base_value,
    )
    .map_err(|e| PipelineError::Unexpected(e.to_string()))?;

    let metrics = MetricsReport::compute(
        &sim.portfolio,
        &sim.benchmark,
        config.trading_days_per_year,
    );
    info!(
        rows = reconciled.table.row_count(),
        total_return = ?metrics.total_return.portfolio,
        "backtest complete"
    );

    let warning = reconciled
        .is_partial()
        .then(|| partial_data_warning(&reconciled.failures));
    if let Some(w) = &warning {
        warn!("{w}");
    }

    let result = BacktestResult {
        schema_version: SCHEMA_VERSION,
        dataset_hash: reconciled.table.dataset_hash(),
        row_count: reconciled.table.row_count(),
        start_date: reconciled.table.first_date().unwrap_or(start.date),
        end_date: reconciled.table.last_date().unwrap_or(today),
        start_source: start.source,
        portfolio: sim.portfolio,
        benchmark: sim.benchmark,
        metrics,
        allocation: normalized,
        benchmark_symbol: reconciled.benchmark,
        failures: reconciled.failures,
        provider: provider.name().to_string(),
    };
    Ok((result, warning))
}
