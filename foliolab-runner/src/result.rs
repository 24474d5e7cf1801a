//! Backtest result and the outcome returned across the pipeline boundary.

use chrono::NaiveDate;
use foliolab_core::data::{ReconcileError, StartSource, SymbolFailure};
use foliolab_core::domain::{AllocationError, AllocationSet, EquityCurve};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::MetricsReport;

/// Current schema version for serialized results.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Complete result of one portfolio backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub portfolio: EquityCurve,
    pub benchmark: EquityCurve,
    pub metrics: MetricsReport,
    /// Weights actually simulated, after dropping and rescaling.
    pub allocation: AllocationSet,
    pub benchmark_symbol: String,
    pub start_date: NaiveDate,
    pub start_source: StartSource,
    pub end_date: NaiveDate,
    /// Symbols dropped during reconciliation, with reasons.
    pub failures: Vec<SymbolFailure>,
    pub dataset_hash: String,
    pub provider: String,
    pub row_count: usize,
}

impl BacktestResult {
    pub fn dropped_symbols(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.symbol.as_str()).collect()
    }
}

/// Why a backtest produced no result.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    /// Rejected before any data was fetched.
    #[error(transparent)]
    InvalidInput(AllocationError),

    /// Data conditions with their own user-facing message.
    #[error(transparent)]
    Data(ReconcileError),

    /// Nothing left to hold once unavailable symbols were removed.
    #[error(transparent)]
    Allocation(AllocationError),

    /// Engine failures and panics.
    #[error("Unexpected error during backtest: {0}")]
    Unexpected(String),
}

/// Either a result (possibly with a warning) or an error, never both.
#[derive(Debug)]
pub enum BacktestOutcome {
    Completed {
        result: Box<BacktestResult>,
        warning: Option<String>,
    },
    Failed(PipelineError),
}

impl BacktestOutcome {
    pub fn result(&self) -> Option<&BacktestResult> {
        match self {
            BacktestOutcome::Completed { result, .. } => Some(result),
            BacktestOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            BacktestOutcome::Completed { .. } => None,
            BacktestOutcome::Failed(err) => Some(err),
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            BacktestOutcome::Completed { warning, .. } => warning.as_deref(),
            BacktestOutcome::Failed(_) => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, BacktestOutcome::Completed { .. })
    }

    /// Split into the result and its warning, or the error.
    pub fn into_result(self) -> Result<(BacktestResult, Option<String>), PipelineError> {
        match self {
            BacktestOutcome::Completed { result, warning } => Ok((*result, warning)),
            BacktestOutcome::Failed(err) => Err(err),
        }
    }
}

impl From<ReconcileError> for PipelineError {
    /// A table that fails its own invariants after reconciliation is a bug,
    /// not a data condition.
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Table(table) => PipelineError::Unexpected(table.to_string()),
            other => PipelineError::Data(other),
        }
    }
}

impl From<PipelineError> for BacktestOutcome {
    fn from(err: PipelineError) -> Self {
        BacktestOutcome::Failed(err)
    }
}
