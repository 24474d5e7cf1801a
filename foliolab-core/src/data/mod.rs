//! Price acquisition and reconciliation

pub mod align;
pub mod fetch;
pub mod provider;
pub mod reconcile;
pub mod retry;
pub mod start_date;
pub mod synthetic;
pub mod yahoo;

pub use align::{align_series, AlignedFrame};
pub use fetch::SymbolFetcher;
pub use provider::{DataError, DataProvider};
pub use reconcile::{
    join_failures, ReconcileError, Reconciled, Reconciler, SymbolFailure, DEFAULT_MIN_ROWS,
};
pub use retry::{RetryDecision, RetryPolicy};
pub use start_date::{resolve_start_date, ResolvedStart, StartSource};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
