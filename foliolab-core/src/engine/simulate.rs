//! Portfolio and benchmark simulation over a reconciled price table.

use super::holdings::Holdings;
use super::EngineError;
use crate::domain::{AllocationSet, EquityCurve, PriceTable, StrategyKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Both equity curves of one run, on the table's date axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub portfolio: EquityCurve,
    pub benchmark: EquityCurve,
}

/// The benchmark's own price path rebased to `base`: `base * (p[i] / p[0])`.
///
/// The ratio is taken first so row 0 is exactly `base`.
pub fn benchmark_curve(
    table: &PriceTable,
    symbol: &str,
    base: f64,
) -> Result<EquityCurve, EngineError> {
    let column = table
        .column(symbol)
        .ok_or_else(|| EngineError::MissingColumn(symbol.to_string()))?;
    let first = *column.first().ok_or(EngineError::EmptyTable)?;
    if !(first.is_finite() && first > 0.0) {
        return Err(EngineError::InvalidStartPrice {
            symbol: symbol.to_string(),
            price: first,
        });
    }

    Ok(EquityCurve {
        kind: StrategyKind::Benchmark,
        dates: table.dates().to_vec(),
        values: column.iter().map(|p| base * (p / first)).collect(),
    })
}

/// Buy `allocation` at the first row and hold it to the last.
///
/// Row 0 is the purchase row and is worth exactly `base`; marking it to
/// market would only add rounding from the per-holding sum.
pub fn portfolio_curve(
    table: &PriceTable,
    allocation: &AllocationSet,
    base: f64,
) -> Result<EquityCurve, EngineError> {
    let holdings = Holdings::open(table, allocation, base)?;
    let values = (0..table.row_count())
        .map(|row| if row == 0 { base } else { holdings.value_at(table, row) })
        .collect();

    Ok(EquityCurve {
        kind: StrategyKind::Portfolio,
        dates: table.dates().to_vec(),
        values,
    })
}

/// Simulate the portfolio and the benchmark side by side.
pub fn simulate(
    table: &PriceTable,
    allocation: &AllocationSet,
    benchmark: &str,
    base: f64,
) -> Result<Simulation, EngineError> {
    let portfolio = portfolio_curve(table, allocation, base)?;
    let benchmark = benchmark_curve(table, benchmark, base)?;
    debug!(
        rows = table.row_count(),
        portfolio_end = ?portfolio.last_value(),
        benchmark_end = ?benchmark.last_value(),
        "simulation finished"
    );
    Ok(Simulation {
        portfolio,
        benchmark,
    })
}
