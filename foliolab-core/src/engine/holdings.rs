//! Buy-and-hold holdings: units bought once at the first row, plus idle cash.

use super::EngineError;
use crate::domain::{AllocationSet, PriceTable};

/// Positions opened at the first table row and never traded again.
///
/// Units are fractional. Weight the allocation leaves unassigned stays in
/// cash and earns nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Holdings {
    cash: f64,
    units: Vec<(String, f64)>,
}

impl Holdings {
    /// Spend `capital` across `allocation` at the first row's prices.
    pub fn open(
        table: &PriceTable,
        allocation: &AllocationSet,
        capital: f64,
    ) -> Result<Self, EngineError> {
        if table.is_empty() {
            return Err(EngineError::EmptyTable);
        }
        if allocation.is_empty() {
            return Err(EngineError::NoHoldings);
        }

        let mut units = Vec::with_capacity(allocation.len());
        let mut invested = 0.0;
        for (symbol, weight) in allocation.iter() {
            let column = table
                .column(symbol)
                .ok_or_else(|| EngineError::MissingColumn(symbol.to_string()))?;
            let start = column[0];
            if !(start.is_finite() && start > 0.0) {
                return Err(EngineError::InvalidStartPrice {
                    symbol: symbol.to_string(),
                    price: start,
                });
            }
            units.push((symbol.to_string(), capital * weight / start));
            invested += weight;
        }

        Ok(Self {
            cash: capital * (1.0 - invested),
            units,
        })
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn units(&self, symbol: &str) -> Option<f64> {
        self.units.iter().find(|(s, _)| s == symbol).map(|(_, u)| *u)
    }

    /// Mark-to-market value at `row`.
    ///
    /// Callers guarantee every held symbol is a column of `table`.
    pub fn value_at(&self, table: &PriceTable, row: usize) -> f64 {
        let positions: f64 = self
            .units
            .iter()
            .map(|(symbol, units)| {
                let price = table.column(symbol).map(|c| c[row]).unwrap_or(0.0);
                units * price
            })
            .sum();
        self.cash + positions
    }
}
