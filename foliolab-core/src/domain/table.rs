//! PriceTable — the reconciled, gap-free price matrix a backtest runs on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("column '{symbol}' has {len} rows but the date axis has {expected}")]
    RaggedColumn {
        symbol: String,
        len: usize,
        expected: usize,
    },

    #[error("column '{symbol}' contains a missing price at row {row}")]
    MissingValue { symbol: String, row: usize },

    #[error("symbol '{0}' appears more than once")]
    DuplicateSymbol(String),
}

/// Prices for several symbols on a shared date axis.
///
/// Every column has exactly one finite price per date. Symbols keep the
/// order they were requested in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    columns: HashMap<String, Vec<f64>>,
}

impl PriceTable {
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, TableError> {
        let mut symbols = Vec::with_capacity(columns.len());
        let mut map = HashMap::with_capacity(columns.len());

        for (symbol, values) in columns {
            if values.len() != dates.len() {
                return Err(TableError::RaggedColumn {
                    symbol,
                    len: values.len(),
                    expected: dates.len(),
                });
            }
            if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                return Err(TableError::MissingValue { symbol, row });
            }
            if map.contains_key(&symbol) {
                return Err(TableError::DuplicateSymbol(symbol));
            }
            symbols.push(symbol.clone());
            map.insert(symbol, values);
        }

        Ok(Self {
            dates,
            symbols,
            columns: map,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.columns.get(symbol).map(|v| v.as_slice())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.columns.contains_key(symbol)
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Deterministic BLAKE3 hash over dates and prices in symbol order.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for date in &self.dates {
            hasher.update(date.to_string().as_bytes());
        }
        for symbol in &self.symbols {
            hasher.update(symbol.as_bytes());
            if let Some(values) = self.columns.get(symbol) {
                for v in values {
                    hasher.update(&v.to_le_bytes());
                }
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}
