//! Domain types for FolioLab

pub mod allocation;
pub mod curve;
pub mod series;
pub mod table;

pub use allocation::{AllocationError, AllocationSet, WEIGHT_TOLERANCE};
pub use curve::{EquityCurve, StrategyKind, BASE_VALUE};
pub use series::{PricePoint, PriceSeries, SeriesError};
pub use table::{PriceTable, TableError};

/// Symbol type alias
pub type Symbol = String;
