//! FolioLab Core — domain types, price acquisition, reconciliation and the
//! buy-and-hold engine.
//!
//! This crate contains everything below the pipeline boundary:
//! - Domain types (price series, price tables, allocations, equity curves)
//! - Data providers (Yahoo Finance, synthetic) behind the `DataProvider` trait
//! - Retry policy and per-symbol fetcher
//! - Start-date resolution and dataset reconciliation
//! - Portfolio and benchmark simulation

pub mod data;
pub mod domain;
pub mod engine;
