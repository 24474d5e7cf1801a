//! Criterion benchmarks for FolioLab hot paths.
//!
//! Benchmarks:
//! 1. Reconciliation (fetch, align, fill) against the synthetic provider
//! 2. Buy-and-hold simulation over a reconciled table

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chrono::NaiveDate;
use foliolab_core::data::{Reconciler, RetryPolicy, SymbolFetcher, SyntheticProvider};
use foliolab_core::domain::{AllocationSet, PriceTable, BASE_VALUE};
use foliolab_core::engine::simulate;

// ── Helpers ──────────────────────────────────────────────────────────

fn symbols(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("SYM{i}")).collect()
}

fn equal_weights(symbols: &[String]) -> AllocationSet {
    let w = vec![1.0 / symbols.len() as f64; symbols.len()];
    AllocationSet::from_pairs(symbols, &w).unwrap()
}

fn make_table(n_symbols: usize, rows: usize) -> PriceTable {
    let start = NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
    let dates = (0..rows)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    let mut columns: Vec<(String, Vec<f64>)> = symbols(n_symbols)
        .into_iter()
        .enumerate()
        .map(|(k, s)| {
            let col = (0..rows)
                .map(|i| 100.0 + ((i + k * 7) as f64 * 0.05).sin() * 10.0 + i as f64 * 0.01)
                .collect();
            (s, col)
        })
        .collect();
    columns.push((
        "SPY".to_string(),
        (0..rows).map(|i| 300.0 + i as f64 * 0.1).collect(),
    ));
    PriceTable::new(dates, columns).unwrap()
}

// ── 1. Reconciliation ────────────────────────────────────────────────

fn bench_reconcile(c: &mut Criterion) {
    let provider = SyntheticProvider::new();
    let start = NaiveDate::from_ymd_opt(2014, 1, 2).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

    let mut group = c.benchmark_group("reconcile");
    for n in [2usize, 10, 25] {
        let portfolio = symbols(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &portfolio, |b, portfolio| {
            let fetcher = SymbolFetcher::new(&provider, RetryPolicy::immediate(1));
            let reconciler = Reconciler::new(fetcher);
            b.iter(|| {
                black_box(
                    reconciler
                        .reconcile(portfolio, "SPY", start, end)
                        .unwrap(),
                )
            });
        });
    }
    group.finish();
}

// ── 2. Simulation ────────────────────────────────────────────────────

fn bench_simulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate");
    for rows in [252usize, 2520, 7560] {
        let table = make_table(10, rows);
        let alloc = equal_weights(&symbols(10));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| black_box(simulate(table, &alloc, "SPY", BASE_VALUE).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_reconcile, bench_simulate);
criterion_main!(benches);
