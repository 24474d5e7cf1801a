//! FolioLab CLI — portfolio backtests from the command line.
//!
//! Commands:
//! - `run` — backtest a weighted portfolio against a benchmark and print
//!   the warning or error, the portfolio, display names and statistics
//! - `names` — look up display names for symbols

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use foliolab_core::data::{DataProvider, StartSource, SyntheticProvider, YahooProvider};
use foliolab_runner::request::normalize_symbol;
use foliolab_runner::{
    display_names, run_portfolio_backtest, BacktestRequest, BacktestResult, MetricUnit,
    PipelineConfig, DEFAULT_BENCHMARK,
};

/// Crates whose debug output drowns ours.
const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls"];

#[derive(Parser)]
#[command(
    name = "foliolab",
    about = "FolioLab CLI — buy-and-hold portfolio backtests against a benchmark"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest a portfolio at fixed target weights.
    Run {
        /// Comma-separated ticker symbols (e.g., AAPL,MSFT,GOOG).
        #[arg(long, required = true, value_delimiter = ',')]
        tickers: Vec<String>,

        /// Comma-separated allocations in percent, parallel to --tickers (e.g., 50,30,20).
        #[arg(long, required = true, value_delimiter = ',')]
        allocations: Vec<f64>,

        /// Benchmark symbol.
        #[arg(long, default_value = DEFAULT_BENCHMARK)]
        benchmark: String,

        /// Start date (YYYY-MM-DD). Defaults to the latest first-trading date of all symbols.
        #[arg(long)]
        start_date: Option<String>,

        /// Pipeline config (TOML). Defaults apply to anything not set.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use deterministic synthetic prices instead of Yahoo Finance.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Print the full result as JSON instead of the summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Look up display names for symbols.
    Names {
        #[arg(required = true)]
        symbols: Vec<String>,

        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            tickers,
            allocations,
            benchmark,
            start_date,
            config,
            synthetic,
            json,
        } => run_cmd(
            tickers,
            allocations,
            benchmark,
            start_date,
            config,
            synthetic,
            json,
        ),
        Commands::Names { symbols, synthetic } => {
            let config = PipelineConfig::default();
            let provider = build_provider(synthetic, &config)?;
            let symbols: Vec<String> = symbols.iter().map(|s| normalize_symbol(s)).collect();
            for (symbol, name) in display_names(provider.as_ref(), &symbols) {
                println!("{symbol:<8} {name}");
            }
            Ok(())
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut directives = String::from(if verbose { "debug" } else { "info" });
        for module in NOISY_MODULES {
            directives.push_str(&format!(",{module}=warn"));
        }
        EnvFilter::new(directives)
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_provider(synthetic: bool, config: &PipelineConfig) -> Result<Box<dyn DataProvider>> {
    if synthetic {
        return Ok(Box::new(SyntheticProvider::new()));
    }
    let provider = YahooProvider::new(config.request_timeout())
        .context("failed to initialize Yahoo Finance provider")?;
    Ok(Box::new(provider))
}

fn run_cmd(
    tickers: Vec<String>,
    allocations: Vec<f64>,
    benchmark: String,
    start_date: Option<String>,
    config_path: Option<PathBuf>,
    synthetic: bool,
    json: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => PipelineConfig::from_file(&path)?,
        None => PipelineConfig::default(),
    };

    let weights: Vec<f64> = allocations.iter().map(|pct| pct / 100.0).collect();
    let mut request = BacktestRequest::new(&tickers, weights, &benchmark);
    if let Some(s) = start_date {
        let date = NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .with_context(|| format!("invalid --start-date '{s}', expected YYYY-MM-DD"))?;
        request = request.with_start_date(date);
    }

    let provider = build_provider(synthetic, &config)?;
    let today = chrono::Local::now().date_naive();
    let outcome = run_portfolio_backtest(&request, provider.as_ref(), &config, today);

    let (result, warning) = match outcome.into_result() {
        Ok(pair) => pair,
        Err(err) => bail!("Backtest Error: {err}"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if let Some(w) = &warning {
        println!("Warning: {w}");
    }
    let names = display_names(provider.as_ref(), &request.symbols);
    print_summary(&request, &result, &names);
    Ok(())
}

fn format_value(value: Option<f64>, unit: MetricUnit) -> String {
    match (value, unit) {
        (None, _) => "N/A".to_string(),
        (Some(v), MetricUnit::Percent) => format!("{:.2}%", v * 100.0),
        (Some(v), MetricUnit::Ratio) => format!("{v:.3}"),
    }
}

fn print_summary(request: &BacktestRequest, result: &BacktestResult, names: &[(String, String)]) {
    println!();
    println!("=== Backtest Result ===");
    println!("Portfolio:      {}", holdings_line(request));
    for (symbol, name) in names {
        println!("  {symbol:<8} {name}");
    }
    println!("Benchmark:      {}", result.benchmark_symbol);
    let start_note = match result.start_source {
        StartSource::Explicit => "",
        StartSource::Resolved => " (latest common listing)",
        StartSource::Fallback => " (default lookback)",
    };
    println!(
        "Period:         {} to {}{start_note}",
        result.start_date, result.end_date
    );
    println!("Trading days:   {}", result.row_count);
    println!("Provider:       {}", result.provider);
    if !result.failures.is_empty() {
        let simulated: Vec<String> = result
            .allocation
            .iter()
            .map(|(s, w)| format!("{s} {:.2}%", w * 100.0))
            .collect();
        println!("Simulated:      {}", simulated.join(", "));
    }

    println!();
    println!("--- Performance ---");
    println!("{:<24} {:>12} {:>12}", "", "Portfolio", "Benchmark");
    println!("{}", "-".repeat(50));
    for row in result.metrics.rows() {
        let bench = if row.paired {
            format_value(row.benchmark, row.unit)
        } else {
            String::new()
        };
        println!(
            "{:<24} {:>12} {:>12}",
            row.name,
            format_value(row.portfolio, row.unit),
            bench
        );
    }

    if !result.metrics.quarterly_returns.is_empty() {
        println!();
        println!("--- Quarterly Returns (Portfolio) ---");
        for q in &result.metrics.quarterly_returns {
            println!("{:<10} {:>9.2}%", q.label, q.value * 100.0);
        }
    }
    println!();
}

/// Requested weights in request order, e.g. `AAPL 60.00%, MSFT 40.00%`.
fn holdings_line(request: &BacktestRequest) -> String {
    request
        .symbols
        .iter()
        .zip(&request.weights)
        .map(|(s, w)| format!("{s} {:.2}%", w * 100.0))
        .collect::<Vec<_>>()
        .join(", ")
}
