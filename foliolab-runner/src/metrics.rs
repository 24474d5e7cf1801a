//! Performance metrics — pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity curve or daily returns in,
//! `Option<f64>` out. `None` marks a statistic that is not available for
//! the input (too few points, zero variance, a non-finite result); no
//! metric panics or errors.

use crate::periods::{period_returns, Period, PeriodReturn};
use chrono::NaiveDate;
use foliolab_core::domain::EquityCurve;
use serde::{Deserialize, Serialize};

/// Portfolio and benchmark values of one statistic.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricPair {
    pub portfolio: Option<f64>,
    pub benchmark: Option<f64>,
}

impl MetricPair {
    fn of(
        portfolio: &EquityCurve,
        benchmark: &EquityCurve,
        f: impl Fn(&EquityCurve) -> Option<f64>,
    ) -> Self {
        Self {
            portfolio: f(portfolio),
            benchmark: f(benchmark),
        }
    }
}

/// How a metric value should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    /// Stored as a fraction, shown as a percentage.
    Percent,
    Ratio,
}

/// One line of the flat metrics export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub name: &'static str,
    pub portfolio: Option<f64>,
    pub benchmark: Option<f64>,
    pub unit: MetricUnit,
    /// False for statistics of the pair (relative return, correlation),
    /// which live in the `portfolio` column with no benchmark counterpart.
    pub paired: bool,
}

/// The fixed statistics set of one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub total_return: MetricPair,
    pub cagr: MetricPair,
    pub annualized_return: MetricPair,
    /// Portfolio minus benchmark annualized return.
    pub relative_return: Option<f64>,
    pub annualized_volatility: MetricPair,
    pub sharpe: MetricPair,
    pub sortino: MetricPair,
    pub max_drawdown: MetricPair,
    /// Pearson correlation of the two equity curves.
    pub correlation: Option<f64>,
    pub best_year: MetricPair,
    pub worst_year: MetricPair,
    /// Calendar-quarter returns of the portfolio curve.
    pub quarterly_returns: Vec<PeriodReturn>,
}

impl MetricsReport {
    pub fn compute(portfolio: &EquityCurve, benchmark: &EquityCurve, trading_days: u32) -> Self {
        let periods = f64::from(trading_days);
        let ann = |c: &EquityCurve| annualized_return(&daily_returns(&c.values), periods);
        let annualized = MetricPair::of(portfolio, benchmark, ann);
        let relative_return = match (annualized.portfolio, annualized.benchmark) {
            (Some(p), Some(b)) => Some(p - b),
            _ => None,
        };
        let yearly = |c: &EquityCurve| period_returns(&c.dates, &c.values, Period::Year);

        Self {
            total_return: MetricPair::of(portfolio, benchmark, |c| total_return(&c.values)),
            cagr: MetricPair::of(portfolio, benchmark, |c| cagr(&c.dates, &c.values)),
            annualized_return: annualized,
            relative_return,
            annualized_volatility: MetricPair::of(portfolio, benchmark, |c| {
                annualized_volatility(&daily_returns(&c.values), periods)
            }),
            sharpe: MetricPair::of(portfolio, benchmark, |c| {
                sharpe_ratio(&daily_returns(&c.values), periods)
            }),
            sortino: MetricPair::of(portfolio, benchmark, |c| {
                sortino_ratio(&daily_returns(&c.values), periods)
            }),
            max_drawdown: MetricPair::of(portfolio, benchmark, |c| max_drawdown(&c.values)),
            correlation: correlation(&portfolio.values, &benchmark.values),
            best_year: MetricPair::of(portfolio, benchmark, |c| best_period(&yearly(c))),
            worst_year: MetricPair::of(portfolio, benchmark, |c| worst_period(&yearly(c))),
            quarterly_returns: period_returns(&portfolio.dates, &portfolio.values, Period::Quarter),
        }
    }

    /// Flat `(name, portfolio, benchmark, unit)` rows in display order.
    ///
    /// Single-valued statistics (relative return, correlation) sit in the
    /// portfolio column.
    pub fn rows(&self) -> Vec<MetricRow> {
        use MetricUnit::{Percent, Ratio};
        let pair = |name, p: &MetricPair, unit| MetricRow {
            name,
            portfolio: p.portfolio,
            benchmark: p.benchmark,
            unit,
            paired: true,
        };
        let single = |name, v: Option<f64>, unit| MetricRow {
            name,
            portfolio: v,
            benchmark: None,
            unit,
            paired: false,
        };
        vec![
            pair("Total Return", &self.total_return, Percent),
            pair("CAGR", &self.cagr, Percent),
            pair("Annualized Return", &self.annualized_return, Percent),
            single("Relative Return", self.relative_return, Percent),
            pair("Annualized Volatility", &self.annualized_volatility, Percent),
            pair("Sharpe Ratio", &self.sharpe, Ratio),
            pair("Sortino Ratio", &self.sortino, Ratio),
            pair("Max Drawdown", &self.max_drawdown, Percent),
            single("Correlation", self.correlation, Ratio),
            pair("Best Year", &self.best_year, Percent),
            pair("Worst Year", &self.worst_year, Percent),
        ]
    }
}

// ─── Individual metric functions ────────────────────────────────────

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Total return as a fraction: last / first - 1.
pub fn total_return(curve: &[f64]) -> Option<f64> {
    let (first, last) = (*curve.first()?, *curve.last()?);
    if curve.len() < 2 || first <= 0.0 {
        return None;
    }
    finite(last / first - 1.0)
}

/// Compound annual growth rate over the calendar span of the curve.
///
/// Years are calendar days / 365.25.
pub fn cagr(dates: &[NaiveDate], curve: &[f64]) -> Option<f64> {
    let (first_date, last_date) = (*dates.first()?, *dates.last()?);
    let years = (last_date - first_date).num_days() as f64 / 365.25;
    let (first, last) = (*curve.first()?, *curve.last()?);
    if years <= 0.0 || first <= 0.0 || last < 0.0 {
        return None;
    }
    finite((last / first).powf(1.0 / years) - 1.0)
}

/// Geometric annualization of the mean daily return: `(1 + mean)^periods - 1`.
pub fn annualized_return(returns: &[f64], periods: f64) -> Option<f64> {
    let m = mean(returns)?;
    finite((1.0 + m).powf(periods) - 1.0)
}

/// Sample standard deviation of daily returns scaled by `sqrt(periods)`.
pub fn annualized_volatility(returns: &[f64], periods: f64) -> Option<f64> {
    finite(sample_std(returns)? * periods.sqrt())
}

/// Annualized Sharpe ratio from daily returns, risk-free rate zero.
pub fn sharpe_ratio(returns: &[f64], periods: f64) -> Option<f64> {
    let m = mean(returns)?;
    let s = sample_std(returns)?;
    if s < 1e-15 {
        return None;
    }
    finite(m / s * periods.sqrt())
}

/// Annualized Sortino ratio.
///
/// The downside deviation is the sample standard deviation of
/// `min(r, 0)` over every day, not just losing days.
pub fn sortino_ratio(returns: &[f64], periods: f64) -> Option<f64> {
    let m = mean(returns)?;
    let downside: Vec<f64> = returns.iter().map(|r| r.min(0.0)).collect();
    let s = sample_std(&downside)?;
    if s < 1e-15 {
        return None;
    }
    finite(m / s * periods.sqrt())
}

/// Maximum drawdown as a non-positive fraction (e.g., -0.15 = 15% drawdown).
pub fn max_drawdown(curve: &[f64]) -> Option<f64> {
    if curve.len() < 2 {
        return None;
    }
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &v in curve {
        peak = peak.max(v);
        if peak > 0.0 {
            max_dd = max_dd.min(v / peak - 1.0);
        }
    }
    finite(max_dd)
}

/// Pearson correlation of two equally long series.
pub fn correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let (ma, mb) = (mean(a)?, mean(b)?);
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b) {
        cov += (x - ma) * (y - mb);
        va += (x - ma).powi(2);
        vb += (y - mb).powi(2);
    }
    if va <= 0.0 || vb <= 0.0 {
        return None;
    }
    finite(cov / (va.sqrt() * vb.sqrt()))
}

pub fn best_period(returns: &[PeriodReturn]) -> Option<f64> {
    returns.iter().map(|r| r.value).reduce(f64::max)
}

pub fn worst_period(returns: &[PeriodReturn]) -> Option<f64> {
    returns.iter().map(|r| r.value).reduce(f64::min)
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Daily percentage changes of a curve. Non-finite changes are dropped.
pub fn daily_returns(curve: &[f64]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| w[1] / w[0] - 1.0)
        .filter(|r| r.is_finite())
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with one degree of freedom removed.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    finite(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use foliolab_core::domain::StrategyKind;

    fn curve(kind: StrategyKind, start: NaiveDate, values: Vec<f64>) -> EquityCurve {
        EquityCurve {
            kind,
            dates: (0..values.len())
                .map(|i| start + chrono::Duration::days(i as i64))
                .collect(),
            values,
        }
    }

    fn compounding(daily: f64, n: usize) -> Vec<f64> {
        let mut v = vec![100.0];
        for i in 1..n {
            v.push(v[i - 1] * (1.0 + daily));
        }
        v
    }

    // ── Total return ──

    #[test]
    fn total_return_positive() {
        let eq = [100.0, 100.5, 101.0, 110.0];
        assert!((total_return(&eq).unwrap() - 0.1).abs() < 1e-10);
    }

    #[test]
    fn total_return_single_point_is_none() {
        assert_eq!(total_return(&[100.0]), None);
        assert_eq!(total_return(&[]), None);
    }

    // ── CAGR ──

    #[test]
    fn cagr_two_calendar_years() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        // 731 days = 2.0014 years of 365.25 days
        let dates = [start, start + chrono::Duration::days(731)];
        let c = cagr(&dates, &[100.0, 121.0]).unwrap();
        assert!((c - 0.1).abs() < 1e-3, "CAGR should be ~10%, got {c}");
    }

    #[test]
    fn cagr_same_day_is_none() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(cagr(&[d], &[100.0]), None);
    }

    // ── Annualized return / volatility ──

    #[test]
    fn annualized_return_round_trip() {
        let r = 0.0004;
        let returns = daily_returns(&compounding(r, 300));
        let ann = annualized_return(&returns, 252.0).unwrap();
        assert!((ann - ((1.0 + r).powf(252.0) - 1.0)).abs() < 1e-9);
        // Recover the daily rate from the annual figure.
        let back = (1.0 + ann).powf(1.0 / 252.0) - 1.0;
        assert!((back - r).abs() < 1e-12);
    }

    #[test]
    fn volatility_of_constant_returns_is_zero() {
        let returns = daily_returns(&compounding(0.001, 50));
        assert!(annualized_volatility(&returns, 252.0).unwrap() < 1e-12);
    }

    #[test]
    fn volatility_uses_sample_std() {
        // Returns +1%, -1%: mean 0, sample std = sqrt(2 * 0.0001 / 1)
        let returns = [0.01, -0.01];
        let v = annualized_volatility(&returns, 252.0).unwrap();
        assert!((v - (0.0002_f64).sqrt() * 252.0_f64.sqrt()).abs() < 1e-12);
    }

    // ── Sharpe / Sortino ──

    #[test]
    fn sharpe_constant_curve_is_none() {
        let returns = daily_returns(&[100.0; 100]);
        assert_eq!(sharpe_ratio(&returns, 252.0), None);
    }

    #[test]
    fn sharpe_alternating_gains_is_high() {
        let returns: Vec<f64> = (0..252)
            .map(|i| if i % 2 == 0 { 0.002 } else { 0.0005 })
            .collect();
        let s = sharpe_ratio(&returns, 252.0).unwrap();
        assert!(s > 5.0, "Sharpe should be high, got {s}");
    }

    #[test]
    fn sortino_without_losses_is_none() {
        let returns = [0.01, 0.02, 0.005];
        assert_eq!(sortino_ratio(&returns, 252.0), None);
    }

    #[test]
    fn sortino_counts_every_day_in_downside() {
        let returns = [0.03, -0.01, 0.0, -0.01];
        let downside_std = sample_std(&[0.0, -0.01, 0.0, -0.01]).unwrap();
        let expected = 0.0025 / downside_std * 252.0_f64.sqrt();
        assert!((sortino_ratio(&returns, 252.0).unwrap() - expected).abs() < 1e-12);
    }

    // ── Drawdown / correlation ──

    #[test]
    fn max_drawdown_known_path() {
        let eq = [100.0, 120.0, 90.0, 130.0, 117.0];
        assert!((max_drawdown(&eq).unwrap() - (-0.25)).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_rising_is_zero() {
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), Some(0.0));
    }

    #[test]
    fn correlation_of_scaled_series_is_one() {
        let a = [1.0, 2.0, 4.0, 3.0];
        let b = [2.0, 4.0, 8.0, 6.0];
        assert!((correlation(&a, &b).unwrap() - 1.0).abs() < 1e-12);
        let c = [4.0, 3.0, 1.0, 2.0];
        assert!(correlation(&a, &c).unwrap() < 0.0);
    }

    #[test]
    fn correlation_with_flat_series_is_none() {
        assert_eq!(correlation(&[1.0, 2.0], &[5.0, 5.0]), None);
    }

    // ── Report ──

    #[test]
    fn single_year_has_no_best_or_worst_year() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let p = curve(StrategyKind::Portfolio, start, compounding(0.001, 200));
        let b = curve(StrategyKind::Benchmark, start, compounding(0.0005, 200));
        let report = MetricsReport::compute(&p, &b, 252);
        assert_eq!(report.best_year, MetricPair::default());
        assert_eq!(report.worst_year, MetricPair::default());
    }

    #[test]
    fn report_rows_cover_every_statistic() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let values: Vec<f64> = (0..900)
            .map(|i| 100.0 + (i as f64 * 0.1).sin() * 5.0 + i as f64 * 0.05)
            .collect();
        let p = curve(StrategyKind::Portfolio, start, values.clone());
        let b = curve(StrategyKind::Benchmark, start, values);
        let report = MetricsReport::compute(&p, &b, 252);

        let names: Vec<&str> = report.rows().iter().map(|r| r.name).collect();
        assert_eq!(names.len(), 11);
        assert!(names.contains(&"Best Year"));
        let unpaired: Vec<&str> = report
            .rows()
            .iter()
            .filter(|r| !r.paired)
            .map(|r| r.name)
            .collect();
        assert_eq!(unpaired, vec!["Relative Return", "Correlation"]);
        assert_eq!(report.relative_return, Some(0.0));
        assert!((report.correlation.unwrap() - 1.0).abs() < 1e-12);
        assert!(report.best_year.portfolio.unwrap() >= report.worst_year.portfolio.unwrap());
        assert!(!report.quarterly_returns.is_empty());
    }
}
