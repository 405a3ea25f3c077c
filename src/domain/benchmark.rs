//! Benchmark comparison: return, alpha and beta against an external price
//! series, aligned on dates.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use super::metrics::{annualize, sample_covariance, simple_returns};
use super::simulation::EquityPoint;

/// Minimum number of dates shared by the equity curve and the benchmark.
pub const MIN_ALIGNED_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkPoint {
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkSeries {
    pub identifier: String,
    pub points: Vec<BenchmarkPoint>,
}

impl BenchmarkSeries {
    pub fn new(identifier: impl Into<String>, points: Vec<BenchmarkPoint>) -> Self {
        BenchmarkSeries {
            identifier: identifier.into(),
            points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BenchmarkStatus {
    NotRequested,
    Computed,
    Unavailable { reason: String },
}

/// Benchmark-relative figures. All three are 0 unless `status` is `Computed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkComparison {
    pub benchmark_return: f64,
    pub alpha: f64,
    pub beta: f64,
    #[serde(flatten)]
    pub status: BenchmarkStatus,
}

impl BenchmarkComparison {
    pub fn not_requested() -> Self {
        Self::empty(BenchmarkStatus::NotRequested)
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::empty(BenchmarkStatus::Unavailable {
            reason: reason.into(),
        })
    }

    fn empty(status: BenchmarkStatus) -> Self {
        BenchmarkComparison {
            benchmark_return: 0.0,
            alpha: 0.0,
            beta: 0.0,
            status,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == BenchmarkStatus::Computed
    }
}

/// Compare the equity curve with `benchmark` over their shared dates.
///
/// beta = cov(r_s, r_b) / var(r_b); alpha = annualized_return − (rf + beta ×
/// (benchmark_return − rf)). Missing or degenerate benchmark data degrades to
/// `Unavailable` with zeroed figures.
pub fn compare_to_benchmark(
    equity_curve: &[EquityPoint],
    benchmark: &BenchmarkSeries,
    annualized_return: f64,
    risk_free_rate: f64,
) -> BenchmarkComparison {
    match aligned_returns(equity_curve, benchmark) {
        Ok((strategy_returns, benchmark_returns, benchmark_total)) => {
            let variance = sample_covariance(&benchmark_returns, &benchmark_returns);
            if variance <= 0.0 || !variance.is_finite() {
                return degrade(benchmark, "benchmark returns have zero variance");
            }
            let beta = sample_covariance(&strategy_returns, &benchmark_returns) / variance;
            let benchmark_return = annualize(benchmark_total, benchmark_returns.len());
            let alpha =
                annualized_return - (risk_free_rate + beta * (benchmark_return - risk_free_rate));
            BenchmarkComparison {
                benchmark_return,
                alpha,
                beta,
                status: BenchmarkStatus::Computed,
            }
        }
        Err(reason) => degrade(benchmark, &reason),
    }
}

fn degrade(benchmark: &BenchmarkSeries, reason: &str) -> BenchmarkComparison {
    warn!(benchmark = %benchmark.identifier, reason, "benchmark comparison unavailable");
    BenchmarkComparison::unavailable(reason)
}

/// Inner-join on date, then returns for both sides plus the benchmark's total
/// return over the joined window.
fn aligned_returns(
    equity_curve: &[EquityPoint],
    benchmark: &BenchmarkSeries,
) -> Result<(Vec<f64>, Vec<f64>, f64), String> {
    let prices: HashMap<NaiveDate, f64> = benchmark
        .points
        .iter()
        .filter(|p| p.price.is_finite() && p.price > 0.0)
        .map(|p| (p.date, p.price))
        .collect();

    let (equity, bench): (Vec<f64>, Vec<f64>) = equity_curve
        .iter()
        .filter_map(|p| prices.get(&p.date).map(|&price| (p.equity, price)))
        .unzip();

    if bench.len() < MIN_ALIGNED_POINTS {
        return Err(format!(
            "only {} dates align with the benchmark, need {MIN_ALIGNED_POINTS}",
            bench.len()
        ));
    }

    let strategy_returns = simple_returns(&equity);
    let benchmark_returns = simple_returns(&bench);
    let total = bench[bench.len() - 1] / bench[0] - 1.0;
    Ok((strategy_returns, benchmark_returns, total))
}
