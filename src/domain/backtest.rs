//! Single-strategy backtest: validate, generate signals, simulate, measure.

use std::ops::Range;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::benchmark::BenchmarkSeries;
use super::error::BacktestError;
use super::execution::ExecutionConfig;
use super::metrics::Metrics;
use super::ohlcv::{validate_bars, OhlcvBar};
use super::position::{Position, Trade};
use super::signal::Signal;
use super::simulation::{simulate, EquityPoint, SimulationContext};
use super::strategy::Strategy;

const SECTION: &str = "backtest";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub slippage_rate: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Identifier of the benchmark series, resolved by the caller.
    pub benchmark: Option<String>,
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        let execution = ExecutionConfig::default();
        BacktestConfig {
            initial_capital: 100_000.0,
            commission_rate: execution.commission_rate,
            slippage_rate: execution.slippage_rate,
            start_date: None,
            end_date: None,
            benchmark: None,
            risk_free_rate: 0.02,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), BacktestError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(BacktestError::invalid(
                SECTION,
                "initial_capital",
                format!("must be positive, got {}", self.initial_capital),
            ));
        }
        for (key, rate) in [
            ("commission_rate", self.commission_rate),
            ("slippage_rate", self.slippage_rate),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(BacktestError::invalid(
                    SECTION,
                    key,
                    format!("must be non-negative, got {rate}"),
                ));
            }
        }
        if !self.risk_free_rate.is_finite() {
            return Err(BacktestError::invalid(SECTION, "risk_free_rate", "must be finite"));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(BacktestError::invalid(
                    SECTION,
                    "start_date",
                    format!("{start} is after end_date {end}"),
                ));
            }
        }
        Ok(())
    }

    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission_rate: self.commission_rate,
            slippage_rate: self.slippage_rate,
        }
    }

    /// The contiguous run of `bars` inside the configured date bounds.
    /// `bars` must already be in strictly increasing date order.
    pub fn within_bounds<'a>(&self, bars: &'a [OhlcvBar]) -> &'a [OhlcvBar] {
        &bars[self.bounds_range(bars)]
    }

    /// Index range of [`Self::within_bounds`]; empty when the bounds miss.
    pub fn bounds_range(&self, bars: &[OhlcvBar]) -> Range<usize> {
        let start = self
            .start_date
            .map_or(0, |d| bars.partition_point(|b| b.date < d));
        let end = self
            .end_date
            .map_or(bars.len(), |d| bars.partition_point(|b| b.date <= d));
        start..end.max(start)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub strategy: Strategy,
    pub config: BacktestConfig,
    pub bar_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub final_equity: f64,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    /// Still open at the last bar; its value is already in `final_equity`.
    pub open_position: Option<Position>,
    pub skipped_entries: usize,
    pub metrics: Metrics,
}

/// Run `strategy` over `bars`.
///
/// The full input is validated before the date bounds are applied. Signals
/// are generated from the bounded bars only.
pub fn run_backtest(
    bars: &[OhlcvBar],
    strategy: Strategy,
    config: &BacktestConfig,
    benchmark: Option<&BenchmarkSeries>,
) -> Result<BacktestResult, BacktestError> {
    config.validate()?;
    validate_bars(bars)?;

    let window = config.within_bounds(bars);
    let signals = strategy.generate_signals(window);
    run_with_signals(window, &signals, strategy, config, benchmark)
}

/// Simulate precomputed `signals` over `bars` and measure the outcome.
///
/// Bars are assumed validated; a bad close still aborts the simulation.
pub fn run_with_signals(
    bars: &[OhlcvBar],
    signals: &[Signal],
    strategy: Strategy,
    config: &BacktestConfig,
    benchmark: Option<&BenchmarkSeries>,
) -> Result<BacktestResult, BacktestError> {
    let ctx = SimulationContext {
        strategy,
        execution: config.execution(),
    };
    let state = simulate(bars, signals, &ctx, config.initial_capital)?;
    let metrics = Metrics::compute(
        &state.equity_curve,
        &state.trades,
        config.risk_free_rate,
        benchmark,
    );

    let final_equity = state
        .equity_curve
        .last()
        .map_or(config.initial_capital, |p| p.equity);

    info!(
        strategy = %strategy,
        bars = bars.len(),
        trades = state.trades.len(),
        skipped = state.skipped_entries,
        total_return = metrics.total_return,
        "backtest complete"
    );

    Ok(BacktestResult {
        strategy,
        config: config.clone(),
        bar_count: bars.len(),
        first_date: bars.first().map(|b| b.date),
        last_date: bars.last().map(|b| b.date),
        final_equity,
        equity_curve: state.equity_curve,
        trades: state.trades,
        open_position: state.position,
        skipped_entries: state.skipped_entries,
        metrics,
    })
}

/// Run every strategy in `strategies` over the same bars in parallel.
///
/// Runs are independent; one that fails is logged and left out without
/// affecting the others. Output keeps the order of `strategies`.
pub fn compare_strategies(
    bars: &[OhlcvBar],
    strategies: &[Strategy],
    config: &BacktestConfig,
    benchmark: Option<&BenchmarkSeries>,
) -> Vec<BacktestResult> {
    strategies
        .par_iter()
        .filter_map(|&strategy| match run_backtest(bars, strategy, config, benchmark) {
            Ok(result) => Some(result),
            Err(err) => {
                warn!(strategy = %strategy, error = %err, "strategy run failed");
                None
            }
        })
        .collect()
}
