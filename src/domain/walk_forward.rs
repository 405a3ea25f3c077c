//! Walk-forward validation over rolling (train, test) windows.
//!
//! Each test slice is replayed from a fresh simulation state, so no position,
//! cash or ledger entry leaks from one slice into the next. Periods advance by
//! `test_window` bars and never overlap.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::backtest::{run_with_signals, BacktestConfig};
use super::error::BacktestError;
use super::metrics::Ratio;
use super::ohlcv::{validate_bars, validate_dates, OhlcvBar};
use super::strategy::Strategy;

const SECTION: &str = "walk_forward";

/// Which bars a slice's signals are computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalWarmup {
    /// Only the test slice; indicators start cold at the slice's first bar.
    #[default]
    TestSliceOnly,
    /// The preceding train window plus the test slice, truncated to the test
    /// slice afterwards.
    TrainHistory,
}

impl fmt::Display for SignalWarmup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalWarmup::TestSliceOnly => "test_slice_only",
            SignalWarmup::TrainHistory => "train_history",
        })
    }
}

impl FromStr for SignalWarmup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test_slice_only" => Ok(SignalWarmup::TestSliceOnly),
            "train_history" => Ok(SignalWarmup::TrainHistory),
            other => Err(format!(
                "unknown warmup '{other}' (expected test_slice_only or train_history)"
            )),
        }
    }
}

/// What a data integrity failure inside one slice does to the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceErrorPolicy {
    #[default]
    Abort,
    SkipAndLog,
}

impl fmt::Display for SliceErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SliceErrorPolicy::Abort => "abort",
            SliceErrorPolicy::SkipAndLog => "skip_and_log",
        })
    }
}

impl FromStr for SliceErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(SliceErrorPolicy::Abort),
            "skip_and_log" => Ok(SliceErrorPolicy::SkipAndLog),
            other => Err(format!(
                "unknown slice error policy '{other}' (expected abort or skip_and_log)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalkForwardConfig {
    pub train_window: usize,
    pub test_window: usize,
    pub warmup: SignalWarmup,
    pub on_slice_error: SliceErrorPolicy,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        WalkForwardConfig {
            train_window: 252,
            test_window: 63,
            warmup: SignalWarmup::default(),
            on_slice_error: SliceErrorPolicy::default(),
        }
    }
}

impl WalkForwardConfig {
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.test_window == 0 {
            return Err(BacktestError::invalid(
                SECTION,
                "test_window",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Number of complete test slices a series of `bar_count` bars yields.
    pub fn period_count(&self, bar_count: usize) -> usize {
        match bar_count.checked_sub(self.train_window) {
            Some(rest) if self.test_window > 0 => rest / self.test_window,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkForwardPeriod {
    pub index: usize,
    /// `None` when `train_window` is 0.
    pub train_start: Option<NaiveDate>,
    pub train_end: Option<NaiveDate>,
    pub test_start: NaiveDate,
    pub test_end: NaiveDate,
    pub total_return: f64,
    pub sharpe_ratio: Ratio,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub trade_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WalkForwardAverages {
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
}

impl WalkForwardAverages {
    /// Arithmetic means over `periods`; all zero when there are none.
    /// Undefined Sharpe ratios count as 0.
    pub fn from_periods(periods: &[WalkForwardPeriod]) -> Self {
        if periods.is_empty() {
            return WalkForwardAverages::default();
        }
        let n = periods.len() as f64;
        let avg = |f: fn(&WalkForwardPeriod) -> f64| periods.iter().map(f).sum::<f64>() / n;
        WalkForwardAverages {
            total_return: avg(|p| p.total_return),
            sharpe_ratio: avg(|p| p.sharpe_ratio.value()),
            max_drawdown: avg(|p| p.max_drawdown),
            win_rate: avg(|p| p.win_rate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkForwardSummary {
    pub strategy: Strategy,
    pub config: WalkForwardConfig,
    pub periods: Vec<WalkForwardPeriod>,
    pub averages: WalkForwardAverages,
    /// Slices dropped under [`SliceErrorPolicy::SkipAndLog`].
    pub skipped_periods: usize,
}

/// Slide a train/test window across `bars` and backtest every test slice.
///
/// The whole input is checked before slicing: date order always, bar fields
/// too under [`SliceErrorPolicy::Abort`]. The backtest date bounds are then
/// applied, and error indexes refer to positions in `bars`. A bounded series
/// shorter than `train_window + test_window` yields zero periods.
pub fn run_walk_forward(
    bars: &[OhlcvBar],
    strategy: Strategy,
    backtest: &BacktestConfig,
    config: &WalkForwardConfig,
) -> Result<WalkForwardSummary, BacktestError> {
    config.validate()?;
    backtest.validate()?;
    match config.on_slice_error {
        SliceErrorPolicy::Abort => validate_bars(bars)?,
        SliceErrorPolicy::SkipAndLog => validate_dates(bars)?,
    }

    let bounds = backtest.bounds_range(bars);
    let offset = bounds.start;
    let bars = &bars[bounds];

    let mut periods = Vec::with_capacity(config.period_count(bars.len()));
    let mut skipped_periods = 0;
    let mut cursor = config.train_window;

    while cursor
        .checked_add(config.test_window)
        .is_some_and(|end| end <= bars.len())
    {
        let index = periods.len() + skipped_periods;
        let outcome = run_period(bars, cursor, index, strategy, backtest, config)
            .map_err(|e| shift_index(e, offset));
        match outcome {
            Ok(period) => {
                info!(
                    period = index,
                    test_start = %period.test_start,
                    test_end = %period.test_end,
                    total_return = period.total_return,
                    trades = period.trade_count,
                    "walk-forward period complete"
                );
                periods.push(period);
            }
            Err(err)
                if err.is_data_integrity()
                    && config.on_slice_error == SliceErrorPolicy::SkipAndLog =>
            {
                warn!(period = index, error = %err, "skipping walk-forward period");
                skipped_periods += 1;
            }
            Err(err) => return Err(err),
        }
        cursor += config.test_window;
    }

    let averages = WalkForwardAverages::from_periods(&periods);
    info!(
        strategy = %strategy,
        periods = periods.len(),
        skipped = skipped_periods,
        avg_return = averages.total_return,
        "walk-forward complete"
    );

    Ok(WalkForwardSummary {
        strategy,
        config: *config,
        periods,
        averages,
        skipped_periods,
    })
}

fn run_period(
    bars: &[OhlcvBar],
    cursor: usize,
    index: usize,
    strategy: Strategy,
    backtest: &BacktestConfig,
    config: &WalkForwardConfig,
) -> Result<WalkForwardPeriod, BacktestError> {
    let train_start = cursor - config.train_window;
    let test_end = cursor + config.test_window;
    let signal_start = match config.warmup {
        SignalWarmup::TestSliceOnly => cursor,
        SignalWarmup::TrainHistory => train_start,
    };

    let history = &bars[signal_start..test_end];
    validate_bars(history).map_err(|e| shift_index(e, signal_start))?;

    let signals = strategy.generate_signals(history);
    let test_bars = &bars[cursor..test_end];
    let result = run_with_signals(
        test_bars,
        &signals[cursor - signal_start..],
        strategy,
        backtest,
        None,
    )
    .map_err(|e| shift_index(e, cursor))?;

    let train = &bars[train_start..cursor];
    Ok(WalkForwardPeriod {
        index,
        train_start: train.first().map(|b| b.date),
        train_end: train.last().map(|b| b.date),
        test_start: test_bars[0].date,
        test_end: test_bars[test_bars.len() - 1].date,
        total_return: result.metrics.total_return,
        sharpe_ratio: result.metrics.sharpe_ratio,
        max_drawdown: result.metrics.max_drawdown,
        win_rate: result.metrics.win_rate,
        trade_count: result.trades.len(),
    })
}

/// Re-base a slice-relative bar index onto the full series.
fn shift_index(err: BacktestError, offset: usize) -> BacktestError {
    match err {
        BacktestError::DataIntegrity { index, reason } => BacktestError::DataIntegrity {
            index: index + offset,
            reason,
        },
        other => other,
    }
}
