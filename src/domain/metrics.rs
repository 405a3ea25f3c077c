//! Performance and risk metrics.
//!
//! Everything is derived from the per-bar equity curve and the closed-trade
//! ledger. Per-bar simple returns r_t = E_t / E_{t-1} - 1 drive the risk
//! statistics; 252 bars make a year.

use serde::Serialize;

use super::benchmark::{compare_to_benchmark, BenchmarkComparison, BenchmarkSeries};
use super::position::Trade;
use super::simulation::EquityPoint;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// A ratio whose divisor may be zero.
///
/// `value()` maps `Undefined` to 0.0 and `PositiveInfinity` to `f64::INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Ratio {
    Finite(f64),
    Undefined,
    PositiveInfinity,
}

impl Ratio {
    /// `numerator / denominator`, or `Undefined` when the denominator is zero
    /// or the quotient is not finite.
    pub fn divide(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            return Ratio::Undefined;
        }
        let q = numerator / denominator;
        if q.is_finite() {
            Ratio::Finite(q)
        } else {
            Ratio::Undefined
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Ratio::Finite(v) => v,
            Ratio::Undefined => 0.0,
            Ratio::PositiveInfinity => f64::INFINITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: Ratio,
    pub sortino_ratio: Ratio,
    /// Deepest peak-to-trough fall as a non-positive fraction.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub calmar_ratio: Ratio,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: Ratio,
    pub avg_trade_return: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Mean holding period in calendar days.
    pub avg_trade_duration: f64,
    pub var_95: f64,
    pub var_99: f64,
    pub cvar_95: f64,
    pub benchmark: BenchmarkComparison,
}

impl Metrics {
    pub fn compute(
        equity_curve: &[EquityPoint],
        trades: &[Trade],
        risk_free_rate: f64,
        benchmark: Option<&BenchmarkSeries>,
    ) -> Self {
        let equity: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let returns = simple_returns(&equity);

        let total_return = total_return(&equity);
        let annualized_return = annualize(total_return, returns.len());
        let volatility = sample_stddev(&returns) * TRADING_DAYS_PER_YEAR.sqrt();
        let sharpe_ratio = Ratio::divide(annualized_return - risk_free_rate, volatility);
        let sortino_ratio = sortino(&returns, risk_free_rate / TRADING_DAYS_PER_YEAR);

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&equity);
        let calmar_ratio = Ratio::divide(annualized_return, max_drawdown.abs());

        let var_95 = percentile(&returns, 5.0);
        let var_99 = percentile(&returns, 1.0);
        let tail: Vec<f64> = returns.iter().copied().filter(|&r| r <= var_95).collect();
        let cvar_95 = mean(&tail);

        let benchmark = match benchmark {
            Some(series) => {
                compare_to_benchmark(equity_curve, series, annualized_return, risk_free_rate)
            }
            None => BenchmarkComparison::not_requested(),
        };

        let stats = TradeStats::from_trades(trades);

        Metrics {
            total_return,
            annualized_return,
            volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            calmar_ratio,
            total_trades: stats.total,
            trades_won: stats.won,
            trades_lost: stats.lost,
            trades_breakeven: stats.breakeven,
            win_rate: stats.win_rate(),
            profit_factor: stats.profit_factor(),
            avg_trade_return: stats.average(stats.total_pnl, stats.total),
            avg_win: stats.average(stats.gross_wins, stats.won),
            avg_loss: stats.average(stats.gross_losses, stats.lost),
            largest_win: stats.largest_win,
            largest_loss: stats.largest_loss,
            avg_trade_duration: stats.average(stats.total_days as f64, stats.total),
            var_95,
            var_99,
            cvar_95,
            benchmark,
        }
    }
}

#[derive(Debug, Default)]
struct TradeStats {
    total: usize,
    won: usize,
    lost: usize,
    breakeven: usize,
    total_pnl: f64,
    gross_wins: f64,
    gross_losses: f64,
    largest_win: f64,
    largest_loss: f64,
    total_days: i64,
}

impl TradeStats {
    fn from_trades(trades: &[Trade]) -> Self {
        let mut stats = TradeStats::default();
        for trade in trades {
            let pnl = trade.pnl;
            stats.total += 1;
            stats.total_pnl += pnl;
            stats.total_days += trade.holding_days();
            if pnl > 0.0 {
                stats.won += 1;
                stats.gross_wins += pnl;
                stats.largest_win = stats.largest_win.max(pnl);
            } else if pnl < 0.0 {
                stats.lost += 1;
                stats.gross_losses += pnl.abs();
                stats.largest_loss = stats.largest_loss.max(pnl.abs());
            } else {
                stats.breakeven += 1;
            }
        }
        stats
    }

    fn average(&self, sum: f64, count: usize) -> f64 {
        if count > 0 { sum / count as f64 } else { 0.0 }
    }

    fn win_rate(&self) -> f64 {
        self.average(self.won as f64, self.total)
    }

    /// Undefined only for an empty ledger; no losing trades reads as +inf.
    fn profit_factor(&self) -> Ratio {
        if self.total == 0 {
            Ratio::Undefined
        } else if self.gross_losses > 0.0 {
            Ratio::divide(self.gross_wins, self.gross_losses)
        } else {
            Ratio::PositiveInfinity
        }
    }
}

pub fn simple_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

fn total_return(equity: &[f64]) -> f64 {
    match (equity.first(), equity.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

/// (1 + total)^(252 / periods) - 1. A wiped-out account annualizes to -1.
pub fn annualize(total_return: f64, periods: usize) -> f64 {
    if periods == 0 || !total_return.is_finite() {
        return 0.0;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(TRADING_DAYS_PER_YEAR / periods as f64) - 1.0
}

/// Returns (max drawdown ≤ 0, longest drawdown in bars).
fn compute_drawdown(equity: &[f64]) -> (f64, usize) {
    let Some(&first) = equity.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut current_duration = 0usize;
    let mut max_duration = 0usize;

    for &value in equity {
        if value >= peak {
            peak = value;
            current_duration = 0;
            continue;
        }
        if peak > 0.0 {
            max_dd = max_dd.min((value - peak) / peak);
        }
        current_duration += 1;
        max_duration = max_duration.max(current_duration);
    }

    (max_dd, max_duration)
}

fn sortino(returns: &[f64], daily_rf: f64) -> Ratio {
    if returns.is_empty() {
        return Ratio::Undefined;
    }
    let n = returns.len() as f64;
    let excess = mean(returns) - daily_rf;
    let downside = (returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();

    match Ratio::divide(excess, downside) {
        Ratio::Finite(v) => Ratio::Finite(v * TRADING_DAYS_PER_YEAR.sqrt()),
        other => other,
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sample covariance (n - 1); 0 with fewer than two pairs.
pub(crate) fn sample_covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let (ma, mb) = (mean(&a[..n]), mean(&b[..n]));
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - ma) * (y - mb))
        .sum::<f64>()
        / (n - 1) as f64
}

fn sample_stddev(values: &[f64]) -> f64 {
    sample_covariance(values, values).sqrt()
}

/// Percentile with linear interpolation between closest ranks.
/// `p` is in percent; 0 for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
