//! Trade simulation: a two-state machine (flat / in position) replayed bar by
//! bar.
//!
//! [`SimulationState`] is an explicit value. [`step`] consumes it and returns
//! the next state, so independent runs never share anything mutable.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::error::BacktestError;
use super::execution::{enter_position, exit_position, EntryResult, ExecutionConfig};
use super::ohlcv::OhlcvBar;
use super::position::{Position, Side, Trade};
use super::signal::Signal;
use super::strategy::Strategy;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Fixed inputs shared by every step of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationContext {
    pub strategy: Strategy,
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub cash: f64,
    pub position: Option<Position>,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    /// Entries skipped because sizing produced no whole unit.
    pub skipped_entries: usize,
}

impl SimulationState {
    pub fn new(initial_capital: f64) -> Self {
        SimulationState {
            cash: initial_capital,
            position: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            skipped_entries: 0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// cash + mark-to-market value of the open position at `price`.
    pub fn equity_at(&self, price: f64) -> f64 {
        match &self.position {
            Some(position) => self.cash + position.market_value(price),
            None => self.cash,
        }
    }
}

/// Advance the state by one bar.
///
/// On an active signal an open position is closed first, then a new one is
/// opened in the signal's direction. Both happen on a flip.
pub fn step(
    mut state: SimulationState,
    ctx: &SimulationContext,
    index: usize,
    bar: &OhlcvBar,
    signal: Signal,
) -> Result<SimulationState, BacktestError> {
    let price = bar.close;
    if !price.is_finite() || price <= 0.0 {
        return Err(BacktestError::integrity(
            index,
            format!("unusable close price {price}"),
        ));
    }

    if signal.is_active() {
        if let Some(position) = state.position.take() {
            let exit = exit_position(position, bar.date, price, ctx.strategy, &ctx.execution);
            debug!(
                index,
                side = ?exit.trade.side,
                exit_price = price,
                pnl = exit.trade.pnl,
                "closed position"
            );
            state.cash += exit.cash_proceeds;
            state.trades.push(exit.trade);
        }

        let side = match signal {
            Signal::Buy => Side::Long,
            _ => Side::Short,
        };
        match enter_position(state.cash, side, index, bar.date, price, &ctx.execution) {
            EntryResult::Entered {
                position,
                cash_outlay,
            } => {
                debug!(
                    index,
                    side = ?position.side,
                    quantity = position.quantity,
                    entry_price = price,
                    "opened position"
                );
                state.cash -= cash_outlay;
                state.position = Some(position);
            }
            EntryResult::InsufficientFunds => {
                debug!(index, cash = state.cash, price, "entry skipped: insufficient funds");
                state.skipped_entries += 1;
            }
        }
    }

    let equity = state.equity_at(price);
    state.equity_curve.push(EquityPoint {
        date: bar.date,
        equity,
    });
    Ok(state)
}

/// Replay `bars` against `signals` from a fresh state.
pub fn simulate(
    bars: &[OhlcvBar],
    signals: &[Signal],
    ctx: &SimulationContext,
    initial_capital: f64,
) -> Result<SimulationState, BacktestError> {
    if bars.len() != signals.len() {
        return Err(BacktestError::integrity(
            bars.len().min(signals.len()),
            format!(
                "signal count {} does not match bar count {}",
                signals.len(),
                bars.len()
            ),
        ));
    }

    bars.iter()
        .zip(signals)
        .enumerate()
        .try_fold(SimulationState::new(initial_capital), |state, (i, (bar, &signal))| {
            step(state, ctx, i, bar, signal)
        })
}
