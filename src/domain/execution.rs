//! Trade execution and cost accounting.
//!
//! Fills happen at the bar's close. Commission and slippage are both charged as
//! a fraction of notional, independently on each leg. Functions here are pure:
//! they take the cash available and return what changed, leaving the state
//! transition to [`super::simulation`].

use chrono::NaiveDate;

use super::position::{Position, Side, Trade};
use super::strategy::Strategy;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    pub commission_rate: f64,
    pub slippage_rate: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: 0.001,
            slippage_rate: 0.0005,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeCosts {
    pub commission: f64,
    pub slippage: f64,
}

impl TradeCosts {
    pub fn total(&self) -> f64 {
        self.commission + self.slippage
    }
}

/// commission = notional × commission_rate; slippage = notional × slippage_rate.
pub fn calculate_costs(notional: f64, config: &ExecutionConfig) -> TradeCosts {
    TradeCosts {
        commission: notional * config.commission_rate,
        slippage: notional * config.slippage_rate,
    }
}

/// Whole units affordable once entry costs are reserved:
/// floor(cash / (1 + commission_rate + slippage_rate) / price).
pub fn position_size(cash: f64, price: f64, config: &ExecutionConfig) -> u64 {
    if cash <= 0.0 || price <= 0.0 {
        return 0;
    }
    let available = cash / (1.0 + config.commission_rate + config.slippage_rate);
    let units = (available / price).floor();
    if units.is_finite() && units > 0.0 {
        units as u64
    } else {
        0
    }
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        position: Position,
        /// Notional plus entry costs; to be deducted from cash.
        cash_outlay: f64,
    },
    InsufficientFunds,
}

/// Open a position with all affordable cash.
///
/// Both sides deduct notional plus costs from cash; a short holds its entry
/// notional in escrow until it is covered.
pub fn enter_position(
    cash: f64,
    side: Side,
    entry_index: usize,
    date: NaiveDate,
    price: f64,
    config: &ExecutionConfig,
) -> EntryResult {
    let mut quantity = position_size(cash, price, config);

    while quantity > 0 {
        let notional = quantity as f64 * price;
        let costs = calculate_costs(notional, config);
        let cash_outlay = notional + costs.total();
        if cash_outlay <= cash {
            return EntryResult::Entered {
                position: Position {
                    side,
                    entry_index,
                    entry_date: date,
                    entry_price: price,
                    quantity,
                    entry_commission: costs.commission,
                    entry_slippage: costs.slippage,
                },
                cash_outlay,
            };
        }
        // Float rounding can push the floor-sized fill a hair past cash.
        quantity -= 1;
    }

    EntryResult::InsufficientFunds
}

/// Result of an exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub trade: Trade,
    /// Amount credited back to cash.
    pub cash_proceeds: f64,
}

/// Close `position` at `price`.
///
/// Long proceeds: quantity × exit − exit costs.
/// Short proceeds: quantity × (2 × entry − exit) − exit costs.
pub fn exit_position(
    position: Position,
    exit_date: NaiveDate,
    price: f64,
    strategy: Strategy,
    config: &ExecutionConfig,
) -> ExitResult {
    let notional = position.quantity as f64 * price;
    let costs = calculate_costs(notional, config);
    let gross = position.unrealized_pnl(price);

    let cash_proceeds = position.market_value(price) - costs.total();

    ExitResult {
        trade: Trade {
            strategy,
            side: position.side,
            quantity: position.quantity,
            entry_price: position.entry_price,
            exit_price: price,
            entry_date: position.entry_date,
            exit_date,
            entry_costs: position.entry_costs(),
            exit_costs: costs.total(),
            pnl: gross - costs.total(),
        },
        cash_proceeds,
    }
}
