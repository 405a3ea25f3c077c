//! Open position and completed trade records.

use chrono::NaiveDate;
use serde::Serialize;

use super::strategy::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub side: Side,
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub quantity: u64,
    pub entry_commission: f64,
    pub entry_slippage: f64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == Side::Short
    }

    pub fn entry_costs(&self) -> f64 {
        self.entry_commission + self.entry_slippage
    }

    /// Value the position contributes to equity at `price`.
    ///
    /// A short carries its escrowed entry notional plus the price difference:
    /// quantity × (2 × entry − price).
    pub fn market_value(&self, price: f64) -> f64 {
        let qty = self.quantity as f64;
        match self.side {
            Side::Long => qty * price,
            Side::Short => qty * (2.0 * self.entry_price - price),
        }
    }

    /// Gross profit of closing at `price`, before any costs.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        let qty = self.quantity as f64;
        match self.side {
            Side::Long => (price - self.entry_price) * qty,
            Side::Short => (self.entry_price - price) * qty,
        }
    }
}

/// Immutable record of a closed position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub strategy: Strategy,
    pub side: Side,
    pub quantity: u64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_costs: f64,
    pub exit_costs: f64,
    /// Gross pnl less exit-time commission and slippage. Entry costs were taken
    /// from cash when the position opened and are recorded in `entry_costs`.
    pub pnl: f64,
}

impl Trade {
    /// Pnl after both legs' costs.
    pub fn net_of_all_costs(&self) -> f64 {
        self.pnl - self.entry_costs
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
