//! Per-bar discrete trade signal.

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    Sell,
    #[default]
    Hold,
    Buy,
}

impl Signal {
    pub fn as_i8(self) -> i8 {
        match self {
            Signal::Sell => -1,
            Signal::Hold => 0,
            Signal::Buy => 1,
        }
    }

    pub fn is_active(self) -> bool {
        self != Signal::Hold
    }

    /// Collapse a pair of mutually exclusive conditions into a signal.
    /// `buy` wins if both hold.
    pub fn from_conditions(buy: bool, sell: bool) -> Self {
        if buy {
            Signal::Buy
        } else if sell {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

impl From<Signal> for i8 {
    fn from(signal: Signal) -> Self {
        signal.as_i8()
    }
}

impl TryFrom<i8> for Signal {
    type Error = i8;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Signal::Sell),
            0 => Ok(Signal::Hold),
            1 => Ok(Signal::Buy),
            other => Err(other),
        }
    }
}

impl Serialize for Signal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}
