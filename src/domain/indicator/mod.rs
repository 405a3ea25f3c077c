//! Technical indicator implementations.
//!
//! Every transform is a pure function over an ordered numeric slice and returns
//! a [`Series`] of the same length. Positions without enough history hold
//! `None`.
//!
//! - [`IndicatorType`]: indicator identity + parameters, used as a label

pub mod bollinger;
pub mod channel;
pub mod ema;
pub mod macd;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod stochastic;

pub use bollinger::{bollinger, BollingerBands};
pub use channel::{prior_rolling_max, prior_rolling_min};
pub use ema::ema;
pub use macd::{macd, Macd};
pub use roc::rate_of_change;
pub use rsi::rsi;
pub use sma::sma;
pub use stddev::{rolling_stddev, zscore};
pub use stochastic::{stochastic, Stochastic};

use std::fmt;

/// One output value per input value; `None` during warmup.
pub type Series = Vec<Option<f64>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Roc(usize),
    Stddev(usize),
    ZScore(usize),
    RollingHigh(usize),
    RollingLow(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Roc(period) => write!(f, "ROC({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::ZScore(period) => write!(f, "ZSCORE({})", period),
            IndicatorType::RollingHigh(period) => write!(f, "HIGHEST({})", period),
            IndicatorType::RollingLow(period) => write!(f, "LOWEST({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

/// Apply `f` element-wise where both inputs are defined.
pub(crate) fn zip_defined(a: &[Option<f64>], b: &[Option<f64>], f: impl Fn(f64, f64) -> f64) -> Series {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(f(*x, *y)),
            _ => None,
        })
        .collect()
}
