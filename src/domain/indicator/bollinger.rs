//! Bollinger Bands.
//!
//! - Middle: Simple Moving Average over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the rolling sample standard deviation from [`super::rolling_stddev`].
//! Default parameters: period=20, multiplier=2.0.
//! Warmup: first (period-1) values are undefined.

use super::{rolling_stddev, sma, Series};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub middle: Series,
    pub upper: Series,
    pub lower: Series,
}

pub fn bollinger(values: &[f64], period: usize, multiplier: f64) -> BollingerBands {
    let middle = sma(values, period);
    let deviation = rolling_stddev(values, period);

    let mut upper = Vec::with_capacity(values.len());
    let mut lower = Vec::with_capacity(values.len());
    for (m, sd) in middle.iter().zip(&deviation) {
        match (m, sd) {
            (Some(m), Some(sd)) => {
                upper.push(Some(m + multiplier * sd));
                lower.push(Some(m - multiplier * sd));
            }
            _ => {
                upper.push(None);
                lower.push(None);
            }
        }
    }

    BollingerBands {
        middle,
        upper,
        lower,
    }
}
