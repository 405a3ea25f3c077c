//! Rolling extremes over the *prior* window (the current value is excluded),
//! as used for breakout levels.
//!
//! HIGHEST(n)[i] = max(V[i-n..i]); warmup: first n values are undefined.

use super::Series;

pub fn prior_rolling_max(values: &[f64], period: usize) -> Series {
    prior_rolling(values, period, f64::max)
}

pub fn prior_rolling_min(values: &[f64], period: usize) -> Series {
    prior_rolling(values, period, f64::min)
}

fn prior_rolling(values: &[f64], period: usize, pick: fn(f64, f64) -> f64) -> Series {
    (0..values.len())
        .map(|i| {
            if period == 0 || i < period {
                return None;
            }
            values[i - period..i].iter().copied().reduce(pick)
        })
        .collect()
}
