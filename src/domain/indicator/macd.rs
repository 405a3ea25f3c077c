//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of the defined part of the MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Warmup: line from max(fast, slow) - 1, signal and histogram a further
//! signal - 1 values later.

use super::{ema, zip_defined, Series};

#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub line: Series,
    pub signal: Series,
    pub histogram: Series,
}

pub fn macd(values: &[f64], fast: usize, slow: usize, signal_period: usize) -> Macd {
    let line = zip_defined(&ema(values, fast), &ema(values, slow), |f, s| f - s);

    let mut signal = vec![None; values.len()];
    if let Some(start) = line.iter().position(Option::is_some) {
        let defined: Vec<f64> = line[start..].iter().flatten().copied().collect();
        for (offset, value) in ema(&defined, signal_period).into_iter().enumerate() {
            signal[start + offset] = value;
        }
    }

    let histogram = zip_defined(&line, &signal, |l, s| l - s);

    Macd {
        line,
        signal,
        histogram,
    }
}
