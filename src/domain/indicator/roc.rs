//! Rate of Change.
//!
//! ROC(n)[i] = (V[i] - V[i-n]) / V[i-n], as a fraction (0.05 == 5%).
//! If V[i-n] == 0: undefined. Warmup: first n values are undefined.

use super::Series;

pub fn rate_of_change(values: &[f64], period: usize) -> Series {
    (0..values.len())
        .map(|i| {
            if period == 0 || i < period {
                return None;
            }
            let prev = values[i - period];
            if prev == 0.0 {
                None
            } else {
                Some((values[i] - prev) / prev)
            }
        })
        .collect()
}
