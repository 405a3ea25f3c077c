//! Rolling standard deviation and z-score.
//!
//! Sample standard deviation (divides by n-1) over the trailing n values.
//! STDDEV(n)[i] = sqrt(sum((V[i-j] - SMA(n)[i])^2 for j in 0..n) / (n-1))
//! Warmup: first (n-1) values are undefined. Requires n >= 2.

use super::Series;

pub fn rolling_stddev(values: &[f64], period: usize) -> Series {
    if period < 2 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            Some(sample_stddev(window))
        })
        .collect()
}

/// (V[i] - SMA(n)[i]) / STDDEV(n)[i]; undefined when the deviation is zero.
pub fn zscore(values: &[f64], period: usize) -> Series {
    let deviations = rolling_stddev(values, period);
    let means = super::sma(values, period);

    values
        .iter()
        .zip(means.iter().zip(&deviations))
        .map(|(&v, (mean, sd))| match (mean, sd) {
            (Some(mean), Some(sd)) if *sd > 0.0 => Some((v - mean) / sd),
            _ => None,
        })
        .collect()
}

pub(crate) fn sample_stddev(window: &[f64]) -> f64 {
    let n = window.len();
    if n < 2 {
        return 0.0;
    }
    let mean = window.iter().sum::<f64>() / n as f64;
    let variance = window
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / (n - 1) as f64;
    variance.sqrt()
}
