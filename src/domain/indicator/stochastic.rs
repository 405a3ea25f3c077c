//! Stochastic oscillator.
//!
//! %K = 100 * (C[i] - lowest low(k)) / (highest high(k) - lowest low(k))
//! %D = SMA(d) of %K
//!
//! %K is undefined for the first (k-1) values and wherever the k-window range
//! is zero. %D is undefined unless all d of its %K inputs are defined.

use super::Series;

#[derive(Debug, Clone, PartialEq)]
pub struct Stochastic {
    pub k: Series,
    pub d: Series,
}

pub fn stochastic(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    k_period: usize,
    d_period: usize,
) -> Stochastic {
    let n = close.len().min(high.len()).min(low.len());

    let k: Series = (0..n)
        .map(|i| {
            if k_period == 0 || i + 1 < k_period {
                return None;
            }
            let start = i + 1 - k_period;
            let highest = high[start..=i].iter().copied().fold(f64::MIN, f64::max);
            let lowest = low[start..=i].iter().copied().fold(f64::MAX, f64::min);
            let range = highest - lowest;
            if range <= 0.0 {
                None
            } else {
                Some(100.0 * (close[i] - lowest) / range)
            }
        })
        .collect();

    let d = (0..n)
        .map(|i| {
            if d_period == 0 || i + 1 < d_period {
                return None;
            }
            let window = &k[i + 1 - d_period..=i];
            let sum = window.iter().copied().sum::<Option<f64>>()?;
            Some(sum / d_period as f64)
        })
        .collect();

    Stochastic { k, d }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stochastic_close_at_high_is_100() {
        let high = [10.0, 11.0, 12.0];
        let low = [8.0, 9.0, 10.0];
        let close = [9.0, 10.0, 12.0];
        let out = stochastic(&high, &low, &close, 3, 1);
        assert!(out.k[1].is_none());
        assert!((out.k[2].unwrap() - 100.0).abs() < 1e-12);
        assert_eq!(out.d[2], out.k[2]);
    }

    #[test]
    fn stochastic_known_value() {
        let high = [10.0, 12.0];
        let low = [6.0, 8.0];
        let close = [7.0, 9.0];
        // highest 12, lowest 6, (9-6)/6 = 50%
        let out = stochastic(&high, &low, &close, 2, 1);
        assert!((out.k[1].unwrap() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn stochastic_d_is_mean_of_k() {
        let high = [10.0, 11.0, 12.0, 13.0];
        let low = [9.0, 9.0, 9.0, 9.0];
        let close = [9.5, 10.0, 11.0, 10.0];
        let out = stochastic(&high, &low, &close, 2, 2);
        let expected = (out.k[2].unwrap() + out.k[3].unwrap()) / 2.0;
        assert!(out.d[2].is_none());
        assert!((out.d[3].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn stochastic_flat_range_undefined() {
        let flat = [5.0; 4];
        let out = stochastic(&flat, &flat, &flat, 2, 2);
        assert!(out.k.iter().all(Option::is_none));
        assert!(out.d.iter().all(Option::is_none));
    }
}
