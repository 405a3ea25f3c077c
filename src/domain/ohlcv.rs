//! OHLCV bar representation and boundary validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::BacktestError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    fn check_fields(&self, index: usize) -> Result<(), BacktestError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(BacktestError::integrity(
                    index,
                    format!("{name} is not a finite number"),
                ));
            }
        }
        if self.close <= 0.0 {
            return Err(BacktestError::integrity(index, "close must be positive"));
        }
        if self.high < self.low {
            return Err(BacktestError::integrity(index, "high is below low"));
        }
        Ok(())
    }
}

/// Reject series that would make a replay meaningless: non-finite fields,
/// non-positive closes, inverted ranges, or dates that do not strictly increase.
pub fn validate_bars(bars: &[OhlcvBar]) -> Result<(), BacktestError> {
    for (i, bar) in bars.iter().enumerate() {
        bar.check_fields(i)?;
        check_order(bars, i)?;
    }
    Ok(())
}

/// Date ordering alone; field values are not inspected.
pub fn validate_dates(bars: &[OhlcvBar]) -> Result<(), BacktestError> {
    (1..bars.len()).try_for_each(|i| check_order(bars, i))
}

fn check_order(bars: &[OhlcvBar], i: usize) -> Result<(), BacktestError> {
    if i > 0 && bars[i].date <= bars[i - 1].date {
        return Err(BacktestError::integrity(
            i,
            format!("date {} does not follow {}", bars[i].date, bars[i - 1].date),
        ));
    }
    Ok(())
}

pub fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
