#![allow(dead_code)]

use chrono::NaiveDate;
use stratbench::domain::error::BacktestError;
pub use stratbench::domain::ohlcv::OhlcvBar;
use stratbench::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(&self, symbol: &str) -> Result<Vec<OhlcvBar>, BacktestError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(BacktestError::Data {
                reason: reason.clone(),
            });
        }
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| BacktestError::Data {
                reason: format!("no data for {symbol}"),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, BacktestError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date_str: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1_000_000.0,
    }
}

/// One bar per calendar day from 2020-01-01 with the given closes.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2020, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1_000_000.0,
        })
        .collect()
}

pub fn flat_bars(n: usize, price: f64) -> Vec<OhlcvBar> {
    bars_from_closes(&vec![price; n])
}

/// `n` closes rising linearly from `from` to `to`.
pub fn linear_bars(n: usize, from: f64, to: f64) -> Vec<OhlcvBar> {
    let step = if n > 1 { (to - from) / (n - 1) as f64 } else { 0.0 };
    let closes: Vec<f64> = (0..n).map(|i| from + step * i as f64).collect();
    bars_from_closes(&closes)
}

/// Deterministic oscillating series with drift; exercises every strategy.
pub fn wavy_bars(n: usize) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + 15.0 * (t / 9.0).sin() + 6.0 * (t / 2.3).cos() + 0.05 * t
        })
        .collect();
    bars_from_closes(&closes)
}
