//! Market data access port.

use crate::domain::benchmark::{BenchmarkPoint, BenchmarkSeries};
use crate::domain::error::BacktestError;
use crate::domain::ohlcv::OhlcvBar;

pub trait DataPort {
    /// Every bar stored for `symbol`, in source order.
    fn fetch_ohlcv(&self, symbol: &str) -> Result<Vec<OhlcvBar>, BacktestError>;

    fn list_symbols(&self) -> Result<Vec<String>, BacktestError>;

    /// Benchmark prices are the closes of an ordinary OHLCV series.
    fn fetch_benchmark(&self, identifier: &str) -> Result<BenchmarkSeries, BacktestError> {
        let points = self
            .fetch_ohlcv(identifier)?
            .into_iter()
            .map(|bar| BenchmarkPoint {
                date: bar.date,
                price: bar.close,
            })
            .collect();
        Ok(BenchmarkSeries::new(identifier, points))
    }
}
