//! Report output port.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::domain::walk_forward::WalkForwardSummary;

/// Writes run results. `output` of `None` means standard output.
pub trait ReportPort {
    fn write_backtest(
        &self,
        result: &BacktestResult,
        output: Option<&Path>,
    ) -> Result<(), BacktestError>;

    /// One entry per strategy that completed.
    fn write_comparison(
        &self,
        results: &[BacktestResult],
        output: Option<&Path>,
    ) -> Result<(), BacktestError>;

    fn write_walk_forward(
        &self,
        summary: &WalkForwardSummary,
        output: Option<&Path>,
    ) -> Result<(), BacktestError>;
}
