//! JSON report adapter implementing ReportPort.
//!
//! Results are written pretty-printed. Ratio sentinels serialize as tagged
//! values, so the output never contains NaN or infinity.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::domain::walk_forward::WalkForwardSummary;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        JsonReportAdapter
    }

    fn write_value<T: Serialize + ?Sized>(
        &self,
        value: &T,
        output: Option<&Path>,
    ) -> Result<(), BacktestError> {
        match output {
            Some(path) => {
                let file = File::create(path).map_err(|e| BacktestError::Report {
                    reason: format!("failed to create {}: {}", path.display(), e),
                })?;
                write_pretty(BufWriter::new(file), value)
            }
            None => write_pretty(io::stdout().lock(), value),
        }
    }
}

fn write_pretty<W: Write, T: Serialize + ?Sized>(
    mut writer: W,
    value: &T,
) -> Result<(), BacktestError> {
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| BacktestError::Report {
        reason: format!("failed to serialize report: {}", e),
    })?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

impl ReportPort for JsonReportAdapter {
    fn write_backtest(
        &self,
        result: &BacktestResult,
        output: Option<&Path>,
    ) -> Result<(), BacktestError> {
        self.write_value(result, output)
    }

    fn write_comparison(
        &self,
        results: &[BacktestResult],
        output: Option<&Path>,
    ) -> Result<(), BacktestError> {
        self.write_value(results, output)
    }

    fn write_walk_forward(
        &self,
        summary: &WalkForwardSummary,
        output: Option<&Path>,
    ) -> Result<(), BacktestError> {
        self.write_value(summary, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{run_backtest, BacktestConfig};
    use crate::domain::ohlcv::OhlcvBar;
    use crate::domain::strategy::Strategy;
    use crate::domain::walk_forward::{run_walk_forward, WalkForwardConfig};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn make_bars(n: usize) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        (0..n)
            .map(|i| {
                let close = 50.0 + (i % 7) as f64;
                OhlcvBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect()
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn writes_backtest_result() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("result.json");
        let result = run_backtest(
            &make_bars(40),
            Strategy::Momentum,
            &BacktestConfig::default(),
            None,
        )
        .unwrap();

        JsonReportAdapter::new()
            .write_backtest(&result, Some(&path))
            .unwrap();

        let json = read_json(&path);
        assert_eq!(json["strategy"], "momentum");
        assert_eq!(json["bar_count"], 40);
        assert!(json["metrics"]["sharpe_ratio"]["kind"].is_string());
    }

    #[test]
    fn writes_comparison_as_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("compare.json");
        let bars = make_bars(30);
        let results: Vec<BacktestResult> = [Strategy::BuyAndHold, Strategy::Scalping]
            .into_iter()
            .map(|s| run_backtest(&bars, s, &BacktestConfig::default(), None).unwrap())
            .collect();

        JsonReportAdapter::new()
            .write_comparison(&results, Some(&path))
            .unwrap();

        let json = read_json(&path);
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[1]["strategy"], "scalping");
    }

    #[test]
    fn writes_walk_forward_summary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wf.json");
        let config = WalkForwardConfig {
            train_window: 20,
            test_window: 10,
            ..Default::default()
        };
        let summary = run_walk_forward(
            &make_bars(50),
            Strategy::MeanReversion,
            &BacktestConfig::default(),
            &config,
        )
        .unwrap();

        JsonReportAdapter::new()
            .write_walk_forward(&summary, Some(&path))
            .unwrap();

        let json = read_json(&path);
        assert_eq!(json["periods"].as_array().unwrap().len(), 3);
        assert_eq!(json["config"]["warmup"], "test_slice_only");
    }

    #[test]
    fn unwritable_path_is_report_error() {
        let result = run_backtest(&[], Strategy::BuyAndHold, &BacktestConfig::default(), None)
            .unwrap();
        let err = JsonReportAdapter::new()
            .write_backtest(&result, Some(Path::new("/nonexistent/dir/out.json")))
            .unwrap_err();
        assert!(matches!(err, BacktestError::Report { .. }));
    }
}
