//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{compare_strategies, run_backtest, BacktestConfig, BacktestResult};
use crate::domain::benchmark::{BenchmarkComparison, BenchmarkSeries, BenchmarkStatus};
use crate::domain::config_validation::{load_backtest_config, load_walk_forward_config};
use crate::domain::error::BacktestError;
use crate::domain::ohlcv::{validate_bars, OhlcvBar};
use crate::domain::strategy::Strategy;
use crate::domain::walk_forward::{run_walk_forward, WalkForwardConfig, WalkForwardSummary};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stratbench", about = "Strategy backtesting and walk-forward evaluation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest one strategy over a price series
    Backtest {
        /// OHLCV CSV file
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        strategy: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Benchmark CSV file; overrides `benchmark` in the config
        #[arg(short, long)]
        benchmark: Option<PathBuf>,
        /// JSON report path; standard output when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Backtest every catalog strategy over the same series
    Compare {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        benchmark: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Walk-forward validation of one strategy
    WalkForward {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        strategy: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        train_window: Option<usize>,
        #[arg(long)]
        test_window: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the strategy catalog
    Strategies,
    /// Check a config file and/or a price series without running anything
    Validate {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            data,
            strategy,
            config,
            benchmark,
            output,
        } => run_single(
            &data,
            &strategy,
            config.as_deref(),
            benchmark.as_deref(),
            output.as_deref(),
        ),
        Command::Compare {
            data,
            config,
            benchmark,
            output,
        } => run_compare(
            &data,
            config.as_deref(),
            benchmark.as_deref(),
            output.as_deref(),
        ),
        Command::WalkForward {
            data,
            strategy,
            config,
            train_window,
            test_window,
            output,
        } => run_walk_forward_cmd(
            &data,
            &strategy,
            config.as_deref(),
            WindowOverrides {
                train_window,
                test_window,
            },
            output.as_deref(),
        ),
        Command::Strategies => {
            print_strategies();
            Ok(())
        }
        Command::Validate { config, data } => run_validate(config.as_deref(), data.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Command-line window sizes that take precedence over the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowOverrides {
    pub train_window: Option<usize>,
    pub test_window: Option<usize>,
}

pub fn load_config(path: Option<&Path>) -> Result<Option<FileConfigAdapter>, BacktestError> {
    path.map(|p| {
        info!(path = %p.display(), "loading config");
        FileConfigAdapter::from_file(p)
    })
    .transpose()
}

pub fn build_backtest_config(
    config: Option<&FileConfigAdapter>,
) -> Result<BacktestConfig, BacktestError> {
    match config {
        Some(c) => load_backtest_config(c),
        None => Ok(BacktestConfig::default()),
    }
}

pub fn build_walk_forward_config(
    config: Option<&FileConfigAdapter>,
    overrides: WindowOverrides,
) -> Result<WalkForwardConfig, BacktestError> {
    let mut wf = match config {
        Some(c) => load_walk_forward_config(c)?,
        None => WalkForwardConfig::default(),
    };
    if let Some(train) = overrides.train_window {
        wf.train_window = train;
    }
    if let Some(test) = overrides.test_window {
        wf.test_window = test;
    }
    wf.validate()?;
    Ok(wf)
}

fn data_source() -> CsvAdapter {
    CsvAdapter::new(PathBuf::new())
}

fn load_bars(data: &CsvAdapter, path: &Path) -> Result<Vec<OhlcvBar>, BacktestError> {
    let bars = data.fetch_ohlcv(&path.to_string_lossy())?;
    info!(path = %path.display(), bars = bars.len(), "loaded price series");
    Ok(bars)
}

/// The command-line path wins over the config's `benchmark` key. A benchmark
/// that cannot be loaded is reported in the metrics, never fatal.
fn resolve_benchmark(
    data: &CsvAdapter,
    cli_path: Option<&Path>,
    config: &BacktestConfig,
) -> Option<BenchmarkSeries> {
    let identifier = cli_path
        .map(|p| p.to_string_lossy().into_owned())
        .or_else(|| config.benchmark.clone())?;

    match data.fetch_benchmark(&identifier) {
        Ok(series) => Some(series),
        Err(e) => {
            warn!(benchmark = %identifier, error = %e, "benchmark could not be loaded");
            Some(BenchmarkSeries::new(identifier, Vec::new()))
        }
    }
}

fn run_single(
    data_path: &Path,
    strategy: &str,
    config_path: Option<&Path>,
    benchmark_path: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), BacktestError> {
    let strategy: Strategy = strategy.parse()?;
    let adapter = load_config(config_path)?;
    let config = build_backtest_config(adapter.as_ref())?;

    let data = data_source();
    let bars = load_bars(&data, data_path)?;
    let benchmark = resolve_benchmark(&data, benchmark_path, &config);

    let result = run_backtest(&bars, strategy, &config, benchmark.as_ref())?;
    print_summary(&result);
    JsonReportAdapter::new().write_backtest(&result, output)
}

fn run_compare(
    data_path: &Path,
    config_path: Option<&Path>,
    benchmark_path: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), BacktestError> {
    let adapter = load_config(config_path)?;
    let config = build_backtest_config(adapter.as_ref())?;

    let data = data_source();
    let bars = load_bars(&data, data_path)?;
    let benchmark = resolve_benchmark(&data, benchmark_path, &config);

    let results = compare_strategies(&bars, &Strategy::ALL, &config, benchmark.as_ref());
    if results.len() < Strategy::ALL.len() {
        warn!(
            completed = results.len(),
            total = Strategy::ALL.len(),
            "some strategies failed"
        );
    }
    print_comparison(&results);
    JsonReportAdapter::new().write_comparison(&results, output)
}

fn run_walk_forward_cmd(
    data_path: &Path,
    strategy: &str,
    config_path: Option<&Path>,
    overrides: WindowOverrides,
    output: Option<&Path>,
) -> Result<(), BacktestError> {
    let strategy: Strategy = strategy.parse()?;
    let adapter = load_config(config_path)?;
    let config = build_backtest_config(adapter.as_ref())?;
    let wf_config = build_walk_forward_config(adapter.as_ref(), overrides)?;

    let bars = load_bars(&data_source(), data_path)?;
    let summary = run_walk_forward(&bars, strategy, &config, &wf_config)?;
    print_walk_forward(&summary);
    JsonReportAdapter::new().write_walk_forward(&summary, output)
}

fn run_validate(config_path: Option<&Path>, data_path: Option<&Path>) -> Result<(), BacktestError> {
    if config_path.is_none() && data_path.is_none() {
        eprintln!("nothing to validate: pass --config and/or --data");
        return Ok(());
    }

    let adapter = load_config(config_path)?;
    if adapter.is_some() {
        build_backtest_config(adapter.as_ref())?;
        build_walk_forward_config(adapter.as_ref(), WindowOverrides::default())?;
        eprintln!("config: OK");
    }

    if let Some(path) = data_path {
        let bars = load_bars(&data_source(), path)?;
        validate_bars(&bars)?;
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => eprintln!(
                "data: OK ({} bars, {} to {})",
                bars.len(),
                first.date,
                last.date
            ),
            _ => eprintln!("data: OK (empty)"),
        }
    }
    Ok(())
}

fn print_strategies() {
    for strategy in Strategy::ALL {
        let indicators: Vec<String> = strategy.indicators().iter().map(|i| i.to_string()).collect();
        println!("{:<16} {}", strategy.id(), strategy.description());
        if !indicators.is_empty() {
            println!("{:<16} uses {}", "", indicators.join(", "));
        }
    }
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    eprintln!("Strategy:          {}", result.strategy);
    eprintln!("Bars:              {}", result.bar_count);
    eprintln!("Final equity:      {:.2}", result.final_equity);
    eprintln!("Total return:      {:.2}%", m.total_return * 100.0);
    eprintln!("Annualized return: {:.2}%", m.annualized_return * 100.0);
    eprintln!("Volatility:        {:.2}%", m.volatility * 100.0);
    eprintln!("Sharpe ratio:      {:.3}", m.sharpe_ratio.value());
    eprintln!("Sortino ratio:     {:.3}", m.sortino_ratio.value());
    eprintln!("Max drawdown:      {:.2}%", m.max_drawdown * 100.0);
    eprintln!("Calmar ratio:      {:.3}", m.calmar_ratio.value());
    eprintln!(
        "Trades:            {} ({} won, {} lost)",
        m.total_trades, m.trades_won, m.trades_lost
    );
    eprintln!("Win rate:          {:.1}%", m.win_rate * 100.0);
    eprintln!("Profit factor:     {:.3}", m.profit_factor.value());
    eprintln!("VaR 95 / 99:       {:.4} / {:.4}", m.var_95, m.var_99);
    eprintln!("CVaR 95:           {:.4}", m.cvar_95);
    if result.skipped_entries > 0 {
        eprintln!("Skipped entries:   {}", result.skipped_entries);
    }
    print_benchmark(&m.benchmark);
}

fn print_benchmark(benchmark: &BenchmarkComparison) {
    match &benchmark.status {
        BenchmarkStatus::NotRequested => {}
        BenchmarkStatus::Computed => eprintln!(
            "Benchmark:         return {:.2}%, alpha {:.4}, beta {:.3}",
            benchmark.benchmark_return * 100.0,
            benchmark.alpha,
            benchmark.beta
        ),
        BenchmarkStatus::Unavailable { reason } => {
            eprintln!("Benchmark:         unavailable ({reason})")
        }
    }
}

fn print_comparison(results: &[BacktestResult]) {
    eprintln!(
        "{:<16} {:>10} {:>8} {:>10} {:>7}",
        "strategy", "return", "sharpe", "drawdown", "trades"
    );
    for r in results {
        eprintln!(
            "{:<16} {:>9.2}% {:>8.3} {:>9.2}% {:>7}",
            r.strategy.id(),
            r.metrics.total_return * 100.0,
            r.metrics.sharpe_ratio.value(),
            r.metrics.max_drawdown * 100.0,
            r.metrics.total_trades
        );
    }
}

fn print_walk_forward(summary: &WalkForwardSummary) {
    eprintln!(
        "Walk-forward {} (train {}, test {}): {} periods, {} skipped",
        summary.strategy,
        summary.config.train_window,
        summary.config.test_window,
        summary.periods.len(),
        summary.skipped_periods
    );
    for p in &summary.periods {
        eprintln!(
            "  #{:<3} {} .. {}  return {:>7.2}%  sharpe {:>7.3}  trades {}",
            p.index,
            p.test_start,
            p.test_end,
            p.total_return * 100.0,
            p.sharpe_ratio.value(),
            p.trade_count
        );
    }
    let a = &summary.averages;
    eprintln!(
        "  avg   return {:.2}%  sharpe {:.3}  drawdown {:.2}%  win rate {:.1}%",
        a.total_return * 100.0,
        a.sharpe_ratio,
        a.max_drawdown * 100.0,
        a.win_rate * 100.0
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_backtest() {
        let cli = Cli::try_parse_from([
            "stratbench",
            "backtest",
            "--data",
            "prices.csv",
            "--strategy",
            "ma_cross",
            "--output",
            "out.json",
        ])
        .unwrap();
        match cli.command {
            Command::Backtest {
                data,
                strategy,
                output,
                config,
                benchmark,
            } => {
                assert_eq!(data, PathBuf::from("prices.csv"));
                assert_eq!(strategy, "ma_cross");
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert!(config.is_none());
                assert!(benchmark.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_parses_walk_forward_overrides() {
        let cli = Cli::try_parse_from([
            "stratbench",
            "walk-forward",
            "-d",
            "prices.csv",
            "-s",
            "rsi",
            "--train-window",
            "100",
            "--test-window",
            "20",
        ])
        .unwrap();
        match cli.command {
            Command::WalkForward {
                train_window,
                test_window,
                ..
            } => {
                assert_eq!(train_window, Some(100));
                assert_eq!(test_window, Some(20));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_requires_data_for_compare() {
        assert!(Cli::try_parse_from(["stratbench", "compare"]).is_err());
    }

    #[test]
    fn walk_forward_overrides_win_over_config() {
        let adapter = FileConfigAdapter::from_string(
            "[walk_forward]\ntrain_window = 252\ntest_window = 63\n",
        )
        .unwrap();
        let wf = build_walk_forward_config(
            Some(&adapter),
            WindowOverrides {
                train_window: Some(100),
                test_window: None,
            },
        )
        .unwrap();
        assert_eq!(wf.train_window, 100);
        assert_eq!(wf.test_window, 63);
    }

    #[test]
    fn zero_test_window_override_is_rejected() {
        let err = build_walk_forward_config(
            None,
            WindowOverrides {
                train_window: None,
                test_window: Some(0),
            },
        )
        .unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { .. }));
    }

    #[test]
    fn unknown_strategy_is_reported() {
        let err = run_single(
            Path::new("missing.csv"),
            "nope",
            None,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BacktestError::UnknownStrategy { .. }));
    }

    #[test]
    fn missing_data_file_is_data_error() {
        let err = run_single(
            Path::new("/nonexistent/prices.csv"),
            "momentum",
            None,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BacktestError::Data { .. }));
    }
}
