//! End-to-end tests over the domain pipeline with in-memory data.
//!
//! Tests cover:
//! - Reference scenarios: flat market, linear trend, single shock, exact pnl
//! - Accounting identity across a real strategy's signal stream
//! - Benchmark alignment and degradation
//! - Walk-forward slicing
//! - Data port defaults through a mock

mod common;

use approx::assert_relative_eq;
use common::*;
use stratbench::domain::backtest::{compare_strategies, run_backtest, BacktestConfig};
use stratbench::domain::benchmark::{BenchmarkPoint, BenchmarkSeries, BenchmarkStatus};
use stratbench::domain::error::BacktestError;
use stratbench::domain::execution::ExecutionConfig;
use stratbench::domain::metrics::{Metrics, Ratio};
use stratbench::domain::position::Side;
use stratbench::domain::signal::Signal;
use stratbench::domain::simulation::{simulate, step, SimulationContext, SimulationState};
use stratbench::domain::strategy::Strategy;
use stratbench::domain::walk_forward::{run_walk_forward, WalkForwardConfig};
use stratbench::ports::data_port::DataPort;

fn zero_cost_config() -> BacktestConfig {
    BacktestConfig {
        commission_rate: 0.0,
        slippage_rate: 0.0,
        ..BacktestConfig::default()
    }
}

mod scenarios {
    use super::*;

    #[test]
    fn flat_market_buy_and_hold() {
        let bars = flat_bars(50, 100.0);
        let result =
            run_backtest(&bars, Strategy::BuyAndHold, &BacktestConfig::default(), None).unwrap();

        assert_eq!(result.metrics.total_return, 0.0);
        assert_eq!(result.metrics.sharpe_ratio, Ratio::Undefined);
        assert_eq!(result.metrics.sharpe_ratio.value(), 0.0);
        assert_eq!(result.metrics.max_drawdown, 0.0);
        assert!(result.trades.is_empty());
        assert_eq!(result.open_position.as_ref().unwrap().entry_index, 0);
    }

    #[test]
    fn linear_trend_ma_cross_enters_once() {
        let bars = linear_bars(100, 100.0, 200.0);
        let result =
            run_backtest(&bars, Strategy::MovingAverageCross, &BacktestConfig::default(), None)
                .unwrap();

        let position = result.open_position.as_ref().unwrap();
        assert_eq!(position.side, Side::Long);
        assert_eq!(position.entry_index, 29);
        assert!(result.trades.is_empty());
        assert!(result.metrics.total_return > 0.0);

        // only the one-time entry cost ever shows up as drawdown
        let entry_cost_fraction = position.entry_costs() / 100_000.0;
        assert!(result.metrics.max_drawdown >= -entry_cost_fraction - 1e-12);
        let after_entry = Metrics::compute(&result.equity_curve[29..], &[], 0.02, None);
        assert_eq!(after_entry.max_drawdown, 0.0);
    }

    #[test]
    fn linear_trend_zero_cost_has_no_drawdown() {
        let bars = linear_bars(100, 100.0, 200.0);
        let result =
            run_backtest(&bars, Strategy::MovingAverageCross, &zero_cost_config(), None).unwrap();
        assert!(result.metrics.max_drawdown > -1e-9);
    }

    #[test]
    fn single_shock_gives_negative_tail_risk() {
        let mut closes = vec![100.0; 11];
        closes[4] = 80.0;
        let bars = bars_from_closes(&closes);
        let result = run_backtest(&bars, Strategy::BuyAndHold, &zero_cost_config(), None).unwrap();

        let m = &result.metrics;
        assert!(m.var_95 < -0.05, "var_95 = {}", m.var_95);
        assert!(m.cvar_95 < -0.05, "cvar_95 = {}", m.cvar_95);
        assert!(m.cvar_95 <= m.var_95);
        assert_relative_eq!(m.cvar_95, -0.2, epsilon = 1e-12);
        assert_relative_eq!(m.max_drawdown, -0.2, epsilon = 1e-12);
    }

    #[test]
    fn zero_cost_round_trip_is_exact() {
        let bars = bars_from_closes(&[100.0, 110.0]);
        let ctx = SimulationContext {
            strategy: Strategy::Momentum,
            execution: ExecutionConfig {
                commission_rate: 0.0,
                slippage_rate: 0.0,
            },
        };
        let state = simulate(&bars, &[Signal::Buy, Signal::Sell], &ctx, 1_000.0).unwrap();

        assert_eq!(state.trades[0].quantity, 10);
        assert_eq!(state.trades[0].pnl, 100.0);
        assert_eq!(state.trades[0].net_of_all_costs(), 100.0);
    }
}

mod accounting {
    use super::*;

    #[test]
    fn equity_is_cash_plus_mark_to_market_for_every_strategy() {
        let bars = wavy_bars(200);
        for strategy in Strategy::ALL {
            let signals = strategy.generate_signals(&bars);
            let ctx = SimulationContext {
                strategy,
                execution: ExecutionConfig::default(),
            };
            let mut state = SimulationState::new(100_000.0);
            for (i, (bar, &signal)) in bars.iter().zip(&signals).enumerate() {
                state = step(state, &ctx, i, bar, signal).unwrap();
                let mtm = state
                    .position
                    .as_ref()
                    .map_or(0.0, |p| p.market_value(bar.close));
                let recorded = state.equity_curve.last().unwrap().equity;
                assert!(
                    (state.cash + mtm - recorded).abs() < 1e-6,
                    "{strategy} bar {i}"
                );
                assert!(state.cash >= -1e-6, "{strategy} bar {i}: cash {}", state.cash);
            }
        }
    }

    #[test]
    fn trade_ledger_reconciles_with_final_equity() {
        let bars = wavy_bars(150);
        let result =
            run_backtest(&bars, Strategy::Scalping, &BacktestConfig::default(), None).unwrap();

        let realized: f64 = result.trades.iter().map(|t| t.net_of_all_costs()).sum();
        let open = result.open_position.as_ref().map_or(0.0, |p| {
            p.unrealized_pnl(bars.last().unwrap().close) - p.entry_costs()
        });
        assert!((100_000.0 + realized + open - result.final_equity).abs() < 1e-6);
    }

    #[test]
    fn signal_length_mismatch_is_fatal() {
        let bars = wavy_bars(10);
        let ctx = SimulationContext {
            strategy: Strategy::Momentum,
            execution: ExecutionConfig::default(),
        };
        let err = simulate(&bars, &[Signal::Hold; 9], &ctx, 1_000.0).unwrap_err();
        assert!(err.is_data_integrity());
    }
}

mod benchmark {
    use super::*;

    fn benchmark_from(bars: &[OhlcvBar]) -> BenchmarkSeries {
        BenchmarkSeries::new(
            "SELF",
            bars.iter()
                .map(|b| BenchmarkPoint {
                    date: b.date,
                    price: b.close,
                })
                .collect(),
        )
    }

    #[test]
    fn buy_and_hold_tracks_its_own_series() {
        let bars = wavy_bars(120);
        let bench = benchmark_from(&bars);
        let result = run_backtest(
            &bars,
            Strategy::BuyAndHold,
            &BacktestConfig::default(),
            Some(&bench),
        )
        .unwrap();

        let cmp = &result.metrics.benchmark;
        assert_eq!(cmp.status, BenchmarkStatus::Computed);
        assert!(cmp.beta > 0.99 && cmp.beta <= 1.0 + 1e-9, "beta = {}", cmp.beta);
    }

    #[test]
    fn disjoint_dates_degrade_without_failing() {
        let bars = wavy_bars(60);
        let other: Vec<BenchmarkPoint> = benchmark_from(&wavy_bars(60))
            .points
            .into_iter()
            .map(|p| BenchmarkPoint {
                date: p.date + chrono::Duration::days(1_000),
                price: p.price,
            })
            .collect();
        let bench = BenchmarkSeries::new("ELSEWHERE", other);

        let result =
            run_backtest(&bars, Strategy::Momentum, &BacktestConfig::default(), Some(&bench))
                .unwrap();
        let cmp = &result.metrics.benchmark;
        assert!(matches!(cmp.status, BenchmarkStatus::Unavailable { .. }));
        assert_eq!((cmp.alpha, cmp.beta, cmp.benchmark_return), (0.0, 0.0, 0.0));
    }
}

mod walk_forward {
    use super::*;

    #[test]
    fn slice_count_follows_window_arithmetic() {
        let config = WalkForwardConfig {
            train_window: 100,
            test_window: 20,
            ..Default::default()
        };
        for n in [60, 100, 119, 120, 180, 245, 300] {
            let summary = run_walk_forward(
                &wavy_bars(n),
                Strategy::RsiMeanReversion,
                &BacktestConfig::default(),
                &config,
            )
            .unwrap();
            let expected = n.saturating_sub(100) / 20;
            assert_eq!(summary.periods.len(), expected, "n = {n}");
        }
    }

    #[test]
    fn rejects_what_a_full_backtest_rejects() {
        let mut bars = wavy_bars(140);
        bars[120].date = bars[100].date;
        let config = WalkForwardConfig {
            train_window: 100,
            test_window: 20,
            ..Default::default()
        };

        let backtest = run_backtest(&bars, Strategy::Momentum, &BacktestConfig::default(), None);
        let wf = run_walk_forward(&bars, Strategy::Momentum, &BacktestConfig::default(), &config);
        assert!(backtest.unwrap_err().is_data_integrity());
        assert!(wf.unwrap_err().is_data_integrity());
    }

    #[test]
    fn each_period_starts_flat() {
        let config = WalkForwardConfig {
            train_window: 50,
            test_window: 30,
            ..Default::default()
        };
        let summary = run_walk_forward(
            &wavy_bars(200),
            Strategy::BuyAndHold,
            &BacktestConfig::default(),
            &config,
        )
        .unwrap();
        // buy-and-hold opens on each slice's first bar and never closes
        assert_eq!(summary.periods.len(), 5);
        assert!(summary.periods.iter().all(|p| p.trade_count == 0));
        for pair in summary.periods.windows(2) {
            assert!(pair[0].test_end < pair[1].test_start);
        }
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn mock_port_feeds_backtest_and_benchmark() {
        let port = MockDataPort::new()
            .with_bars("ACME", wavy_bars(90))
            .with_bars("INDEX", linear_bars(90, 50.0, 60.0));

        let bars = port.fetch_ohlcv("ACME").unwrap();
        let bench = port.fetch_benchmark("INDEX").unwrap();
        assert_eq!(bench.points.len(), 90);

        let result =
            run_backtest(&bars, Strategy::Bollinger, &BacktestConfig::default(), Some(&bench))
                .unwrap();
        assert_eq!(result.bar_count, 90);
        assert!(result.metrics.benchmark.is_available());
        assert_eq!(port.list_symbols().unwrap(), vec!["ACME", "INDEX"]);
    }

    #[test]
    fn mock_port_errors_propagate() {
        let port = MockDataPort::new().with_error("BAD", "connection refused");
        assert!(matches!(
            port.fetch_benchmark("BAD"),
            Err(BacktestError::Data { .. })
        ));
    }

    #[test]
    fn date_bounds_restrict_the_run() {
        let bars = wavy_bars(100);
        let config = BacktestConfig {
            start_date: Some(bars[10].date),
            end_date: Some(bars[59].date),
            ..BacktestConfig::default()
        };
        let result = run_backtest(&bars, Strategy::Breakout, &config, None).unwrap();
        assert_eq!(result.bar_count, 50);
        assert_eq!(result.first_date, Some(bars[10].date));
        assert_eq!(result.last_date, Some(bars[59].date));
    }

    #[test]
    fn compare_covers_the_catalog() {
        let results = compare_strategies(
            &wavy_bars(120),
            &Strategy::ALL,
            &BacktestConfig::default(),
            None,
        );
        assert_eq!(results.len(), Strategy::ALL.len());
        assert!(results.iter().any(|r| !r.trades.is_empty()));
    }
}
