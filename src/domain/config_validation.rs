//! Configuration loading and validation.
//!
//! Builds [`BacktestConfig`] and [`WalkForwardConfig`] from a [`ConfigPort`],
//! applying defaults for absent keys and rejecting malformed ones.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::BacktestError;
use crate::domain::walk_forward::WalkForwardConfig;
use crate::ports::config_port::ConfigPort;

const BACKTEST: &str = "backtest";
const WALK_FORWARD: &str = "walk_forward";

pub fn load_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    let defaults = BacktestConfig::default();
    let loaded = BacktestConfig {
        initial_capital: get_double(config, "initial_capital")?
            .unwrap_or(defaults.initial_capital),
        commission_rate: get_double(config, "commission_rate")?
            .unwrap_or(defaults.commission_rate),
        slippage_rate: get_double(config, "slippage_rate")?.unwrap_or(defaults.slippage_rate),
        risk_free_rate: get_double(config, "risk_free_rate")?.unwrap_or(defaults.risk_free_rate),
        start_date: get_date(config, "start_date")?,
        end_date: get_date(config, "end_date")?,
        benchmark: config.get_string(BACKTEST, "benchmark"),
    };
    loaded.validate()?;
    Ok(loaded)
}

pub fn load_walk_forward_config(
    config: &dyn ConfigPort,
) -> Result<WalkForwardConfig, BacktestError> {
    let defaults = WalkForwardConfig::default();
    let loaded = WalkForwardConfig {
        train_window: get_window(config, "train_window")?.unwrap_or(defaults.train_window),
        test_window: get_window(config, "test_window")?.unwrap_or(defaults.test_window),
        warmup: get_parsed(config, WALK_FORWARD, "warmup")?.unwrap_or(defaults.warmup),
        on_slice_error: get_parsed(config, WALK_FORWARD, "on_slice_error")?
            .unwrap_or(defaults.on_slice_error),
    };
    loaded.validate()?;
    Ok(loaded)
}

fn get_double(config: &dyn ConfigPort, key: &str) -> Result<Option<f64>, BacktestError> {
    config
        .get_double(BACKTEST, key)
        .map_err(|reason| BacktestError::invalid(BACKTEST, key, reason))
}

fn get_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, BacktestError> {
    config
        .get_string(BACKTEST, key)
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
                BacktestError::invalid(
                    BACKTEST,
                    key,
                    format!("invalid date '{s}', expected YYYY-MM-DD"),
                )
            })
        })
        .transpose()
}

fn get_window(config: &dyn ConfigPort, key: &str) -> Result<Option<usize>, BacktestError> {
    match config.get_int(WALK_FORWARD, key) {
        Ok(None) => Ok(None),
        Ok(Some(value)) => usize::try_from(value).map(Some).map_err(|_| {
            BacktestError::invalid(WALK_FORWARD, key, format!("must be non-negative, got {value}"))
        }),
        Err(reason) => Err(BacktestError::invalid(WALK_FORWARD, key, reason)),
    }
}

fn get_parsed<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, BacktestError>
where
    T: FromStr<Err = String>,
{
    config
        .get_string(section, key)
        .map(|s| s.parse::<T>().map_err(|reason| BacktestError::invalid(section, key, reason)))
        .transpose()
}
