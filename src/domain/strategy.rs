//! Strategy catalog: a closed set of signal generators.
//!
//! Every generator reads only bars at or before the bar it emits for. Rules are
//! either edge-triggered (fire on the bar a condition becomes true) or
//! level-triggered (fire on every bar the condition holds).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::BacktestError;
use super::indicator::{
    self, bollinger, ema, prior_rolling_max, prior_rolling_min, rate_of_change, rsi, sma, zscore,
    IndicatorType, Series,
};
use super::ohlcv::{closes, OhlcvBar};
use super::signal::Signal;

const MA_FAST: usize = 10;
const MA_SLOW: usize = 30;
const RSI_PERIOD: usize = indicator::rsi::DEFAULT_PERIOD;
const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const BOLLINGER_PERIOD: usize = indicator::bollinger::DEFAULT_PERIOD;
const BOLLINGER_MULT: f64 = indicator::bollinger::DEFAULT_MULTIPLIER;
const MOMENTUM_PERIOD: usize = 10;
const MOMENTUM_THRESHOLD: f64 = 0.05;
const ZSCORE_PERIOD: usize = 20;
const ZSCORE_THRESHOLD: f64 = 2.0;
const BREAKOUT_PERIOD: usize = 20;
const SCALP_FAST: usize = 5;
const SCALP_SLOW: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    #[serde(rename = "buy_and_hold")]
    BuyAndHold,
    #[serde(rename = "ma_cross")]
    MovingAverageCross,
    #[serde(rename = "rsi")]
    RsiMeanReversion,
    #[serde(rename = "bollinger")]
    Bollinger,
    #[serde(rename = "momentum")]
    Momentum,
    #[serde(rename = "mean_reversion")]
    MeanReversion,
    #[serde(rename = "breakout")]
    Breakout,
    #[serde(rename = "scalping")]
    Scalping,
}

impl Strategy {
    pub const ALL: [Strategy; 8] = [
        Strategy::BuyAndHold,
        Strategy::MovingAverageCross,
        Strategy::RsiMeanReversion,
        Strategy::Bollinger,
        Strategy::Momentum,
        Strategy::MeanReversion,
        Strategy::Breakout,
        Strategy::Scalping,
    ];

    /// Identifier used by drivers and configuration files.
    pub fn id(self) -> &'static str {
        match self {
            Strategy::BuyAndHold => "buy_and_hold",
            Strategy::MovingAverageCross => "ma_cross",
            Strategy::RsiMeanReversion => "rsi",
            Strategy::Bollinger => "bollinger",
            Strategy::Momentum => "momentum",
            Strategy::MeanReversion => "mean_reversion",
            Strategy::Breakout => "breakout",
            Strategy::Scalping => "scalping",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Strategy::BuyAndHold => "buy on the first bar and never exit",
            Strategy::MovingAverageCross => "SMA(10) crossing SMA(30), edge-triggered",
            Strategy::RsiMeanReversion => "RSI(14) crossing up through 30 / down through 70",
            Strategy::Bollinger => "close crossing back inside Bollinger(20, 2)",
            Strategy::Momentum => "10-bar change beyond +/-5%, level-triggered",
            Strategy::MeanReversion => "20-bar z-score beyond +/-2, level-triggered",
            Strategy::Breakout => "close breaking the prior 20-bar high/low",
            Strategy::Scalping => "EMA(5) above/below EMA(15), level-triggered",
        }
    }

    pub fn indicators(self) -> Vec<IndicatorType> {
        match self {
            Strategy::BuyAndHold => vec![],
            Strategy::MovingAverageCross => {
                vec![IndicatorType::Sma(MA_FAST), IndicatorType::Sma(MA_SLOW)]
            }
            Strategy::RsiMeanReversion => vec![IndicatorType::Rsi(RSI_PERIOD)],
            Strategy::Bollinger => vec![IndicatorType::Bollinger {
                period: BOLLINGER_PERIOD,
                stddev_mult_x100: (BOLLINGER_MULT * 100.0) as u32,
            }],
            Strategy::Momentum => vec![IndicatorType::Roc(MOMENTUM_PERIOD)],
            Strategy::MeanReversion => vec![IndicatorType::ZScore(ZSCORE_PERIOD)],
            Strategy::Breakout => vec![
                IndicatorType::RollingHigh(BREAKOUT_PERIOD),
                IndicatorType::RollingLow(BREAKOUT_PERIOD),
            ],
            Strategy::Scalping => {
                vec![IndicatorType::Ema(SCALP_FAST), IndicatorType::Ema(SCALP_SLOW)]
            }
        }
    }

    /// One signal per bar, aligned 1:1 with `bars`.
    pub fn generate_signals(self, bars: &[OhlcvBar]) -> Vec<Signal> {
        if bars.is_empty() {
            return Vec::new();
        }
        let close = closes(bars);
        match self {
            Strategy::BuyAndHold => buy_and_hold(bars.len()),
            Strategy::MovingAverageCross => moving_average_cross(&close),
            Strategy::RsiMeanReversion => rsi_mean_reversion(&close),
            Strategy::Bollinger => bollinger_reentry(&close),
            Strategy::Momentum => momentum(&close),
            Strategy::MeanReversion => mean_reversion(&close),
            Strategy::Breakout => breakout(bars, &close),
            Strategy::Scalping => scalping(&close),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Strategy {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.id() == wanted)
            .ok_or_else(|| BacktestError::UnknownStrategy {
                name: s.to_string(),
                expected: Strategy::ALL.map(Strategy::id).join(", "),
            })
    }
}

fn buy_and_hold(len: usize) -> Vec<Signal> {
    let mut signals = vec![Signal::Hold; len];
    signals[0] = Signal::Buy;
    signals
}

/// True on bars where `condition` switches from false to true.
fn rising_edge(condition: &[bool]) -> Vec<bool> {
    condition
        .iter()
        .enumerate()
        .map(|(i, &now)| now && (i == 0 || !condition[i - 1]))
        .collect()
}

/// Evaluate `test` where both series are defined; undefined counts as false.
fn compare(a: &Series, b: &Series, test: fn(f64, f64) -> bool) -> Vec<bool> {
    a.iter()
        .zip(b)
        .map(|(x, y)| matches!((x, y), (Some(x), Some(y)) if test(*x, *y)))
        .collect()
}

fn combine(buy: &[bool], sell: &[bool]) -> Vec<Signal> {
    buy.iter()
        .zip(sell)
        .map(|(&b, &s)| Signal::from_conditions(b, s))
        .collect()
}

fn moving_average_cross(close: &[f64]) -> Vec<Signal> {
    let fast = sma(close, MA_FAST);
    let slow = sma(close, MA_SLOW);
    let bullish = compare(&fast, &slow, |f, s| f > s);
    let bearish = compare(&fast, &slow, |f, s| f < s);
    combine(&rising_edge(&bullish), &rising_edge(&bearish))
}

fn rsi_mean_reversion(close: &[f64]) -> Vec<Signal> {
    let values = rsi(close, RSI_PERIOD);
    let mut signals = vec![Signal::Hold; close.len()];
    for i in 1..close.len() {
        if let (Some(prev), Some(now)) = (values[i - 1], values[i]) {
            let up = prev <= RSI_OVERSOLD && now > RSI_OVERSOLD;
            let down = prev >= RSI_OVERBOUGHT && now < RSI_OVERBOUGHT;
            signals[i] = Signal::from_conditions(up, down);
        }
    }
    signals
}

fn bollinger_reentry(close: &[f64]) -> Vec<Signal> {
    let bands = bollinger(close, BOLLINGER_PERIOD, BOLLINGER_MULT);
    let mut signals = vec![Signal::Hold; close.len()];
    for i in 1..close.len() {
        let up = match (bands.lower[i - 1], bands.lower[i]) {
            (Some(prev), Some(now)) => close[i - 1] <= prev && close[i] > now,
            _ => false,
        };
        let down = match (bands.upper[i - 1], bands.upper[i]) {
            (Some(prev), Some(now)) => close[i - 1] >= prev && close[i] < now,
            _ => false,
        };
        signals[i] = Signal::from_conditions(up, down);
    }
    signals
}

fn momentum(close: &[f64]) -> Vec<Signal> {
    rate_of_change(close, MOMENTUM_PERIOD)
        .into_iter()
        .map(|change| match change {
            Some(c) => Signal::from_conditions(c > MOMENTUM_THRESHOLD, c < -MOMENTUM_THRESHOLD),
            None => Signal::Hold,
        })
        .collect()
}

fn mean_reversion(close: &[f64]) -> Vec<Signal> {
    zscore(close, ZSCORE_PERIOD)
        .into_iter()
        .map(|z| match z {
            Some(z) => Signal::from_conditions(z < -ZSCORE_THRESHOLD, z > ZSCORE_THRESHOLD),
            None => Signal::Hold,
        })
        .collect()
}

fn breakout(bars: &[OhlcvBar], close: &[f64]) -> Vec<Signal> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let close_series: Series = close.iter().copied().map(Some).collect();

    let above = compare(&close_series, &prior_rolling_max(&highs, BREAKOUT_PERIOD), |c, h| c > h);
    let below = compare(&close_series, &prior_rolling_min(&lows, BREAKOUT_PERIOD), |c, l| c < l);
    combine(&rising_edge(&above), &rising_edge(&below))
}

fn scalping(close: &[f64]) -> Vec<Signal> {
    let fast = ema(close, SCALP_FAST);
    let slow = ema(close, SCALP_SLOW);
    fast.iter()
        .zip(&slow)
        .map(|pair| match pair {
            (Some(f), Some(s)) if f > s => Signal::Buy,
            (Some(_), Some(_)) => Signal::Sell,
            _ => Signal::Hold,
        })
        .collect()
}
