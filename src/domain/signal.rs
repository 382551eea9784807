//! Signal generation from indicator frames.
//!
//! Each frame row is turned into a discrete position, an allocation weight and
//! a regime label. The only state carried between rows is whether the close
//! was above the long moving average, which is what crossover detection needs.

use chrono::NaiveDate;
use std::fmt;

use crate::domain::error::TrendError;
use crate::domain::indicator::{build_frame_with, FrameRow, IndicatorFrame, IndicatorType};
use crate::domain::price::TimeSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Long,
    Short,
    Cash,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Long => write!(f, "LONG"),
            Position::Short => write!(f, "SHORT"),
            Position::Cash => write!(f, "CASH"),
        }
    }
}

/// Qualitative trend label. Used for reporting only, never for positioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regime {
    StrongUptrend,
    Uptrend,
    WeakeningUptrend,
    StrongDowntrend,
    Downtrend,
    WeakeningDowntrend,
    Transition,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Regime::StrongUptrend => "STRONG_UPTREND",
            Regime::Uptrend => "UPTREND",
            Regime::WeakeningUptrend => "WEAKENING_UPTREND",
            Regime::StrongDowntrend => "STRONG_DOWNTREND",
            Regime::Downtrend => "DOWNTREND",
            Regime::WeakeningDowntrend => "WEAKENING_DOWNTREND",
            Regime::Transition => "TRANSITION",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalPolicy {
    /// LONG above the moving average, CASH otherwise.
    SingleMa,
    /// Long and short moving averages confirmed by rate-of-change momentum,
    /// with volatility-scaled allocation.
    DualMaMomentum,
}

impl SignalPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "single_ma" | "single" => Some(SignalPolicy::SingleMa),
            "dual_ma_momentum" | "dual" => Some(SignalPolicy::DualMaMomentum),
            _ => None,
        }
    }
}

impl fmt::Display for SignalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalPolicy::SingleMa => write!(f, "single_ma"),
            SignalPolicy::DualMaMomentum => write!(f, "dual_ma_momentum"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
    pub policy: SignalPolicy,
    /// Long (primary) moving average window.
    pub ma_period: usize,
    pub ma_short_period: usize,
    pub roc_period: usize,
    /// Momentum needed to enter, as a fraction (0.02 = 2%).
    pub roc_threshold: f64,
    pub volatility_window: usize,
    pub volatility_moderate: f64,
    pub volatility_high: f64,
    /// Momentum separating STRONG regimes from plain ones.
    pub strong_trend_roc: f64,
    /// When false, a SHORT condition yields CASH.
    pub allow_shorting: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            policy: SignalPolicy::SingleMa,
            ma_period: 250,
            ma_short_period: 50,
            roc_period: 20,
            roc_threshold: 0.02,
            volatility_window: 20,
            volatility_moderate: 0.35,
            volatility_high: 0.50,
            strong_trend_roc: 0.05,
            allow_shorting: false,
        }
    }
}

impl PolicyConfig {
    pub fn single_ma(ma_period: usize) -> Self {
        PolicyConfig {
            policy: SignalPolicy::SingleMa,
            ma_period,
            ..PolicyConfig::default()
        }
    }

    pub fn dual_ma_momentum(ma_period: usize, ma_short_period: usize) -> Self {
        PolicyConfig {
            policy: SignalPolicy::DualMaMomentum,
            ma_period,
            ma_short_period,
            ..PolicyConfig::default()
        }
    }

    /// Indicators that must be defined for a row to produce a signal.
    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        match self.policy {
            SignalPolicy::SingleMa => vec![
                IndicatorType::Sma(self.ma_period),
                IndicatorType::TrendStrength(self.ma_period),
            ],
            SignalPolicy::DualMaMomentum => vec![
                IndicatorType::Sma(self.ma_period),
                IndicatorType::Sma(self.ma_short_period),
                IndicatorType::Roc(self.roc_period),
                IndicatorType::Volatility(self.volatility_window),
                IndicatorType::TrendStrength(self.ma_period),
            ],
        }
    }

    /// Indicators used only for labelling; attached where defined.
    pub fn optional_indicators(&self) -> Vec<IndicatorType> {
        match self.policy {
            SignalPolicy::SingleMa => vec![IndicatorType::Roc(self.roc_period)],
            SignalPolicy::DualMaMomentum => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub date: NaiveDate,
    pub close: f64,
    pub position: Position,
    /// Fraction of portfolio value to deploy, in [0, 1].
    pub allocation: f64,
    pub regime: Regime,
    pub crossed_up: bool,
    pub crossed_down: bool,
    pub long_ma: f64,
    pub short_ma: Option<f64>,
    pub roc: f64,
    pub volatility: Option<f64>,
    pub trend_strength: f64,
}

impl Signal {
    pub fn above_long_ma(&self) -> bool {
        self.close > self.long_ma
    }
}

/// Regime from the moving-average relationship and momentum.
pub fn classify_regime(above_long: bool, above_short: bool, roc: f64, strong: f64) -> Regime {
    if above_long && above_short {
        if roc > strong {
            Regime::StrongUptrend
        } else if roc > 0.0 {
            Regime::Uptrend
        } else {
            Regime::WeakeningUptrend
        }
    } else if !above_long && !above_short {
        if roc < -strong {
            Regime::StrongDowntrend
        } else if roc < 0.0 {
            Regime::Downtrend
        } else {
            Regime::WeakeningDowntrend
        }
    } else {
        Regime::Transition
    }
}

/// Trend-scaled allocation, reduced in three volatility bands.
pub fn dynamic_allocation(trend_strength: f64, volatility: f64, config: &PolicyConfig) -> f64 {
    let trend_mult = (0.5 + trend_strength.abs() * 2.0).min(1.0);

    let vol_mult = if volatility > config.volatility_high {
        0.5
    } else if volatility > config.volatility_moderate {
        0.75
    } else {
        1.0
    };

    (trend_mult * vol_mult).min(1.0)
}

fn require(row: &FrameRow, indicator: IndicatorType) -> Result<f64, TrendError> {
    row.get(indicator).ok_or_else(|| TrendError::Data {
        reason: format!("{} missing from indicator frame on {}", indicator, row.date),
    })
}

fn evaluate_row(
    row: &FrameRow,
    prev_above_long: Option<bool>,
    config: &PolicyConfig,
) -> Result<Signal, TrendError> {
    let long_ma = require(row, IndicatorType::Sma(config.ma_period))?;
    // Single-MA reads ROC only for the regime label, 0 until its window fills.
    let roc = match config.policy {
        SignalPolicy::SingleMa => row.get(IndicatorType::Roc(config.roc_period)).unwrap_or(0.0),
        SignalPolicy::DualMaMomentum => require(row, IndicatorType::Roc(config.roc_period))?,
    };
    let trend_strength = require(row, IndicatorType::TrendStrength(config.ma_period))?;
    let close = row.close;
    let above_long = close > long_ma;

    let (position, allocation, regime, short_ma, volatility) = match config.policy {
        SignalPolicy::SingleMa => {
            let (position, allocation) = if above_long {
                (Position::Long, 1.0)
            } else {
                (Position::Cash, 0.0)
            };
            let regime = classify_regime(above_long, above_long, roc, config.strong_trend_roc);
            (position, allocation, regime, None, None)
        }
        SignalPolicy::DualMaMomentum => {
            let short_ma = require(row, IndicatorType::Sma(config.ma_short_period))?;
            let volatility = require(row, IndicatorType::Volatility(config.volatility_window))?;
            let above_short = close > short_ma;
            let below_long = close < long_ma;
            let below_short = close < short_ma;

            let position = if above_long && above_short && roc > config.roc_threshold {
                Position::Long
            } else if below_long
                && below_short
                && roc < -config.roc_threshold
                && config.allow_shorting
            {
                Position::Short
            } else {
                Position::Cash
            };

            let allocation = match position {
                Position::Cash => 0.0,
                Position::Long | Position::Short => {
                    dynamic_allocation(trend_strength, volatility, config)
                }
            };
            let regime = classify_regime(above_long, above_short, roc, config.strong_trend_roc);
            (position, allocation, regime, Some(short_ma), Some(volatility))
        }
    };

    let (crossed_up, crossed_down) = match prev_above_long {
        Some(prev) => (above_long && !prev, !above_long && prev),
        None => (false, false),
    };

    Ok(Signal {
        date: row.date,
        close,
        position,
        allocation,
        regime,
        crossed_up,
        crossed_down,
        long_ma,
        short_ma,
        roc,
        volatility,
        trend_strength,
    })
}

/// One signal per frame row. The first row has no predecessor, so its
/// crossover flags are always false. Crossovers track flips of `close > long_ma`,
/// so a close landing exactly on the average after a row above it counts as
/// `crossed_down`.
pub fn generate_signals(
    frame: &IndicatorFrame,
    config: &PolicyConfig,
) -> Result<Vec<Signal>, TrendError> {
    if frame.len() < 2 {
        return Err(TrendError::InsufficientHistory { rows: frame.len() });
    }

    let mut signals = Vec::with_capacity(frame.len());
    let mut prev_above_long = None;

    for row in &frame.rows {
        let signal = evaluate_row(row, prev_above_long, config)?;
        prev_above_long = Some(signal.above_long_ma());
        signals.push(signal);
    }

    Ok(signals)
}

pub fn compute_signal_history(
    series: &TimeSeries,
    config: &PolicyConfig,
) -> Result<Vec<Signal>, TrendError> {
    let frame = build_frame_with(
        series,
        &config.required_indicators(),
        &config.optional_indicators(),
    )?;
    generate_signals(&frame, config)
}

/// Signal for the latest point of `series`.
pub fn compute_signal(series: &TimeSeries, config: &PolicyConfig) -> Result<Signal, TrendError> {
    let mut history = compute_signal_history(series, config)?;
    history
        .pop()
        .ok_or(TrendError::InsufficientHistory { rows: 0 })
}
