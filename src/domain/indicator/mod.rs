//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values aligned with its price series
//! - `IndicatorFrame`: Rows where every requested indicator is defined

pub mod frame;
pub mod roc;
pub mod sma;
pub mod trend;
pub mod volatility;

use chrono::NaiveDate;
use std::fmt;

use crate::domain::price::TimeSeries;

pub use frame::{build_frame, build_frame_with, FrameRow, IndicatorFrame};

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Roc(usize),
    Volatility(usize),
    /// Relative distance of the close from SMA(n).
    TrendStrength(usize),
}

impl IndicatorType {
    pub fn period(&self) -> usize {
        match self {
            IndicatorType::Sma(n)
            | IndicatorType::Roc(n)
            | IndicatorType::Volatility(n)
            | IndicatorType::TrendStrength(n) => *n,
        }
    }

    /// Index of the first valid point.
    pub fn warmup(&self) -> usize {
        match self {
            IndicatorType::Sma(n) | IndicatorType::TrendStrength(n) => n.saturating_sub(1),
            IndicatorType::Roc(n) | IndicatorType::Volatility(n) => *n,
        }
    }

    /// Minimum series length that yields at least one valid point.
    pub fn required_points(&self) -> usize {
        self.warmup() + 1
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn value_at(&self, i: usize) -> Option<f64> {
        self.values
            .get(i)
            .filter(|p| p.valid)
            .map(|p| p.value)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Roc(period) => write!(f, "ROC({})", period),
            IndicatorType::Volatility(period) => write!(f, "VOLATILITY({})", period),
            IndicatorType::TrendStrength(period) => write!(f, "TREND_STRENGTH({})", period),
        }
    }
}

pub fn calculate(series: &TimeSeries, indicator: IndicatorType) -> IndicatorSeries {
    match indicator {
        IndicatorType::Sma(period) => sma::calculate_sma(series, period),
        IndicatorType::Roc(period) => roc::calculate_roc(series, period),
        IndicatorType::Volatility(period) => volatility::calculate_volatility(series, period),
        IndicatorType::TrendStrength(period) => trend::calculate_trend_strength(series, period),
    }
}
