#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use trendtrader::domain::error::TrendError;
pub use trendtrader::domain::price::{PricePoint, TimeSeries};
use trendtrader::domain::reconcile::Instruments;
use trendtrader::domain::signal::PolicyConfig;
use trendtrader::domain::strategy::StrategyConfig;
use trendtrader::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, series: &TimeSeries) -> Self {
        self.data
            .insert(series.symbol().to_string(), series.points().to_vec());
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TimeSeries, TrendError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TrendError::Data {
                reason: reason.clone(),
            });
        }
        let points: Vec<PricePoint> = self
            .data
            .get(symbol)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();

        if points.is_empty() {
            return Err(TrendError::DataInsufficient {
                symbol: symbol.to_string(),
                points: 0,
                required: 1,
            });
        }
        TimeSeries::new(symbol, points)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Day `i` of the test calendar. Every calendar day is a trading day here.
pub fn day(i: usize) -> NaiveDate {
    date(2020, 1, 1) + chrono::Duration::days(i as i64)
}

pub fn make_series(symbol: &str, closes: &[f64]) -> TimeSeries {
    let points = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: day(i),
            close,
        })
        .collect();
    TimeSeries::new(symbol, points).unwrap()
}

/// Flat at `level` for `flat` days, then compounding by `daily` for `rising`
/// more days.
pub fn flat_then_rising(level: f64, flat: usize, rising: usize, daily: f64) -> Vec<f64> {
    let mut closes = vec![level; flat];
    let mut price = level;
    for _ in 0..rising {
        price *= 1.0 + daily;
        closes.push(price);
    }
    closes
}

/// A daily-rebalanced fund returning `leverage` times the index each day.
pub fn leveraged(index: &[f64], leverage: f64, start: f64) -> Vec<f64> {
    let mut closes = Vec::with_capacity(index.len());
    let mut price = start;
    for (i, &close) in index.iter().enumerate() {
        if i > 0 {
            let index_return = close / index[i - 1] - 1.0;
            price *= (1.0 + leverage * index_return).max(0.01);
        }
        closes.push(price);
    }
    closes
}

pub fn instruments() -> Instruments {
    Instruments {
        index: "^NDX".into(),
        long: "TQQQ".into(),
        short: Some("SQQQ".into()),
    }
}

pub fn make_strategy(policy: PolicyConfig) -> StrategyConfig {
    StrategyConfig {
        name: "Test Trend".into(),
        policy,
        instruments: instruments(),
    }
}
