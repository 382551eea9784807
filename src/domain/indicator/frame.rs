//! Indicator frame: price rows where every requested indicator is defined.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::domain::error::TrendError;
use crate::domain::indicator::{calculate, IndicatorSeries, IndicatorType};
use crate::domain::price::TimeSeries;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameRow {
    pub date: NaiveDate,
    pub close: f64,
    pub values: HashMap<IndicatorType, f64>,
}

impl FrameRow {
    pub fn get(&self, indicator: IndicatorType) -> Option<f64> {
        self.values.get(&indicator).copied()
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub symbol: String,
    pub rows: Vec<FrameRow>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Compute `indicators` over `series` and keep only the rows where all of them
/// are valid.
pub fn build_frame(
    series: &TimeSeries,
    indicators: &[IndicatorType],
) -> Result<IndicatorFrame, TrendError> {
    build_frame_with(series, indicators, &[])
}

/// Like [`build_frame`], plus `optional` indicators that are attached to a row
/// where valid but never narrow the frame or raise its required length.
pub fn build_frame_with(
    series: &TimeSeries,
    indicators: &[IndicatorType],
    optional: &[IndicatorType],
) -> Result<IndicatorFrame, TrendError> {
    if let Some(bad) = indicators.iter().find(|ind| ind.period() == 0) {
        return Err(TrendError::DataInsufficient {
            symbol: series.symbol().to_string(),
            points: series.len(),
            required: bad.required_points().max(1),
        });
    }

    let required = indicators
        .iter()
        .map(IndicatorType::required_points)
        .max()
        .unwrap_or(1);

    if series.is_empty() || series.len() < required {
        return Err(TrendError::DataInsufficient {
            symbol: series.symbol().to_string(),
            points: series.len(),
            required,
        });
    }

    let computed: Vec<IndicatorSeries> = indicators
        .iter()
        .map(|&ind| calculate(series, ind))
        .collect();
    let extras: Vec<IndicatorSeries> = optional
        .iter()
        .filter(|ind| !indicators.contains(*ind))
        .map(|&ind| calculate(series, ind))
        .collect();

    let mut rows = Vec::with_capacity(series.len());
    for (i, point) in series.points().iter().enumerate() {
        let values: Option<HashMap<IndicatorType, f64>> = computed
            .iter()
            .map(|s| s.value_at(i).map(|v| (s.indicator_type, v)))
            .collect();

        if let Some(mut values) = values {
            for extra in &extras {
                if let Some(v) = extra.value_at(i) {
                    values.insert(extra.indicator_type, v);
                }
            }
            rows.push(FrameRow {
                date: point.date,
                close: point.close,
                values,
            });
        }
    }

    tracing::debug!(
        symbol = series.symbol(),
        points = series.len(),
        rows = rows.len(),
        "built indicator frame"
    );

    Ok(IndicatorFrame {
        symbol: series.symbol().to_string(),
        rows,
    })
}
