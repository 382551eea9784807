//! Trend strength: signed relative distance of the close from its SMA.
//!
//! TS(n)[i] = (C[i] - SMA(n)[i]) / SMA(n)[i]
//! Valid wherever SMA(n) is valid.

use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price::TimeSeries;

pub fn calculate_trend_strength(series: &TimeSeries, period: usize) -> IndicatorSeries {
    let sma = calculate_sma(series, period);

    let values = series
        .points()
        .iter()
        .zip(sma.values.iter())
        .map(|(point, ma)| {
            let value = if ma.valid && ma.value != 0.0 {
                (point.close - ma.value) / ma.value
            } else {
                0.0
            };
            IndicatorPoint {
                date: point.date,
                valid: ma.valid,
                value,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::TrendStrength(period),
        values,
    }
}
