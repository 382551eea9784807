//! Simple moving average.
//!
//! SMA(n)[i] = sum(C[i-n+1..=i]) / n
//! Warmup: first (n-1) points invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price::TimeSeries;

pub fn calculate_sma(series: &TimeSeries, period: usize) -> IndicatorSeries {
    let points = series.points();
    let mut values = Vec::with_capacity(points.len());

    for (i, point) in points.iter().enumerate() {
        let valid = period > 0 && i + 1 >= period;

        let value = if valid {
            let window = &points[i + 1 - period..=i];
            window.iter().map(|p| p.close).sum::<f64>() / period as f64
        } else {
            0.0
        };

        values.push(IndicatorPoint {
            date: point.date,
            valid,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
