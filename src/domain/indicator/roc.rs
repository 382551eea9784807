//! ROC (Rate of Change) indicator implementation.
//!
//! ROC(n)[i] = (C[i] - C[i-n]) / C[i-n]
//! Expressed as a fraction: 0.02 means a 2% change.
//! Warmup: first n points invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price::TimeSeries;

pub fn calculate_roc(series: &TimeSeries, period: usize) -> IndicatorSeries {
    let points = series.points();
    let mut values = Vec::with_capacity(points.len());

    for i in 0..points.len() {
        let date = points[i].date;
        let valid = period > 0 && i >= period;

        let value = if valid {
            let prev_close = points[i - period].close;
            (points[i].close - prev_close) / prev_close
        } else {
            0.0
        };

        values.push(IndicatorPoint { date, valid, value });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Roc(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;
    use chrono::NaiveDate;

    fn make_series(prices: &[f64]) -> TimeSeries {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                close,
            })
            .collect();
        TimeSeries::new("TEST", points).unwrap()
    }

    #[test]
    fn roc_warmup() {
        let series = calculate_roc(&make_series(&[100.0, 105.0, 110.0, 115.0, 120.0]), 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(!series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn roc_basic_calculation() {
        let series = calculate_roc(&make_series(&[100.0, 105.0, 110.0, 115.0]), 2);

        let expected = (110.0 - 100.0) / 100.0;
        assert!((series.values[2].value - expected).abs() < f64::EPSILON);

        let expected = (115.0 - 105.0) / 105.0;
        assert!((series.values[3].value - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn roc_negative_change() {
        let series = calculate_roc(&make_series(&[100.0, 90.0, 80.0]), 2);

        assert!(series.values[2].valid);
        assert!((series.values[2].value - (-0.2)).abs() < 1e-12);
    }

    #[test]
    fn roc_zero_period_never_valid() {
        let series = calculate_roc(&make_series(&[100.0, 90.0]), 0);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn roc_indicator_type() {
        let series = calculate_roc(&make_series(&[100.0, 105.0]), 10);
        assert_eq!(series.indicator_type, IndicatorType::Roc(10));
    }
}
