//! Rolling annualized volatility of daily returns.
//!
//! R[i] = C[i] / C[i-1] - 1
//! VOL(n)[i] = sample_stddev(R[i-n+1..=i]) * sqrt(252)
//! Warmup: first n points invalid (R[0] does not exist).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::metrics::{sample_stddev, TRADING_DAYS_PER_YEAR};
use crate::domain::price::TimeSeries;

pub fn calculate_volatility(series: &TimeSeries, period: usize) -> IndicatorSeries {
    let points = series.points();
    let mut values = Vec::with_capacity(points.len());
    let annualization = TRADING_DAYS_PER_YEAR.sqrt();

    let returns: Vec<f64> = (0..points.len())
        .map(|i| series.simple_return(i).unwrap_or(0.0))
        .collect();

    for (i, point) in points.iter().enumerate() {
        // A sample deviation needs at least two observations.
        let valid = period >= 2 && i >= period;

        let value = if valid {
            let window = &returns[i + 1 - period..=i];
            sample_stddev(window) * annualization
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
        indicator_type: IndicatorType::Volatility(period),
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
    fn volatility_warmup() {
        let series = calculate_volatility(&make_series(&[10.0, 11.0, 12.0, 11.0, 13.0]), 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(!series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn volatility_constant_prices_is_zero() {
        let series = calculate_volatility(&make_series(&[100.0; 6]), 3);

        for point in series.values.iter().filter(|p| p.valid) {
            assert!((point.value - 0.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn volatility_known_values() {
        // Returns: +10%, -10%, +10%
        let series = calculate_volatility(&make_series(&[100.0, 110.0, 99.0, 108.9]), 3);

        let returns = [0.1_f64, -0.1, 0.1];
        let mean = returns.iter().sum::<f64>() / 3.0;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 2.0;
        let expected = variance.sqrt() * 252.0_f64.sqrt();

        assert!(series.values[3].valid);
        assert!((series.values[3].value - expected).abs() < 1e-9);
    }

    #[test]
    fn volatility_period_one_never_valid() {
        let series = calculate_volatility(&make_series(&[100.0, 110.0, 120.0]), 1);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn volatility_indicator_type() {
        let series = calculate_volatility(&make_series(&[10.0, 20.0, 30.0]), 5);
        assert_eq!(series.indicator_type, IndicatorType::Volatility(5));
    }
}
