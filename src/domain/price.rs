//! Closing-price time series for a single instrument.

use chrono::NaiveDate;

use crate::domain::error::TrendError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Ordered closes for one symbol.
///
/// Dates are strictly increasing and every close is finite and positive.
/// The series cannot be mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl TimeSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, TrendError> {
        let symbol = symbol.into();

        for (i, point) in points.iter().enumerate() {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(TrendError::InvalidSeries {
                    symbol,
                    reason: format!("close on {} must be positive, got {}", point.date, point.close),
                });
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(TrendError::InvalidSeries {
                    symbol,
                    reason: format!(
                        "dates must be strictly increasing ({} then {})",
                        points[i - 1].date,
                        point.date
                    ),
                });
            }
        }

        Ok(Self { symbol, points })
    }

    /// Build a series from `(date, close)` pairs in any order.
    pub fn from_unsorted(
        symbol: impl Into<String>,
        mut points: Vec<PricePoint>,
    ) -> Result<Self, TrendError> {
        points.sort_by_key(|p| p.date);
        Self::new(symbol, points)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.close)
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].close)
    }

    /// Simple return between `points[i - 1]` and `points[i]`; `None` for `i == 0`.
    pub fn simple_return(&self, i: usize) -> Option<f64> {
        if i == 0 || i >= self.points.len() {
            return None;
        }
        let prev = self.points[i - 1].close;
        Some(self.points[i].close / prev - 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn point(d: u32, close: f64) -> PricePoint {
        PricePoint { date: day(d), close }
    }

    #[test]
    fn accepts_increasing_positive_series() {
        let series =
            TimeSeries::new("QQQ", vec![point(1, 100.0), point(2, 101.0), point(3, 99.5)]).unwrap();
        assert_eq!(series.symbol(), "QQQ");
        assert_eq!(series.len(), 3);
        assert_eq!(series.first_date(), Some(day(1)));
        assert_eq!(series.last_date(), Some(day(3)));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = TimeSeries::new("QQQ", vec![point(1, 100.0), point(1, 101.0)]).unwrap_err();
        assert!(matches!(err, TrendError::InvalidSeries { .. }));
    }

    #[test]
    fn rejects_decreasing_dates() {
        let err = TimeSeries::new("QQQ", vec![point(2, 100.0), point(1, 101.0)]).unwrap_err();
        assert!(matches!(err, TrendError::InvalidSeries { .. }));
    }

    #[test]
    fn rejects_non_positive_close() {
        let err = TimeSeries::new("QQQ", vec![point(1, 100.0), point(2, 0.0)]).unwrap_err();
        assert!(matches!(err, TrendError::InvalidSeries { .. }));

        let err = TimeSeries::new("QQQ", vec![point(1, f64::NAN)]).unwrap_err();
        assert!(matches!(err, TrendError::InvalidSeries { .. }));
    }

    #[test]
    fn from_unsorted_sorts_by_date() {
        let series =
            TimeSeries::from_unsorted("QQQ", vec![point(3, 3.0), point(1, 1.0), point(2, 2.0)])
                .unwrap();
        let closes: Vec<f64> = series.closes().collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn empty_series_is_valid() {
        let series = TimeSeries::new("QQQ", vec![]).unwrap();
        assert!(series.is_empty());
        assert!(series.last().is_none());
    }

    #[test]
    fn close_on_finds_exact_date() {
        let series = TimeSeries::new("QQQ", vec![point(1, 10.0), point(3, 12.0)]).unwrap();
        assert_eq!(series.close_on(day(3)), Some(12.0));
        assert_eq!(series.close_on(day(2)), None);
    }

    #[test]
    fn simple_return_between_neighbours() {
        let series = TimeSeries::new("QQQ", vec![point(1, 100.0), point(2, 110.0)]).unwrap();
        assert_eq!(series.simple_return(0), None);
        assert!((series.simple_return(1).unwrap() - 0.10).abs() < 1e-12);
        assert_eq!(series.simple_return(2), None);
    }
}
