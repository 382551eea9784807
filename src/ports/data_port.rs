//! Price data port trait.

use crate::domain::error::TrendError;
use crate::domain::price::TimeSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily closes for `symbol` within `[start_date, end_date]`, oldest first.
    fn fetch_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TimeSeries, TrendError>;

    /// Symbols the source can serve.
    fn list_symbols(&self) -> Result<Vec<String>, TrendError>;
}
