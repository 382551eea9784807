//! CSV file price adapter.
//!
//! One file per symbol, `<base>/<SYMBOL>.csv`, with a leading `^` dropped from
//! index symbols. Columns are located by header name so both plain
//! `date,close` files and Yahoo-style exports load.

use crate::domain::error::TrendError;
use crate::domain::price::{PricePoint, TimeSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.csv", symbol.trim_start_matches('^')))
    }
}

fn column_index(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate, TrendError> {
    let raw = raw.trim();
    // Timestamped exports carry a time suffix after the date.
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| TrendError::Data {
        reason: format!("invalid date {:?}: {}", raw, e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TimeSeries, TrendError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TrendError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| TrendError::Data {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();

        let date_col = column_index(&headers, &["date", "timestamp"]).ok_or_else(|| {
            TrendError::Data {
                reason: format!("{}: missing date column", path.display()),
            }
        })?;
        let close_col = column_index(&headers, &["close", "adj close", "adj_close"])
            .ok_or_else(|| TrendError::Data {
                reason: format!("{}: missing close column", path.display()),
            })?;

        let mut points = Vec::new();
        let mut skipped = 0usize;

        for result in rdr.records() {
            let record = result.map_err(|e| TrendError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date = parse_date(record.get(date_col).unwrap_or_default())?;
            if date < start_date || date > end_date {
                continue;
            }

            // Exports mark holidays and gaps with empty or "null" closes.
            let raw_close = record.get(close_col).unwrap_or_default().trim();
            let close = match raw_close.parse::<f64>() {
                Ok(v) => v,
                Err(_) if raw_close.is_empty() || raw_close.eq_ignore_ascii_case("null") => {
                    skipped += 1;
                    continue;
                }
                Err(e) => {
                    return Err(TrendError::Data {
                        reason: format!("invalid close value {:?} on {}: {}", raw_close, date, e),
                    });
                }
            };

            points.push(PricePoint { date, close });
        }

        if skipped > 0 {
            tracing::warn!(symbol, skipped, "skipped rows without a close");
        }

        if points.is_empty() {
            return Err(TrendError::DataInsufficient {
                symbol: symbol.to_string(),
                points: 0,
                required: 1,
            });
        }

        tracing::debug!(symbol, points = points.len(), path = %path.display(), "loaded prices");
        TimeSeries::from_unsorted(symbol, points)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TrendError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| TrendError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
