//! Equity curve export.

use std::path::Path;

use crate::domain::backtest::SimulationResult;
use crate::domain::error::TrendError;

/// Write `date,position,strategy_return,strategy_equity,benchmark_equity`, one
/// row per simulated period.
pub fn write_equity_csv(result: &SimulationResult, path: &Path) -> Result<(), TrendError> {
    let data_err = |e: csv::Error| TrendError::Data {
        reason: format!("failed to write {}: {}", path.display(), e),
    };
    let mut wtr = csv::Writer::from_path(path).map_err(data_err)?;

    wtr.write_record([
        "date",
        "position",
        "strategy_return",
        "strategy_equity",
        "benchmark_equity",
    ])
    .map_err(data_err)?;

    let rows = result
        .records
        .iter()
        .zip(&result.strategy_curve)
        .zip(&result.benchmark_curve);

    for ((record, strategy), benchmark) in rows {
        wtr.write_record([
            record.date.format("%Y-%m-%d").to_string().as_str(),
            record.held.to_string().as_str(),
            format!("{:.6}", record.strategy_return).as_str(),
            format!("{:.2}", strategy.equity).as_str(),
            format!("{:.2}", benchmark.equity).as_str(),
        ])
        .map_err(data_err)?;
    }

    wtr.flush()?;
    tracing::info!(path = %path.display(), rows = result.records.len(), "equity curve written");
    Ok(())
}
