//! Report generation port trait.

use crate::domain::backtest::SimulationResult;
use crate::domain::error::TrendError;
use crate::domain::strategy::StrategyConfig;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        result: &SimulationResult,
        strategy: &StrategyConfig,
        output_path: &str,
    ) -> Result<(), TrendError>;
}
