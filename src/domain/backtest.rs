//! Backtest simulator.
//!
//! Replays a signal history against realized returns. The position decided on
//! one row is held over the following period, so a signal never earns the
//! return of its own row.

use chrono::NaiveDate;

use crate::domain::error::TrendError;
use crate::domain::metrics::{
    trade_count, win_rate, PerformanceSummary, TimeInState, TRADING_DAYS_PER_YEAR,
};
use crate::domain::price::TimeSeries;
use crate::domain::signal::{Position, Signal};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Scale each period's exposure by the previous signal's allocation.
    pub size_by_allocation: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            size_by_allocation: false,
        }
    }
}

/// Price streams whose returns back each position.
///
/// `primary` is the long instrument; `inverse` is the instrument held while
/// SHORT, if any.
#[derive(Debug, Clone)]
pub struct ReturnStreams {
    pub primary: TimeSeries,
    pub inverse: Option<TimeSeries>,
}

impl ReturnStreams {
    pub fn long_only(primary: TimeSeries) -> Self {
        ReturnStreams {
            primary,
            inverse: None,
        }
    }

    fn inverse_return(&self, from: NaiveDate, to: NaiveDate) -> f64 {
        let Some(inverse) = &self.inverse else {
            return 0.0;
        };
        match (inverse.close_on(from), inverse.close_on(to)) {
            (Some(prev), Some(curr)) => curr / prev - 1.0,
            _ => 0.0,
        }
    }
}

/// One simulated period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodRecord {
    pub date: NaiveDate,
    /// Position carried into this period from the previous signal.
    pub held: Position,
    pub strategy_return: f64,
    pub benchmark_return: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub periods: usize,
    pub years: f64,
    pub initial_capital: f64,
    pub strategy: PerformanceSummary,
    pub benchmark: PerformanceSummary,
    pub win_rate: f64,
    pub trade_count: usize,
    pub time_in_state: TimeInState,
    pub strategy_curve: Vec<EquityPoint>,
    pub benchmark_curve: Vec<EquityPoint>,
    pub records: Vec<PeriodRecord>,
}

impl SimulationResult {
    pub fn outperformance(&self) -> f64 {
        self.strategy.total_return - self.benchmark.total_return
    }

    pub fn strategy_returns(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.strategy_return).collect()
    }
}

fn compound(
    initial_capital: f64,
    records: &[PeriodRecord],
    pick: fn(&PeriodRecord) -> f64,
) -> Vec<EquityPoint> {
    let mut equity = initial_capital;
    records
        .iter()
        .map(|record| {
            equity *= 1.0 + pick(record);
            EquityPoint {
                date: record.date,
                equity,
            }
        })
        .collect()
}

/// Simulate `signals` against `streams`.
///
/// Signals are matched to the primary series by date; dates present in only
/// one of them are skipped. The first matched row only opens the position.
pub fn run_backtest(
    signals: &[Signal],
    streams: &ReturnStreams,
    config: &BacktestConfig,
) -> Result<SimulationResult, TrendError> {
    let aligned: Vec<(&Signal, f64)> = signals
        .iter()
        .filter_map(|s| streams.primary.close_on(s.date).map(|close| (s, close)))
        .collect();

    if aligned.len() < 2 {
        return Err(TrendError::EmptyRange {
            symbol: streams.primary.symbol().to_string(),
        });
    }

    if aligned.len() < signals.len() {
        tracing::warn!(
            signals = signals.len(),
            aligned = aligned.len(),
            "signal dates missing from {}",
            streams.primary.symbol()
        );
    }

    let records: Vec<PeriodRecord> = aligned
        .windows(2)
        .map(|pair| {
            let (prev, prev_close) = pair[0];
            let (curr, curr_close) = pair[1];
            let primary_return = curr_close / prev_close - 1.0;

            let exposure = match prev.position {
                Position::Long => primary_return,
                Position::Short => streams.inverse_return(prev.date, curr.date),
                Position::Cash => 0.0,
            };
            let scale = if config.size_by_allocation {
                prev.allocation
            } else {
                1.0
            };

            PeriodRecord {
                date: curr.date,
                held: prev.position,
                strategy_return: exposure * scale,
                benchmark_return: primary_return,
            }
        })
        .collect();

    let strategy_curve = compound(config.initial_capital, &records, |r| r.strategy_return);
    let benchmark_curve = compound(config.initial_capital, &records, |r| r.benchmark_return);

    let strategy_returns: Vec<f64> = records.iter().map(|r| r.strategy_return).collect();
    let benchmark_returns: Vec<f64> = records.iter().map(|r| r.benchmark_return).collect();
    let held: Vec<Position> = records.iter().map(|r| r.held).collect();
    let positions: Vec<Position> = aligned.iter().map(|(s, _)| s.position).collect();

    let periods = records.len();
    let strategy =
        PerformanceSummary::compute(config.initial_capital, &strategy_returns, &strategy_curve);
    let benchmark =
        PerformanceSummary::compute(config.initial_capital, &benchmark_returns, &benchmark_curve);

    let result = SimulationResult {
        start_date: aligned[1].0.date,
        end_date: aligned[aligned.len() - 1].0.date,
        periods,
        years: periods as f64 / TRADING_DAYS_PER_YEAR,
        initial_capital: config.initial_capital,
        strategy,
        benchmark,
        win_rate: win_rate(&strategy_returns),
        trade_count: trade_count(&positions),
        time_in_state: TimeInState::compute(&held),
        strategy_curve,
        benchmark_curve,
        records,
    };

    tracing::info!(
        symbol = streams.primary.symbol(),
        periods = result.periods,
        trades = result.trade_count,
        final_equity = result.strategy.final_equity,
        "backtest complete"
    );

    Ok(result)
}
