//! Performance metrics and statistics.

use super::backtest::EquityPoint;
use super::signal::Position;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Return and risk figures for one equity curve.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub final_equity: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    /// Most negative peak-to-trough decline, always <= 0.
    pub max_drawdown: f64,
}

impl PerformanceSummary {
    pub fn compute(initial_capital: f64, returns: &[f64], equity_curve: &[EquityPoint]) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital
        } else {
            0.0
        };

        let periods = returns.len();
        let annualized_return = annualize(total_return, periods);
        let annualized_volatility = sample_stddev(returns) * TRADING_DAYS_PER_YEAR.sqrt();

        // Risk-free rate is taken as zero.
        let sharpe_ratio = if annualized_volatility > 0.0 {
            annualized_return / annualized_volatility
        } else {
            0.0
        };

        PerformanceSummary {
            final_equity,
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown: compute_drawdown(equity_curve),
        }
    }
}

/// Fraction of simulated periods spent in each state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeInState {
    pub long: f64,
    pub short: f64,
    pub cash: f64,
}

impl TimeInState {
    pub fn compute(held: &[Position]) -> Self {
        if held.is_empty() {
            return TimeInState::default();
        }
        let n = held.len() as f64;
        let count = |state: Position| held.iter().filter(|&&p| p == state).count() as f64 / n;
        TimeInState {
            long: count(Position::Long),
            short: count(Position::Short),
            cash: count(Position::Cash),
        }
    }
}

/// (1 + total_return)^(252 / periods) - 1, or 0 with no periods.
pub fn annualize(total_return: f64, periods: usize) -> f64 {
    if periods == 0 || !total_return.is_finite() {
        return 0.0;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(TRADING_DAYS_PER_YEAR / periods as f64) - 1.0
}

/// Sample standard deviation (n - 1 denominator); 0 with fewer than two values.
pub fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// min over t of (equity[t] - running_max[t]) / running_max[t].
pub fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            let dd = (point.equity - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

/// count(r > 0) / count(r != 0); 0 when every period is flat.
pub fn win_rate(returns: &[f64]) -> f64 {
    let active = returns.iter().filter(|&&r| r != 0.0).count();
    if active == 0 {
        return 0.0;
    }
    let winners = returns.iter().filter(|&&r| r > 0.0).count();
    winners as f64 / active as f64
}

/// Number of indices where the position differs from the previous one.
pub fn trade_count(positions: &[Position]) -> usize {
    positions.windows(2).filter(|w| w[0] != w[1]).count()
}
