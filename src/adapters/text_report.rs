//! Plain-text reports for the terminal and for report files.
//!
//! Presentation only: every figure comes from the domain types unchanged,
//! scaled to percent where labelled.

use std::fmt::Write as _;
use std::fs;

use crate::domain::backtest::SimulationResult;
use crate::domain::error::TrendError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::reconcile::{OrderIntent, PositionSize};
use crate::domain::signal::Signal;
use crate::domain::strategy::StrategyConfig;
use crate::ports::report_port::ReportPort;

const RULE_WIDTH: usize = 60;

/// Writes [`render_backtest`] output to a file.
pub struct TextReportAdapter;

impl ReportPort for TextReportAdapter {
    fn write(
        &self,
        result: &SimulationResult,
        strategy: &StrategyConfig,
        output_path: &str,
    ) -> Result<(), TrendError> {
        fs::write(output_path, render_backtest(result, strategy))?;
        tracing::info!(path = output_path, "report written");
        Ok(())
    }
}

/// `1234567.891` → `1,234,567.89`
pub fn format_money(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", title);
    let _ = writeln!(out, "{}", "-".repeat(40));
}

fn summary_lines(out: &mut String, summary: &PerformanceSummary) {
    let _ = writeln!(out, "  Final Value:       {:>18}", format_money(summary.final_equity));
    let _ = writeln!(out, "  Total Return:      {:>18}", pct(summary.total_return));
    let _ = writeln!(out, "  Annual Return:     {:>18}", pct(summary.annualized_return));
    let _ = writeln!(out, "  Annual Volatility: {:>18}", pct(summary.annualized_volatility));
    let _ = writeln!(out, "  Sharpe Ratio:      {:>18.2}", summary.sharpe_ratio);
    let _ = writeln!(out, "  Max Drawdown:      {:>18}", pct(summary.max_drawdown));
}

pub fn render_backtest(result: &SimulationResult, strategy: &StrategyConfig) -> String {
    let mut out = String::new();

    heading(&mut out, &format!("BACKTEST RESULTS - {}", strategy.name));
    let _ = writeln!(out, "{}", strategy.describe());
    let _ = writeln!(
        out,
        "Period: {} to {} ({:.1} years, {} periods)",
        result.start_date, result.end_date, result.years, result.periods
    );
    let _ = writeln!(out, "Initial Capital: {}", format_money(result.initial_capital));

    section(&mut out, "STRATEGY PERFORMANCE");
    summary_lines(&mut out, &result.strategy);
    let _ = writeln!(out, "  Win Rate:          {:>18}", pct(result.win_rate));
    let _ = writeln!(out, "  Total Trades:      {:>18}", result.trade_count);

    section(&mut out, &format!("BUY & HOLD {}", strategy.instruments.long));
    summary_lines(&mut out, &result.benchmark);

    section(&mut out, "TIME ALLOCATION");
    let t = &result.time_in_state;
    let _ = writeln!(out, "  Long:  {:>8}", pct(t.long));
    let _ = writeln!(out, "  Short: {:>8}", pct(t.short));
    let _ = writeln!(out, "  Cash:  {:>8}", pct(t.cash));

    section(&mut out, "STRATEGY vs BUY & HOLD");
    let outperformance = result.outperformance();
    if outperformance > 0.0 {
        let _ = writeln!(out, "  Strategy outperformed by {}", pct(outperformance));
    } else {
        let _ = writeln!(out, "  Strategy underperformed by {}", pct(outperformance.abs()));
    }
    let dd_change = result.strategy.max_drawdown - result.benchmark.max_drawdown;
    if dd_change >= 0.0 {
        let _ = writeln!(out, "  Drawdown reduced by {}", pct(dd_change));
    } else {
        let _ = writeln!(out, "  Drawdown increased by {}", pct(dd_change.abs()));
    }
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));

    out
}

/// Side-by-side figures for the long-only and long-short runs of one strategy.
pub fn render_comparison(
    long_only: &SimulationResult,
    long_short: &SimulationResult,
    strategy: &StrategyConfig,
) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("LONG-ONLY vs LONG-SHORT - {}", strategy.name));

    let _ = writeln!(out, "{:<20}{:>18}{:>18}", "", "Long only", "Long/short");
    let rows: [(&str, fn(&SimulationResult) -> String); 7] = [
        ("Final Value", |r| format_money(r.strategy.final_equity)),
        ("Total Return", |r| pct(r.strategy.total_return)),
        ("Annual Return", |r| pct(r.strategy.annualized_return)),
        ("Sharpe Ratio", |r| format!("{:.2}", r.strategy.sharpe_ratio)),
        ("Max Drawdown", |r| pct(r.strategy.max_drawdown)),
        ("Total Trades", |r| r.trade_count.to_string()),
        ("Time Short", |r| pct(r.time_in_state.short)),
    ];
    for (label, value) in rows {
        let _ = writeln!(
            out,
            "{:<20}{:>18}{:>18}",
            label,
            value(long_only),
            value(long_short)
        );
    }
    let _ = writeln!(
        out,
        "{:<20}{:>18}",
        "Buy & Hold Return",
        pct(long_only.benchmark.total_return)
    );
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    out
}

pub fn render_signal(
    signal: &Signal,
    strategy: &StrategyConfig,
    size: Option<&PositionSize>,
) -> String {
    let mut out = String::new();
    let policy = &strategy.policy;

    heading(&mut out, &format!("DAILY SIGNAL - {}", strategy.name));
    let _ = writeln!(out, "Date: {}", signal.date);
    let _ = writeln!(out, "{}: {:.2}", strategy.instruments.index, signal.close);
    let _ = writeln!(out, "{}-day SMA: {:.2}", policy.ma_period, signal.long_ma);
    if let Some(short_ma) = signal.short_ma {
        let _ = writeln!(out, "{}-day SMA: {:.2}", policy.ma_short_period, short_ma);
    }
    let _ = writeln!(out, "Distance from MA: {}", pct(signal.trend_strength));
    let _ = writeln!(out, "ROC({}): {}", policy.roc_period, pct(signal.roc));
    if let Some(vol) = signal.volatility {
        let _ = writeln!(out, "Volatility({}): {}", policy.volatility_window, pct(vol));
    }
    let _ = writeln!(out, "Regime: {}", signal.regime);

    let status = if signal.above_long_ma() { "ABOVE" } else { "BELOW" };
    let _ = writeln!(out, "Price is {} the {}-day MA", status, policy.ma_period);
    if signal.crossed_up {
        let _ = writeln!(out, "CROSSOVER: price crossed ABOVE the MA");
    } else if signal.crossed_down {
        let _ = writeln!(out, "CROSSOVER: price crossed BELOW the MA");
    }

    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    let _ = writeln!(out, "POSITION:   {}", signal.position);
    let _ = writeln!(out, "ALLOCATION: {:.0}%", signal.allocation * 100.0);

    if let Some(size) = size {
        match &size.instrument {
            Some(symbol) => {
                let _ = writeln!(
                    out,
                    "TARGET:     {} shares of {} ({})",
                    size.shares,
                    symbol,
                    format_money(size.position_value)
                );
            }
            None => {
                let _ = writeln!(out, "TARGET:     hold cash");
            }
        }
    }
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    out
}

pub fn render_intents(intents: &[OrderIntent], executed: bool) -> String {
    let mut out = String::new();
    if intents.is_empty() {
        let _ = writeln!(out, "Already at target position");
        return out;
    }
    let verb = if executed { "Executed" } else { "Planned" };
    for intent in intents {
        let _ = writeln!(out, "{}: {}", verb, intent);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{run_backtest, BacktestConfig, ReturnStreams};
    use crate::domain::price::{PricePoint, TimeSeries};
    use crate::domain::reconcile::Instruments;
    use crate::domain::signal::{PolicyConfig, Position, Regime};
    use chrono::NaiveDate;

    fn strategy() -> StrategyConfig {
        StrategyConfig {
            name: "NDX Trend".into(),
            policy: PolicyConfig::single_ma(250),
            instruments: Instruments {
                index: "^NDX".into(),
                long: "TQQQ".into(),
                short: None,
            },
        }
    }

    fn signal(i: usize, position: Position) -> Signal {
        Signal {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
            close: 110.0,
            position,
            allocation: if position == Position::Cash { 0.0 } else { 1.0 },
            regime: Regime::StrongUptrend,
            crossed_up: i == 1,
            crossed_down: false,
            long_ma: 100.0,
            short_ma: None,
            roc: 0.06,
            volatility: None,
            trend_strength: 0.1,
        }
    }

    fn result() -> SimulationResult {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = [100.0, 105.0, 95.0, 110.0]
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                close,
            })
            .collect();
        let streams = ReturnStreams::long_only(TimeSeries::new("TQQQ", points).unwrap());
        let signals: Vec<Signal> = [Position::Cash, Position::Long, Position::Cash, Position::Long]
            .iter()
            .enumerate()
            .map(|(i, &p)| signal(i, p))
            .collect();
        run_backtest(&signals, &streams, &BacktestConfig::default()).unwrap()
    }

    #[test]
    fn money_formatting() {
        assert_eq!(format_money(0.0), "0.00");
        assert_eq!(format_money(999.5), "999.50");
        assert_eq!(format_money(1_000.0), "1,000.00");
        assert_eq!(format_money(1_234_567.891), "1,234,567.89");
        assert_eq!(format_money(-12_345.0), "-12,345.00");
    }

    #[test]
    fn backtest_report_sections() {
        let text = render_backtest(&result(), &strategy());

        assert!(text.contains("BACKTEST RESULTS - NDX Trend"));
        assert!(text.contains("STRATEGY PERFORMANCE"));
        assert!(text.contains("BUY & HOLD TQQQ"));
        assert!(text.contains("TIME ALLOCATION"));
        assert!(text.contains("Total Trades:"));
        assert!(text.contains("Initial Capital: 100,000.00"));
    }

    #[test]
    fn backtest_report_written_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.txt");

        TextReportAdapter
            .write(&result(), &strategy(), path.to_str().unwrap())
            .unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("STRATEGY vs BUY & HOLD"));
    }

    #[test]
    fn signal_report_shows_regime_and_crossover() {
        let size = PositionSize {
            instrument: Some("TQQQ".into()),
            position_value: 100_000.0,
            shares: 2000,
        };
        let text = render_signal(&signal(1, Position::Long), &strategy(), Some(&size));

        assert!(text.contains("Regime: STRONG_UPTREND"));
        assert!(text.contains("crossed ABOVE"));
        assert!(text.contains("POSITION:   LONG"));
        assert!(text.contains("ALLOCATION: 100%"));
        assert!(text.contains("2000 shares of TQQQ (100,000.00)"));
    }

    #[test]
    fn comparison_has_both_columns() {
        let r = result();
        let text = render_comparison(&r, &r, &strategy());
        assert!(text.contains("Long only"));
        assert!(text.contains("Long/short"));
        assert!(text.contains("Time Short"));
    }

    #[test]
    fn intents_listing() {
        assert_eq!(render_intents(&[], false), "Already at target position\n");
        let text = render_intents(&[OrderIntent::sell("SQQQ", 5), OrderIntent::buy("TQQQ", 9)], true);
        assert_eq!(text, "Executed: SELL 5 SQQQ\nExecuted: BUY 9 TQQQ\n");
    }
}
