//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::equity_csv::write_equity_csv;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_venue::PaperVenue;
use crate::adapters::text_report::{
    render_backtest, render_comparison, render_intents, render_signal, TextReportAdapter,
};
use crate::domain::backtest::{run_backtest, BacktestConfig, ReturnStreams, SimulationResult};
use crate::domain::config_validation::{
    parse_date, parse_double, parse_usize, validate_backtest_config, validate_execution_config,
    validate_instruments_config, validate_strategy_config,
};
use crate::domain::error::TrendError;
use crate::domain::execution::submit_intents;
use crate::domain::price::TimeSeries;
use crate::domain::reconcile::{position_size, reconcile, Instruments, ReconcileConfig};
use crate::domain::signal::{compute_signal, compute_signal_history, PolicyConfig, SignalPolicy};
use crate::domain::strategy::StrategyConfig;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use crate::ports::venue_port::ExecutionVenue;

#[derive(Parser, Debug)]
#[command(name = "trendtrader", about = "Trend-following signals, backtests and rebalancing")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the latest signal
    Signal {
        #[arg(short, long)]
        config: PathBuf,
        /// Evaluate as of this date (YYYY-MM-DD) instead of the last close
        #[arg(long)]
        as_of: Option<String>,
        /// Size the position for this portfolio value
        #[arg(long)]
        portfolio_value: Option<f64>,
    },
    /// Run a backtest against buy-and-hold
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Write the text report here as well as to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Export both equity curves as CSV
        #[arg(long)]
        equity_csv: Option<PathBuf>,
    },
    /// Backtest the strategy long-only and long-short side by side
    Compare {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Rebalance the paper account to the latest signal
    Trade {
        #[arg(short, long)]
        config: PathBuf,
        /// Print the orders without submitting them
        #[arg(long)]
        dry_run: bool,
    },
    /// List symbols available in the configured data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Signal {
            config,
            as_of,
            portfolio_value,
        } => run_signal(&config, as_of.as_deref(), portfolio_value),
        Command::Backtest {
            config,
            output,
            equity_csv,
        } => run_backtest_command(&config, output.as_deref(), equity_csv.as_deref()),
        Command::Compare { config } => run_compare(&config),
        Command::Trade { config, dry_run } => run_trade(&config, dry_run),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Validate { config } => run_validate(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TrendError> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn build_policy_config(adapter: &dyn ConfigPort) -> Result<PolicyConfig, TrendError> {
    let defaults = PolicyConfig::default();
    let policy = match adapter.get_string("strategy", "policy") {
        None => defaults.policy,
        Some(s) => SignalPolicy::parse(&s).ok_or_else(|| TrendError::ConfigInvalid {
            section: "strategy".into(),
            key: "policy".into(),
            reason: format!("unknown policy {:?}", s),
        })?,
    };

    Ok(PolicyConfig {
        policy,
        ma_period: parse_usize(adapter, "strategy", "ma_period", defaults.ma_period)?,
        ma_short_period: parse_usize(adapter, "strategy", "ma_short_period", defaults.ma_short_period)?,
        roc_period: parse_usize(adapter, "strategy", "roc_period", defaults.roc_period)?,
        roc_threshold: parse_double(adapter, "strategy", "roc_threshold", defaults.roc_threshold)?,
        volatility_window: parse_usize(
            adapter,
            "strategy",
            "volatility_window",
            defaults.volatility_window,
        )?,
        volatility_moderate: parse_double(
            adapter,
            "strategy",
            "volatility_moderate",
            defaults.volatility_moderate,
        )?,
        volatility_high: parse_double(adapter, "strategy", "volatility_high", defaults.volatility_high)?,
        strong_trend_roc: parse_double(
            adapter,
            "strategy",
            "strong_trend_roc",
            defaults.strong_trend_roc,
        )?,
        allow_shorting: adapter.get_bool("strategy", "allow_shorting", defaults.allow_shorting),
    })
}

pub fn build_instruments(adapter: &dyn ConfigPort) -> Result<Instruments, TrendError> {
    let required = |key: &str| {
        adapter
            .get_string("instruments", key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TrendError::ConfigMissing {
                section: "instruments".into(),
                key: key.into(),
            })
    };

    Ok(Instruments {
        index: required("index")?,
        long: required("long")?,
        short: adapter
            .get_string("instruments", "short")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    })
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<StrategyConfig, TrendError> {
    Ok(StrategyConfig {
        name: adapter
            .get_string("strategy", "name")
            .unwrap_or_else(|| "Unnamed".to_string()),
        policy: build_policy_config(adapter)?,
        instruments: build_instruments(adapter)?,
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, TrendError> {
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        initial_capital: parse_double(
            adapter,
            "backtest",
            "initial_capital",
            defaults.initial_capital,
        )?,
        size_by_allocation: adapter.get_bool(
            "backtest",
            "size_by_allocation",
            defaults.size_by_allocation,
        ),
    })
}

pub fn build_date_range(adapter: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), TrendError> {
    let start = adapter.get_string("backtest", "start_date");
    let end = adapter.get_string("backtest", "end_date");
    Ok((
        parse_date(start.as_deref(), "backtest", "start_date")?,
        parse_date(end.as_deref(), "backtest", "end_date")?,
    ))
}

pub fn build_reconcile_config(adapter: &dyn ConfigPort) -> Result<ReconcileConfig, TrendError> {
    Ok(ReconcileConfig {
        min_rebalance_fraction: parse_double(adapter, "execution", "min_rebalance_fraction", 0.0)?,
    })
}

fn build_data_port(adapter: &dyn ConfigPort) -> Result<CsvAdapter, TrendError> {
    let path = adapter
        .get_string("data", "path")
        .ok_or_else(|| TrendError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(path.trim())))
}

/// Symbols the configured `[data]` source can serve.
pub fn available_symbols(adapter: &dyn ConfigPort) -> Result<Vec<String>, TrendError> {
    build_data_port(adapter)?.list_symbols()
}

/// Load and validate everything the signal pipeline needs.
fn load_strategy(config_path: &Path) -> Result<(FileConfigAdapter, StrategyConfig), TrendError> {
    let adapter = load_config(config_path)?;
    validate_strategy_config(&adapter)?;
    validate_instruments_config(&adapter)?;
    let strategy = build_strategy(&adapter)?;
    tracing::info!(strategy = strategy.name.as_str(), policy = %strategy.policy.policy, "strategy loaded");
    Ok((adapter, strategy))
}

/// Index history up to `end`. Earlier history is kept so indicators are warm
/// by the first date that matters.
fn fetch_index(
    data_port: &dyn DataPort,
    strategy: &StrategyConfig,
    end: NaiveDate,
) -> Result<TimeSeries, TrendError> {
    data_port.fetch_series(&strategy.instruments.index, NaiveDate::MIN, end)
}

/// Signals for the index and a backtest over `[start, end]`.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: &StrategyConfig,
    bt_config: &BacktestConfig,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<SimulationResult, TrendError> {
    let index = fetch_index(data_port, strategy, end)?;
    let mut signals = compute_signal_history(&index, &strategy.policy)?;
    signals.retain(|s| s.date >= start && s.date <= end);
    tracing::info!(
        index = strategy.instruments.index.as_str(),
        signals = signals.len(),
        %start,
        %end,
        "signals computed"
    );

    let primary = data_port.fetch_series(&strategy.instruments.long, start, end)?;
    let inverse = match (&strategy.instruments.short, strategy.policy.allow_shorting) {
        (Some(symbol), true) => Some(data_port.fetch_series(symbol, start, end)?),
        _ => None,
    };

    run_backtest(&signals, &ReturnStreams { primary, inverse }, bt_config)
}

fn run_signal(
    config_path: &Path,
    as_of: Option<&str>,
    portfolio_value: Option<f64>,
) -> Result<(), TrendError> {
    let (adapter, strategy) = load_strategy(config_path)?;
    let data_port = build_data_port(&adapter)?;

    let end = match as_of {
        Some(s) => parse_date(Some(s), "cli", "as_of")?,
        None => NaiveDate::MAX,
    };
    let index = fetch_index(&data_port, &strategy, end)?;
    let signal = compute_signal(&index, &strategy.policy)?;

    let size = match portfolio_value {
        Some(value) => {
            let price = match strategy.instruments.target_for(signal.position) {
                Some(symbol) => latest_close(&data_port, symbol, end),
                None => None,
            };
            Some(position_size(&signal, &strategy.instruments, value, price)?)
        }
        None => None,
    };

    print!("{}", render_signal(&signal, &strategy, size.as_ref()));
    Ok(())
}

fn run_backtest_command(
    config_path: &Path,
    output_path: Option<&Path>,
    equity_csv: Option<&Path>,
) -> Result<(), TrendError> {
    let (adapter, strategy) = load_strategy(config_path)?;
    validate_backtest_config(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;
    let (start, end) = build_date_range(&adapter)?;
    let data_port = build_data_port(&adapter)?;

    let result = run_backtest_pipeline(&data_port, &strategy, &bt_config, start, end)?;
    print!("{}", render_backtest(&result, &strategy));

    if let Some(path) = output_path {
        TextReportAdapter.write(&result, &strategy, &path.display().to_string())?;
    }
    if let Some(path) = equity_csv {
        write_equity_csv(&result, path)?;
    }
    Ok(())
}

fn run_compare(config_path: &Path) -> Result<(), TrendError> {
    let (adapter, strategy) = load_strategy(config_path)?;
    validate_backtest_config(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;
    let (start, end) = build_date_range(&adapter)?;
    let data_port = build_data_port(&adapter)?;

    if strategy.instruments.short.is_none() {
        tracing::warn!("no short instrument configured, long-short run will hold cash when short");
    }

    let long_only = strategy.with_shorting(false);
    let long_short = strategy.with_shorting(true);
    let long_only_result = run_backtest_pipeline(&data_port, &long_only, &bt_config, start, end)?;
    let long_short_result = run_backtest_pipeline(&data_port, &long_short, &bt_config, start, end)?;

    print!(
        "{}",
        render_comparison(&long_only_result, &long_short_result, &strategy)
    );
    Ok(())
}

/// Last close of `symbol` on or before `end`, if any data is available.
fn latest_close(data_port: &dyn DataPort, symbol: &str, end: NaiveDate) -> Option<f64> {
    match data_port.fetch_series(symbol, NaiveDate::MIN, end) {
        Ok(series) => series.last().map(|p| p.close),
        Err(e) => {
            tracing::warn!(symbol, "no price available: {e}");
            None
        }
    }
}

fn run_trade(config_path: &Path, dry_run: bool) -> Result<(), TrendError> {
    let (adapter, strategy) = load_strategy(config_path)?;
    validate_execution_config(&adapter)?;
    let reconcile_config = build_reconcile_config(&adapter)?;
    let data_port = build_data_port(&adapter)?;

    let holdings_path = adapter
        .get_string("execution", "holdings_path")
        .map(|s| PathBuf::from(s.trim()))
        .unwrap_or_else(|| PathBuf::from("holdings.csv"));
    let initial_cash = parse_double(&adapter, "execution", "cash", 0.0)?;
    let mut venue = PaperVenue::load(&holdings_path, initial_cash)?;

    let index = fetch_index(&data_port, &strategy, NaiveDate::MAX)?;
    let signal = compute_signal(&index, &strategy.policy)?;
    print!("{}", render_signal(&signal, &strategy, None));

    let mut traded = vec![strategy.instruments.long.as_str()];
    traded.extend(strategy.instruments.short.as_deref());
    for symbol in traded {
        if let Some(price) = latest_close(&data_port, symbol, NaiveDate::MAX) {
            venue.set_price(symbol, price);
        }
    }

    let portfolio_value = venue.portfolio_value()?;
    let holdings = venue.get_holdings()?;
    tracing::info!(portfolio_value, holdings = holdings.len(), "account loaded");

    let current_price = match strategy.instruments.target_for(signal.position) {
        Some(symbol) => latest_close(&data_port, symbol, NaiveDate::MAX),
        None => None,
    };
    let intents = reconcile(
        &signal,
        &strategy.instruments,
        portfolio_value,
        current_price,
        &holdings,
        &reconcile_config,
    )?;

    if dry_run {
        print!("{}", render_intents(&intents, false));
        return Ok(());
    }

    let result = submit_intents(&mut venue, &intents);
    // Persist whatever filled, even if a later order was rejected.
    venue.save(&holdings_path)?;
    let accepted = result?;
    print!("{}", render_intents(&accepted, true));
    Ok(())
}

fn run_list_symbols(config_path: &Path) -> Result<(), TrendError> {
    let adapter = load_config(config_path)?;
    let symbols = available_symbols(&adapter)?;

    if symbols.is_empty() {
        tracing::warn!("no symbols found");
    }
    for symbol in &symbols {
        println!("{}", symbol);
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TrendError> {
    let adapter = load_config(config_path)?;
    validate_strategy_config(&adapter)?;
    validate_instruments_config(&adapter)?;

    if adapter.has_key("backtest", "start_date") || adapter.has_key("backtest", "end_date") {
        validate_backtest_config(&adapter)?;
    }
    validate_execution_config(&adapter)?;

    let strategy = build_strategy(&adapter)?;
    println!("Configuration is valid");
    println!("{}", strategy.describe());
    let indicators: Vec<String> = strategy
        .policy
        .required_indicators()
        .iter()
        .chain(strategy.policy.optional_indicators().iter())
        .map(|i| i.to_string())
        .collect();
    println!("Indicators: {}", indicators.join(", "));
    Ok(())
}
