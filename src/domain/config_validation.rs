//! Configuration validation.
//!
//! Every section is checked before anything is fetched or traded. Numeric keys
//! that are present but unparsable are reported instead of silently falling
//! back to their defaults.

use crate::domain::error::TrendError;
use crate::domain::signal::SignalPolicy;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TrendError> {
    let policy = validate_policy(config)?;
    let ma_period = validate_period(config, "ma_period", 250, 1)?;
    validate_period(config, "roc_period", 20, 1)?;
    validate_strong_trend_roc(config)?;

    if policy == SignalPolicy::DualMaMomentum {
        validate_short_period(config, ma_period)?;
        validate_period(config, "volatility_window", 20, 2)?;
        validate_roc_threshold(config)?;
        validate_volatility_bands(config)?;
    }
    Ok(())
}

pub fn validate_instruments_config(config: &dyn ConfigPort) -> Result<(), TrendError> {
    require_string(config, "instruments", "index")?;
    require_string(config, "instruments", "long")?;

    if config.get_bool("strategy", "allow_shorting", false) {
        require_string(config, "instruments", "short")?;
    }
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TrendError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    require_string(config, "data", "path")?;
    Ok(())
}

pub fn validate_execution_config(config: &dyn ConfigPort) -> Result<(), TrendError> {
    let cash = parse_double(config, "execution", "cash", 0.0)?;
    if cash < 0.0 {
        return Err(invalid("execution", "cash", "cash must be non-negative"));
    }

    let fraction = parse_double(config, "execution", "min_rebalance_fraction", 0.0)?;
    if !(0.0..1.0).contains(&fraction) {
        return Err(invalid(
            "execution",
            "min_rebalance_fraction",
            "min_rebalance_fraction must be in [0, 1)",
        ));
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` value, reporting a missing key as `ConfigMissing`.
pub fn parse_date(value: Option<&str>, section: &str, field: &str) -> Result<NaiveDate, TrendError> {
    match value {
        None => Err(TrendError::ConfigMissing {
            section: section.to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            TrendError::ConfigInvalid {
                section: section.to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

/// Value of `key` as f64, or `default` when absent.
pub fn parse_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TrendError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(invalid(section, key, &format!("{} is not a number: {}", key, raw))),
        },
    }
}

/// Value of `key` as a positive integer, or `default` when absent.
pub fn parse_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, TrendError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| invalid(section, key, &format!("{} is not a whole number: {}", key, raw))),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> TrendError {
    TrendError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn require_string(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, TrendError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(TrendError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_policy(config: &dyn ConfigPort) -> Result<SignalPolicy, TrendError> {
    match config.get_string("strategy", "policy") {
        None => Ok(SignalPolicy::SingleMa),
        Some(s) => SignalPolicy::parse(&s).ok_or_else(|| {
            invalid(
                "strategy",
                "policy",
                "policy must be single_ma or dual_ma_momentum",
            )
        }),
    }
}

fn validate_period(
    config: &dyn ConfigPort,
    key: &str,
    default: usize,
    min: usize,
) -> Result<usize, TrendError> {
    let value = parse_usize(config, "strategy", key, default)?;
    if value < min {
        return Err(invalid(
            "strategy",
            key,
            &format!("{} must be at least {}", key, min),
        ));
    }
    Ok(value)
}

fn validate_short_period(config: &dyn ConfigPort, ma_period: usize) -> Result<(), TrendError> {
    let value = validate_period(config, "ma_short_period", 50, 1)?;
    if value >= ma_period {
        return Err(invalid(
            "strategy",
            "ma_short_period",
            "ma_short_period must be shorter than ma_period",
        ));
    }
    Ok(())
}

fn validate_roc_threshold(config: &dyn ConfigPort) -> Result<(), TrendError> {
    let value = parse_double(config, "strategy", "roc_threshold", 0.02)?;
    if value < 0.0 {
        return Err(invalid(
            "strategy",
            "roc_threshold",
            "roc_threshold must be non-negative",
        ));
    }
    Ok(())
}

fn validate_strong_trend_roc(config: &dyn ConfigPort) -> Result<(), TrendError> {
    let value = parse_double(config, "strategy", "strong_trend_roc", 0.05)?;
    if value < 0.0 {
        return Err(invalid(
            "strategy",
            "strong_trend_roc",
            "strong_trend_roc must be non-negative",
        ));
    }
    Ok(())
}

fn validate_volatility_bands(config: &dyn ConfigPort) -> Result<(), TrendError> {
    let moderate = parse_double(config, "strategy", "volatility_moderate", 0.35)?;
    let high = parse_double(config, "strategy", "volatility_high", 0.50)?;

    if moderate <= 0.0 {
        return Err(invalid(
            "strategy",
            "volatility_moderate",
            "volatility_moderate must be positive",
        ));
    }
    if high <= moderate {
        return Err(invalid(
            "strategy",
            "volatility_high",
            "volatility_high must exceed volatility_moderate",
        ));
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TrendError> {
    let value = parse_double(config, "backtest", "initial_capital", 100_000.0)?;
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TrendError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "backtest", "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "backtest", "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_single_ma_strategy_passes() {
        let config = make_config("[strategy]\npolicy = single_ma\nma_period = 250\n");
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn empty_strategy_uses_defaults() {
        let config = make_config("[strategy]\n");
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn valid_dual_strategy_passes() {
        let config = make_config(
            r#"
[strategy]
policy = dual_ma_momentum
ma_period = 200
ma_short_period = 50
roc_period = 20
roc_threshold = 0.02
volatility_window = 20
volatility_moderate = 0.35
volatility_high = 0.50
allow_shorting = true
"#,
        );
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn unknown_policy_fails() {
        let config = make_config("[strategy]\npolicy = rsi_reversal\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigInvalid { key, .. } if key == "policy"));
    }

    #[test]
    fn zero_ma_period_fails() {
        let config = make_config("[strategy]\nma_period = 0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigInvalid { key, .. } if key == "ma_period"));
    }

    #[test]
    fn non_numeric_period_fails() {
        let config = make_config("[strategy]\nma_period = long\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigInvalid { key, .. } if key == "ma_period"));
    }

    #[test]
    fn short_period_must_be_shorter() {
        let config = make_config(
            "[strategy]\npolicy = dual_ma_momentum\nma_period = 50\nma_short_period = 50\n",
        );
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigInvalid { key, .. } if key == "ma_short_period"));
    }

    #[test]
    fn volatility_window_needs_two_returns() {
        let config =
            make_config("[strategy]\npolicy = dual_ma_momentum\nvolatility_window = 1\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(
            matches!(err, TrendError::ConfigInvalid { key, .. } if key == "volatility_window")
        );
    }

    #[test]
    fn volatility_bands_must_be_ordered() {
        let config = make_config(
            "[strategy]\npolicy = dual_ma_momentum\nvolatility_moderate = 0.6\nvolatility_high = 0.5\n",
        );
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigInvalid { key, .. } if key == "volatility_high"));
    }

    #[test]
    fn negative_roc_threshold_fails() {
        let config =
            make_config("[strategy]\npolicy = dual_ma_momentum\nroc_threshold = -0.01\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigInvalid { key, .. } if key == "roc_threshold"));
    }

    #[test]
    fn instruments_require_index_and_long() {
        let config = make_config("[instruments]\nindex = ^NDX\n");
        let err = validate_instruments_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigMissing { key, .. } if key == "long"));

        let config = make_config("[instruments]\nlong = TQQQ\n");
        let err = validate_instruments_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigMissing { key, .. } if key == "index"));
    }

    #[test]
    fn shorting_requires_short_instrument() {
        let config = make_config(
            "[strategy]\nallow_shorting = true\n[instruments]\nindex = ^NDX\nlong = TQQQ\n",
        );
        let err = validate_instruments_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigMissing { key, .. } if key == "short"));

        let config = make_config(
            "[strategy]\nallow_shorting = true\n[instruments]\nindex = ^NDX\nlong = TQQQ\nshort = SQQQ\n",
        );
        assert!(validate_instruments_config(&config).is_ok());
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
initial_capital = 100000.0
start_date = 2015-01-01
end_date = 2024-12-31

[data]
path = ./data
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let config = make_config(
            "[backtest]\ninitial_capital = 0\nstart_date = 2020-01-01\nend_date = 2024-12-31\n[data]\npath = d\n",
        );
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigInvalid { key, .. } if key == "initial_capital"));
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let config = make_config(
            "[backtest]\nstart_date = 2020/01/01\nend_date = 2024-12-31\n[data]\npath = d\n",
        );
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn missing_end_date_fails() {
        let config = make_config("[backtest]\nstart_date = 2020-01-01\n[data]\npath = d\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigMissing { key, .. } if key == "end_date"));
    }

    #[test]
    fn start_date_after_end_date_fails() {
        let config = make_config(
            "[backtest]\nstart_date = 2024-12-31\nend_date = 2020-01-01\n[data]\npath = d\n",
        );
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn missing_data_path_fails() {
        let config = make_config("[backtest]\nstart_date = 2020-01-01\nend_date = 2024-12-31\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigMissing { key, .. } if key == "path"));
    }

    #[test]
    fn execution_defaults_pass() {
        let config = make_config("[execution]\n");
        assert!(validate_execution_config(&config).is_ok());
    }

    #[test]
    fn negative_cash_fails() {
        let config = make_config("[execution]\ncash = -1\n");
        let err = validate_execution_config(&config).unwrap_err();
        assert!(matches!(err, TrendError::ConfigInvalid { key, .. } if key == "cash"));
    }

    #[test]
    fn rebalance_fraction_out_of_range_fails() {
        let config = make_config("[execution]\nmin_rebalance_fraction = 1.0\n");
        let err = validate_execution_config(&config).unwrap_err();
        assert!(
            matches!(err, TrendError::ConfigInvalid { key, .. } if key == "min_rebalance_fraction")
        );
    }

    #[test]
    fn parse_double_rejects_garbage() {
        let config = make_config("[backtest]\ninitial_capital = lots\n");
        assert!(parse_double(&config, "backtest", "initial_capital", 1.0).is_err());
        assert_eq!(parse_double(&config, "backtest", "missing", 1.5).unwrap(), 1.5);
    }
}
