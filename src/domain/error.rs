//! Domain error types.

/// Top-level error type for trendtrader.
///
/// Every variant is recoverable: a caller iterating over symbols or parameter
/// sets can log the failure and move on to the next one.
#[derive(Debug, thiserror::Error)]
pub enum TrendError {
    #[error("insufficient data for {symbol}: have {points} points, need {required}")]
    DataInsufficient {
        symbol: String,
        points: usize,
        required: usize,
    },

    #[error("insufficient history: have {rows} indicator rows, need at least 2")]
    InsufficientHistory { rows: usize },

    #[error("no usable periods after aligning signals with {symbol}")]
    EmptyRange { symbol: String },

    #[error("invalid allocation: {reason}")]
    InvalidAllocation { reason: String },

    #[error("price unavailable for {symbol}")]
    PriceUnavailable { symbol: String },

    #[error("no instrument configured for {position} exposure")]
    InstrumentUnavailable { position: String },

    #[error("invalid price series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("order rejected for {symbol}: {reason}")]
    OrderRejected { symbol: String, reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendError {
    /// Process exit status for this error family.
    pub fn exit_status(&self) -> u8 {
        match self {
            TrendError::Io(_) => 1,
            TrendError::ConfigParse { .. }
            | TrendError::ConfigMissing { .. }
            | TrendError::ConfigInvalid { .. } => 2,
            TrendError::Data { .. } | TrendError::InvalidSeries { .. } => 3,
            TrendError::DataInsufficient { .. }
            | TrendError::InsufficientHistory { .. }
            | TrendError::EmptyRange { .. } => 5,
            TrendError::InvalidAllocation { .. }
            | TrendError::PriceUnavailable { .. }
            | TrendError::InstrumentUnavailable { .. }
            | TrendError::OrderRejected { .. } => 6,
        }
    }
}

impl From<&TrendError> for std::process::ExitCode {
    fn from(err: &TrendError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_insufficient_message() {
        let err = TrendError::DataInsufficient {
            symbol: "^NDX".into(),
            points: 10,
            required: 250,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data for ^NDX: have 10 points, need 250"
        );
    }

    #[test]
    fn config_invalid_message() {
        let err = TrendError::ConfigInvalid {
            section: "strategy".into(),
            key: "ma_period".into(),
            reason: "must be positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [strategy] ma_period: must be positive"
        );
    }

    #[test]
    fn io_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TrendError = io.into();
        assert!(matches!(err, TrendError::Io(_)));
    }

    #[test]
    fn exit_status_groups_by_family() {
        let config = TrendError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        };
        let history = TrendError::InsufficientHistory { rows: 1 };
        let price = TrendError::PriceUnavailable {
            symbol: "TQQQ".into(),
        };

        assert_eq!(config.exit_status(), 2);
        assert_eq!(history.exit_status(), 5);
        assert_eq!(price.exit_status(), 6);
    }
}
