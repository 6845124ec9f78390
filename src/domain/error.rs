//! Domain error types.

/// Top-level error type for stratscan.
#[derive(Debug, thiserror::Error)]
pub enum StratscanError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {symbol} ({timeframe})")]
    NoData { symbol: String, timeframe: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("unknown strategy '{tag}' (expected MOMENTUM, MEAN_REVERSAL, GRID or MULTITIMEFRAME)")]
    InvalidStrategy { tag: String },

    #[error("unknown timeframe '{tag}' (expected 1h, 4h, 1d, 1wk or 1mo)")]
    InvalidTimeframe { tag: String },

    #[error("unknown period '{tag}' (expected 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y or max)")]
    InvalidPeriod { tag: String },

    #[error("invalid date range: {start} is not before {end}")]
    InvalidRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("unknown sector '{sector}'")]
    UnknownSector { sector: String },

    #[error("invalid symbol list: {reason}")]
    InvalidSymbols { reason: String },

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

    #[error("worker pool error: {reason}")]
    WorkerPool { reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StratscanError {
    /// True for the "data unavailable" family that callers skip rather than abort on.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(
            self,
            StratscanError::NoData { .. } | StratscanError::InsufficientData { .. }
        )
    }
}

impl From<&StratscanError> for std::process::ExitCode {
    fn from(err: &StratscanError) -> Self {
        let code: u8 = match err {
            StratscanError::Io(_)
            | StratscanError::Json(_)
            | StratscanError::WorkerPool { .. } => 1,
            StratscanError::ConfigParse { .. }
            | StratscanError::ConfigMissing { .. }
            | StratscanError::ConfigInvalid { .. } => 2,
            StratscanError::DataSource { .. } => 3,
            StratscanError::InvalidStrategy { .. }
            | StratscanError::InvalidTimeframe { .. }
            | StratscanError::InvalidPeriod { .. }
            | StratscanError::InvalidRange { .. }
            | StratscanError::UnknownSector { .. }
            | StratscanError::InvalidSymbols { .. } => 4,
            StratscanError::NoData { .. } | StratscanError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
