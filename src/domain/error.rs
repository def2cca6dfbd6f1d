//! Domain error types.

/// Top-level error type for trendrank.
#[derive(Debug, thiserror::Error)]
pub enum TrendrankError {
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

    #[error("data error in {source_name}: {reason}")]
    Data { source_name: String, reason: String },

    #[error("required column '{column}' missing from {source_name}")]
    MissingColumn { source_name: String, column: String },

    #[error("no price data for {instrument}")]
    NoData { instrument: String },

    #[error("no usable rows in rank input {source_name}")]
    EmptyRankInput { source_name: String },

    #[error("no rank snapshots to backtest")]
    NoSnapshots,

    #[error("output error for {path}: {reason}")]
    Output { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TrendrankError> for std::process::ExitCode {
    fn from(err: &TrendrankError) -> Self {
        let code: u8 = match err {
            TrendrankError::Io(_) | TrendrankError::Output { .. } => 1,
            TrendrankError::ConfigParse { .. }
            | TrendrankError::ConfigMissing { .. }
            | TrendrankError::ConfigInvalid { .. } => 2,
            TrendrankError::Data { .. } | TrendrankError::MissingColumn { .. } => 3,
            TrendrankError::NoData { .. }
            | TrendrankError::EmptyRankInput { .. }
            | TrendrankError::NoSnapshots => 5,
        };
        std::process::ExitCode::from(code)
    }
}
