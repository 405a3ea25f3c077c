//! Domain error types.
//!
//! Only [`BacktestError::DataIntegrity`] aborts a run from inside the engine.
//! Insufficient funds, missing benchmark data and degenerate ratios resolve to
//! values in the result instead of errors.

/// Top-level error type for stratbench.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("data integrity error at bar {index}: {reason}")]
    DataIntegrity { index: usize, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy '{name}' (expected one of: {expected})")]
    UnknownStrategy { name: String, expected: String },

    #[error("data source error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BacktestError {
    pub fn integrity(index: usize, reason: impl Into<String>) -> Self {
        BacktestError::DataIntegrity {
            index,
            reason: reason.into(),
        }
    }

    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        BacktestError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_data_integrity(&self) -> bool {
        matches!(self, BacktestError::DataIntegrity { .. })
    }
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) | BacktestError::Report { .. } => 1,
            BacktestError::ConfigParse { .. } | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::Data { .. } => 3,
            BacktestError::UnknownStrategy { .. } => 4,
            BacktestError::DataIntegrity { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
