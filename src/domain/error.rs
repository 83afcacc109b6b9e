//! Domain error types.
//!
//! The rule engine and contract resolver are total and never produce these;
//! they come from loading configuration and position data at the edges.

/// Top-level error type for riskdesk.
#[derive(Debug, thiserror::Error)]
pub enum RiskdeskError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid position data in {source_name}: {reason}")]
    PositionData { source_name: String, reason: String },

    #[error("invalid date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RiskdeskError> for std::process::ExitCode {
    fn from(err: &RiskdeskError) -> Self {
        let code: u8 = match err {
            RiskdeskError::Io(_) => 1,
            RiskdeskError::ConfigParse { .. } | RiskdeskError::ConfigInvalid { .. } => 2,
            RiskdeskError::PositionData { .. } | RiskdeskError::Json(_) => 3,
            RiskdeskError::InvalidDate { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
