//! JSON positions adapter.
//!
//! Reads the accounts → groups → legs document served by the positions API:
//!
//! ```json
//! {"accounts": [{"account_number": "5WT00001", "groups": [ ... ]}]}
//! ```

use crate::domain::error::RiskdeskError;
use crate::domain::position::{AccountPositions, PositionsResponse};
use crate::ports::position_port::PositionPort;
use std::fs;
use std::path::Path;

pub struct JsonPositionsAdapter {
    response: PositionsResponse,
}

impl JsonPositionsAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RiskdeskError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn from_string(content: &str) -> Result<Self, RiskdeskError> {
        Self::parse(content, "<string>")
    }

    fn parse(content: &str, source_name: &str) -> Result<Self, RiskdeskError> {
        let response: PositionsResponse =
            serde_json::from_str(content).map_err(|e| RiskdeskError::PositionData {
                source_name: source_name.to_string(),
                reason: e.to_string(),
            })?;
        tracing::debug!(
            source = source_name,
            accounts = response.accounts.len(),
            "loaded positions document"
        );
        Ok(Self { response })
    }
}

impl PositionPort for JsonPositionsAdapter {
    fn fetch_accounts(&self) -> Result<Vec<AccountPositions>, RiskdeskError> {
        Ok(self.response.accounts.clone())
    }
}
