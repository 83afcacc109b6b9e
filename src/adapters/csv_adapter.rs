//! CSV leg file adapter.
//!
//! Reads one broker leg per row and groups them per account. Expected header:
//!
//! ```text
//! account_number,nickname,symbol,underlying_symbol,instrument_type,expires_at,
//! quantity,quantity_direction,average_open_price,multiplier,mark[,delta]
//! ```
//!
//! IV ranks come from a separate `symbol,iv_rank` file keyed by root symbol.

use crate::domain::error::RiskdeskError;
use crate::domain::grouping::group_legs;
use crate::domain::position::{parse_expiry, AccountPositions, Leg, QuantityDirection};
use crate::ports::position_port::PositionPort;
use serde::Deserialize;
use serde_json::Map;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct LegRow {
    account_number: String,
    #[serde(default)]
    nickname: String,
    symbol: String,
    underlying_symbol: String,
    instrument_type: String,
    expires_at: String,
    quantity: i64,
    quantity_direction: QuantityDirection,
    average_open_price: f64,
    multiplier: Option<i64>,
    mark: Option<f64>,
    #[serde(default)]
    delta: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct IvRankRow {
    symbol: String,
    iv_rank: Option<f64>,
}

pub struct CsvPositionsAdapter {
    legs_path: PathBuf,
}

impl CsvPositionsAdapter {
    pub fn new(legs_path: PathBuf) -> Self {
        Self { legs_path }
    }
}

impl PositionPort for CsvPositionsAdapter {
    fn fetch_accounts(&self) -> Result<Vec<AccountPositions>, RiskdeskError> {
        let source = self.legs_path.display().to_string();
        parse_legs(File::open(&self.legs_path)?, &source)
    }
}

/// Read a `symbol,iv_rank` file into a map keyed by root symbol.
pub fn read_iv_ranks(path: &Path) -> Result<HashMap<String, f64>, RiskdeskError> {
    parse_iv_ranks(File::open(path)?, &path.display().to_string())
}

fn row_error(source_name: &str, row: usize, reason: impl std::fmt::Display) -> RiskdeskError {
    RiskdeskError::PositionData {
        source_name: source_name.to_string(),
        reason: format!("row {}: {}", row, reason),
    }
}

/// Parse leg rows and group them per account, keeping accounts in the order
/// they first appear.
pub fn parse_legs<R: Read>(
    reader: R,
    source_name: &str,
) -> Result<Vec<AccountPositions>, RiskdeskError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut order: Vec<(String, String)> = Vec::new();
    let mut legs_by_account: HashMap<String, Vec<Leg>> = HashMap::new();

    for (index, result) in rdr.deserialize::<LegRow>().enumerate() {
        let row_number = index + 1;
        let row = result.map_err(|e| row_error(source_name, row_number, e))?;

        let expires_at = parse_expiry(&row.expires_at).ok_or_else(|| {
            row_error(
                source_name,
                row_number,
                format!("invalid expires_at '{}'", row.expires_at),
            )
        })?;

        if !legs_by_account.contains_key(&row.account_number) {
            order.push((row.account_number.clone(), row.nickname.clone()));
        }
        legs_by_account
            .entry(row.account_number)
            .or_default()
            .push(Leg {
                symbol: row.symbol,
                underlying_symbol: row.underlying_symbol,
                instrument_type: row.instrument_type,
                expires_at: Some(expires_at),
                quantity: row.quantity,
                quantity_direction: row.quantity_direction,
                average_open_price: row.average_open_price,
                multiplier: row.multiplier.unwrap_or(1),
                mark: row.mark,
                approximate_p_l: 0.0,
                delta: row.delta,
                extra: Map::new(),
            });
    }

    let mut accounts = Vec::with_capacity(order.len());
    for (account_number, nickname) in order {
        let legs = legs_by_account.remove(&account_number).unwrap_or_default();
        let groups = group_legs(legs);
        if groups.is_empty() {
            tracing::debug!(account = %account_number, "skipping account with no derivative legs");
            continue;
        }
        accounts.push(AccountPositions {
            account_number,
            nickname,
            groups,
        });
    }

    tracing::debug!(source = source_name, accounts = accounts.len(), "loaded leg file");
    Ok(accounts)
}

/// Parse `symbol,iv_rank` rows. Rows with an empty rank are skipped.
pub fn parse_iv_ranks<R: Read>(
    reader: R,
    source_name: &str,
) -> Result<HashMap<String, f64>, RiskdeskError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut ranks = HashMap::new();

    for (index, result) in rdr.deserialize::<IvRankRow>().enumerate() {
        let row = result.map_err(|e| row_error(source_name, index + 1, e))?;
        match row.iv_rank {
            Some(rank) => {
                ranks.insert(row.symbol, rank);
            }
            None => tracing::warn!(symbol = %row.symbol, "no iv rank for symbol"),
        }
    }
    Ok(ranks)
}
