#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use riskdesk::domain::error::RiskdeskError;
pub use riskdesk::domain::position::{AccountPositions, Leg, PositionGroup, QuantityDirection};
use riskdesk::ports::position_port::PositionPort;
use serde_json::Map;

pub struct MockPositionPort {
    pub accounts: Vec<AccountPositions>,
    pub error: Option<String>,
}

impl MockPositionPort {
    pub fn new() -> Self {
        Self {
            accounts: Vec::new(),
            error: None,
        }
    }

    pub fn with_account(mut self, number: &str, nickname: &str, groups: Vec<PositionGroup>) -> Self {
        self.accounts.push(AccountPositions {
            account_number: number.to_string(),
            nickname: nickname.to_string(),
            groups,
        });
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl PositionPort for MockPositionPort {
    fn fetch_accounts(&self) -> Result<Vec<AccountPositions>, RiskdeskError> {
        if let Some(reason) = &self.error {
            return Err(RiskdeskError::PositionData {
                source_name: "mock".to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.accounts.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_time(NaiveTime::MIN)
}

pub fn make_group(
    underlying: &str,
    expires_at: NaiveDate,
    credit: f64,
    pl: f64,
    pct: Option<f64>,
    iv_rank: Option<f64>,
) -> PositionGroup {
    PositionGroup {
        underlying_symbol: underlying.to_string(),
        expires_at,
        total_credit_received: credit,
        current_group_p_l: pl,
        group_approximate_p_l: None,
        percent_credit_received: pct,
        total_delta: None,
        iv_rank,
        positions: Vec::new(),
    }
}

pub fn make_leg(
    underlying: &str,
    expires_at: NaiveDate,
    direction: QuantityDirection,
    quantity: i64,
    open: f64,
    mark: Option<f64>,
) -> Leg {
    Leg {
        symbol: format!("{underlying} {expires_at}"),
        underlying_symbol: underlying.to_string(),
        instrument_type: "Equity Option".to_string(),
        expires_at: Some(expires_at),
        quantity,
        quantity_direction: direction,
        average_open_price: open,
        multiplier: 100,
        mark,
        approximate_p_l: 0.0,
        delta: None,
        extra: Map::new(),
    }
}
