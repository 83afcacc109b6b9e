//! Position data model: accounts → groups → legs.
//!
//! Groups use the snake_case field names served by the positions API; legs
//! keep the broker's kebab-case keys and carry any unknown keys through
//! untouched in [`Leg::extra`].

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantityDirection {
    Long,
    Short,
    #[default]
    Zero,
}

/// A single option or futures leg as reported by the broker. Every typed
/// field is optional on input so that a leg with unfamiliar keys still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Leg {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub underlying_symbol: String,
    #[serde(default)]
    pub instrument_type: String,
    #[serde(
        default,
        with = "opt_expiry_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<NaiveDate>,
    #[serde(default = "one", deserialize_with = "lenient::int")]
    pub quantity: i64,
    #[serde(default)]
    pub quantity_direction: QuantityDirection,
    #[serde(default, deserialize_with = "lenient::float")]
    pub average_open_price: f64,
    #[serde(default = "one", deserialize_with = "lenient::int")]
    pub multiplier: i64,
    #[serde(default, deserialize_with = "lenient::opt_float")]
    pub mark: Option<f64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub approximate_p_l: f64,
    /// Unsigned option delta as quoted by the market data feed.
    #[serde(
        default,
        deserialize_with = "lenient::opt_float",
        skip_serializing_if = "Option::is_none"
    )]
    pub delta: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn one() -> i64 {
    1
}

impl Leg {
    pub fn is_long(&self) -> bool {
        self.quantity_direction == QuantityDirection::Long
    }

    /// Mark-to-market P/L of the leg rounded to cents; zero without a mark.
    pub fn approximate_pl(&self) -> f64 {
        let Some(mark) = self.mark else {
            return 0.0;
        };
        let size = (self.quantity * self.multiplier) as f64;
        let pl = if self.is_long() {
            (mark - self.average_open_price) * size
        } else {
            (self.average_open_price - mark) * size
        };
        round_cents(pl)
    }

    /// Position delta of the leg rounded to cents. Calls count positive when
    /// long, puts when short; the option type is read from the symbol.
    pub fn signed_delta(&self) -> Option<f64> {
        let delta = self.delta.filter(|d| !d.is_nan())?.abs();
        let short = self.quantity_direction == QuantityDirection::Short;
        let sign = match (self.symbol.contains('C'), self.symbol.contains('P')) {
            (true, _) if self.is_long() => 1.0,
            (true, _) => -1.0,
            (false, true) if short => 1.0,
            (false, true) => -1.0,
            (false, false) => 1.0,
        };
        Some(round_cents(sign * delta))
    }
}

/// Option legs sharing one underlying and one expiration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionGroup {
    pub underlying_symbol: String,
    #[serde(with = "expiry_date")]
    pub expires_at: NaiveDate,
    #[serde(default)]
    pub total_credit_received: f64,
    #[serde(default)]
    pub current_group_p_l: f64,
    /// P/L under the name the positions page reads; wins over
    /// `current_group_p_l` when both are present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_approximate_p_l: Option<f64>,
    #[serde(default)]
    pub percent_credit_received: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_delta: Option<f64>,
    #[serde(default)]
    pub iv_rank: Option<f64>,
    #[serde(default)]
    pub positions: Vec<Leg>,
}

impl PositionGroup {
    pub fn profit_loss(&self) -> f64 {
        self.group_approximate_p_l.unwrap_or(self.current_group_p_l)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPositions {
    pub account_number: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub groups: Vec<PositionGroup>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionsResponse {
    #[serde(default)]
    pub accounts: Vec<AccountPositions>,
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse an expiration given as `YYYY-MM-DD` or as an RFC 3339 timestamp,
/// keeping only the UTC calendar date. The time of day is dropped, so days to
/// expiration count from midnight of that date rather than the exact close.
pub fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc().date())
}

mod expiry_date {
    use super::*;
    use serde::de::Error;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_expiry(&raw).ok_or_else(|| D::Error::custom(format!("invalid expiration '{raw}'")))
    }
}

mod opt_expiry_date {
    use super::*;
    use serde::de::Error;

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => expiry_date::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse_expiry(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid expiration '{raw}'"))),
        }
    }
}

/// Broker payloads send numbers either as JSON numbers or as strings.
mod lenient {
    use super::*;
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    fn to_float<E: Error>(raw: Raw) -> Result<f64, E> {
        match raw {
            Raw::Int(v) => Ok(v as f64),
            Raw::Float(v) => Ok(v),
            Raw::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid number '{s}'"))),
        }
    }

    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        to_float(Raw::deserialize(deserializer)?)
    }

    pub fn opt_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(raw) => to_float(raw).map(Some),
        }
    }

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Ok(v),
            Raw::Float(v) => Ok(v as i64),
            Raw::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid integer '{s}'"))),
        }
    }
}
