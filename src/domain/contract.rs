//! Quarterly futures contract resolution.
//!
//! Index futures expire on the third Friday of March, June, September and
//! December. The "current" contract is the first quarter whose roll date
//! (expiration minus the roll window) has not yet passed.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::fmt;

pub const DEFAULT_ROOT: &str = "/ES";
pub const DEFAULT_ROLL_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuarterCode {
    H,
    M,
    U,
    Z,
}

impl QuarterCode {
    pub const ALL: [QuarterCode; 4] = [
        QuarterCode::H,
        QuarterCode::M,
        QuarterCode::U,
        QuarterCode::Z,
    ];

    /// Calendar month (1-based) in which this quarter expires.
    pub fn month(self) -> u32 {
        match self {
            QuarterCode::H => 3,
            QuarterCode::M => 6,
            QuarterCode::U => 9,
            QuarterCode::Z => 12,
        }
    }

    pub fn letter(self) -> char {
        match self {
            QuarterCode::H => 'H',
            QuarterCode::M => 'M',
            QuarterCode::U => 'U',
            QuarterCode::Z => 'Z',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractLabel {
    pub root: String,
    pub code: QuarterCode,
    pub year: i32,
}

impl ContractLabel {
    /// Units digit of the contract year, as printed in the label.
    pub fn year_digit(&self) -> u8 {
        self.year.rem_euclid(10) as u8
    }

    pub fn expiration(&self) -> Option<NaiveDate> {
        third_friday(self.year, self.code.month())
    }
}

impl fmt::Display for ContractLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.root, self.code.letter(), self.year_digit())
    }
}

/// Third Friday of `month` in `year`, found by scanning from the 1st.
pub fn third_friday(year: i32, month: u32) -> Option<NaiveDate> {
    let mut date = NaiveDate::from_ymd_opt(year, month, 1)?;
    let mut fridays = 0;
    loop {
        if date.weekday() == Weekday::Fri {
            fridays += 1;
            if fridays == 3 {
                return Some(date);
            }
        }
        date = date.succ_opt()?;
    }
}

/// Contract that is current on `as_of`, rolling `roll_days` calendar days
/// before each quarterly expiration. A date on the roll date itself still
/// belongs to the expiring quarter.
pub fn current_contract(root: &str, as_of: NaiveDate, roll_days: u32) -> ContractLabel {
    let year = as_of.year();
    for code in QuarterCode::ALL {
        let Some(expiry) = third_friday(year, code.month()) else {
            continue;
        };
        let roll_date = expiry
            .checked_sub_days(Days::new(u64::from(roll_days)))
            .unwrap_or(NaiveDate::MIN);
        if as_of <= roll_date {
            return ContractLabel {
                root: root.to_string(),
                code,
                year,
            };
        }
    }
    ContractLabel {
        root: root.to_string(),
        code: QuarterCode::H,
        year: year + 1,
    }
}

/// Strip a trailing month code and year from a futures symbol
/// (`/ESU5` → `/ES`). Symbols without a leading `/` are returned unchanged.
pub fn root_symbol(symbol: &str) -> &str {
    if !symbol.starts_with('/') {
        return symbol;
    }
    let without_year = symbol.trim_end_matches(|c: char| c.is_ascii_digit());
    if without_year.len() == symbol.len() {
        return symbol;
    }
    match without_year.chars().last() {
        Some(c) if "FGHJKMNQUVXZ".contains(c) && without_year.len() > 2 => {
            &without_year[..without_year.len() - 1]
        }
        _ => symbol,
    }
}
