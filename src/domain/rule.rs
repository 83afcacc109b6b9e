//! Risk rule catalogue.
//!
//! Each rule is an independent predicate carrying its own thresholds. The
//! catalogue is an ordered `Vec<Rule>`; evaluation order only decides output
//! order, so adding a rule means appending a variant here and an arm in
//! [`crate::domain::rule_eval`].

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Alert,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Alert => write!(f, "alert"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    pub id: String,
    pub level: Severity,
}

impl RuleResult {
    pub fn new(id: impl Into<String>, level: Severity) -> Self {
        Self {
            id: id.into(),
            level,
        }
    }
}

pub const DEFAULT_DTE_ALERT_DAYS: i64 = 21;
pub const DEFAULT_DTE_WARNING_DAYS: i64 = 28;
pub const DEFAULT_PROFIT_ALERT_PCT: f64 = 50.0;
pub const DEFAULT_PROFIT_WARNING_PCT: f64 = 40.0;
pub const DEFAULT_LOSS_ALERT_PCT: f64 = -200.0;
pub const DEFAULT_LOSS_WARNING_PCT: f64 = -150.0;
pub const DEFAULT_IV_RANK_ALERT_BELOW: f64 = 10.0;
pub const DEFAULT_IV_RANK_WARNING_BELOW: f64 = 14.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Alert at or under `alert_days` to expiration, warn at or under `warning_days`.
    DaysToExpiration { alert_days: i64, warning_days: i64 },
    /// Alert when the captured credit reaches `alert_pct`, warn from `warning_pct`.
    ProfitTarget { alert_pct: f64, warning_pct: f64 },
    /// Alert at or below `alert_pct` of credit, warn at or below `warning_pct`.
    LossLimit { alert_pct: f64, warning_pct: f64 },
    /// Alert under `alert_below` IV rank, warn under `warning_below`.
    IvRankFloor { alert_below: f64, warning_below: f64 },
}

impl Rule {
    /// Label attached to every result this rule produces.
    pub fn id(&self) -> String {
        match self {
            Rule::DaysToExpiration { alert_days, .. } => format!("{alert_days} dte"),
            Rule::ProfitTarget { alert_pct, .. } => format!("{alert_pct}% profit"),
            Rule::LossLimit { alert_pct, .. } => format!("{}x loss", -alert_pct / 100.0),
            Rule::IvRankFloor { warning_below, .. } => format!("{warning_below} iv rank"),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::DaysToExpiration {
                alert_days,
                warning_days,
            } => write!(
                f,
                "{}: alert <= {alert_days} days, warning <= {warning_days} days",
                self.id()
            ),
            Rule::ProfitTarget {
                alert_pct,
                warning_pct,
            } => write!(
                f,
                "{}: alert >= {alert_pct}%, warning >= {warning_pct}%",
                self.id()
            ),
            Rule::LossLimit {
                alert_pct,
                warning_pct,
            } => write!(
                f,
                "{}: alert <= {alert_pct}%, warning <= {warning_pct}%",
                self.id()
            ),
            Rule::IvRankFloor {
                alert_below,
                warning_below,
            } => write!(
                f,
                "{}: alert < {alert_below}, warning < {warning_below}",
                self.id()
            ),
        }
    }
}

/// The standard catalogue, in evaluation order.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::DaysToExpiration {
            alert_days: DEFAULT_DTE_ALERT_DAYS,
            warning_days: DEFAULT_DTE_WARNING_DAYS,
        },
        Rule::ProfitTarget {
            alert_pct: DEFAULT_PROFIT_ALERT_PCT,
            warning_pct: DEFAULT_PROFIT_WARNING_PCT,
        },
        Rule::LossLimit {
            alert_pct: DEFAULT_LOSS_ALERT_PCT,
            warning_pct: DEFAULT_LOSS_WARNING_PCT,
        },
        Rule::IvRankFloor {
            alert_below: DEFAULT_IV_RANK_ALERT_BELOW,
            warning_below: DEFAULT_IV_RANK_WARNING_BELOW,
        },
    ]
}
