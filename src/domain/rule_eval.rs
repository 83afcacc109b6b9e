//! Rule evaluation engine.
//!
//! Evaluates a rule catalogue against one position group at a reference
//! instant.
//!
//! # Evaluation Semantics
//!
//! - Results keep catalogue order; they are never sorted by severity.
//! - Days to expiration round up: a group expiring in 13.4 days has 14 left.
//! - Percent captured falls back to `P/L / credit * 100` (rounded half up)
//!   when the group does not carry one, and to `0` when the credit is zero.
//! - A missing IV rank suppresses the IV rule; a NaN input suppresses any rule.
//! - Groups are only read, never written.

use crate::domain::position::PositionGroup;
use crate::domain::rule::{default_rules, Rule, RuleResult, Severity};
use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Evaluate the standard catalogue.
pub fn evaluate(group: &PositionGroup, as_of: NaiveDateTime) -> Vec<RuleResult> {
    evaluate_rules(&default_rules(), group, as_of)
}

pub fn evaluate_rules(
    rules: &[Rule],
    group: &PositionGroup,
    as_of: NaiveDateTime,
) -> Vec<RuleResult> {
    rules
        .iter()
        .filter_map(|rule| evaluate_rule(rule, group, as_of))
        .collect()
}

pub fn evaluate_rule(
    rule: &Rule,
    group: &PositionGroup,
    as_of: NaiveDateTime,
) -> Option<RuleResult> {
    let level = match rule {
        Rule::DaysToExpiration {
            alert_days,
            warning_days,
        } => {
            let days = days_to_expiration(group, as_of);
            if days <= *alert_days {
                Severity::Alert
            } else if days <= *warning_days {
                Severity::Warning
            } else {
                return None;
            }
        }
        Rule::ProfitTarget {
            alert_pct,
            warning_pct,
        } => {
            let pct = percent_captured(group);
            if pct.is_nan() {
                return None;
            }
            if pct >= *alert_pct {
                Severity::Alert
            } else if pct >= *warning_pct {
                Severity::Warning
            } else {
                return None;
            }
        }
        Rule::LossLimit {
            alert_pct,
            warning_pct,
        } => {
            let pct = percent_captured(group);
            if pct.is_nan() {
                return None;
            }
            if pct <= *alert_pct {
                Severity::Alert
            } else if pct <= *warning_pct {
                Severity::Warning
            } else {
                return None;
            }
        }
        Rule::IvRankFloor {
            alert_below,
            warning_below,
        } => {
            let rank = group.iv_rank.filter(|r| !r.is_nan())?;
            if rank < *alert_below {
                Severity::Alert
            } else if rank < *warning_below {
                Severity::Warning
            } else {
                return None;
            }
        }
    };
    Some(RuleResult::new(rule.id(), level))
}

/// Whole days until the group's expiration date (taken at 00:00), rounded up.
/// Negative once the group has expired.
pub fn days_to_expiration(group: &PositionGroup, as_of: NaiveDateTime) -> i64 {
    let expires = group.expires_at.and_time(NaiveTime::MIN);
    let ms = (expires - as_of).num_milliseconds();
    ms.div_euclid(MS_PER_DAY) + i64::from(ms.rem_euclid(MS_PER_DAY) != 0)
}

/// Percentage of the opening credit captured so far.
pub fn percent_captured(group: &PositionGroup) -> f64 {
    if let Some(pct) = group.percent_credit_received {
        return pct;
    }
    let total = group.total_credit_received;
    if total == 0.0 || total.is_nan() {
        return 0.0;
    }
    round_half_up(group.profit_loss() / total * 100.0)
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// A group paired with the results evaluated for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedGroup<'a> {
    #[serde(flatten)]
    pub group: &'a PositionGroup,
    pub rules: Vec<RuleResult>,
}

impl AnnotatedGroup<'_> {
    /// Most severe level among the results, if any fired.
    pub fn severity(&self) -> Option<Severity> {
        self.rules.iter().map(|r| r.level).max()
    }
}

pub fn annotate<'a>(
    group: &'a PositionGroup,
    rules: &[Rule],
    as_of: NaiveDateTime,
) -> AnnotatedGroup<'a> {
    AnnotatedGroup {
        group,
        rules: evaluate_rules(rules, group, as_of),
    }
}
