//! Build position groups from raw broker legs.
//!
//! Legs are grouped by `(underlying, expiration)` in the order each pair is
//! first seen. Equity legs are excluded; only derivatives are tracked, and a
//! leg without an expiration cannot be placed in a group.

use crate::domain::contract::root_symbol;
use crate::domain::position::{round_cents, Leg, PositionGroup};
use chrono::NaiveDate;
use std::collections::HashMap;

pub const EQUITY_INSTRUMENT: &str = "Equity";

pub fn group_legs(legs: Vec<Leg>) -> Vec<PositionGroup> {
    let mut order: Vec<(String, NaiveDate)> = Vec::new();
    let mut buckets: HashMap<(String, NaiveDate), Vec<Leg>> = HashMap::new();

    for mut leg in legs {
        if leg.instrument_type == EQUITY_INSTRUMENT {
            continue;
        }
        let Some(expires_at) = leg.expires_at else {
            tracing::debug!(symbol = %leg.symbol, "skipping leg without expiration");
            continue;
        };
        leg.approximate_p_l = leg.approximate_pl();
        let key = (leg.underlying_symbol.clone(), expires_at);
        if !buckets.contains_key(&key) {
            order.push(key.clone());
        }
        buckets.entry(key).or_default().push(leg);
    }

    order
        .into_iter()
        .filter_map(|key| {
            let legs = buckets.remove(&key)?;
            Some(build_group(key.0, key.1, legs))
        })
        .collect()
}

fn build_group(underlying: String, expires_at: NaiveDate, legs: Vec<Leg>) -> PositionGroup {
    // The first leg's multiplier applies to the whole group.
    let multiplier = legs.first().map_or(1, |l| l.multiplier) as f64;

    let mut credit = 0.0;
    let mut pl = 0.0;
    let mut delta = 0.0;
    for leg in &legs {
        let sign = if leg.is_long() { -1.0 } else { 1.0 };
        credit += sign * leg.average_open_price * leg.quantity as f64;
        pl += leg.approximate_p_l;
        delta += leg.signed_delta().unwrap_or(0.0);
    }

    let total_credit_received = round_cents(credit * multiplier);
    let current_group_p_l = round_cents(pl);
    let percent_credit_received = if total_credit_received != 0.0 {
        Some((current_group_p_l / total_credit_received.abs() * 100.0).trunc())
    } else {
        None
    };

    PositionGroup {
        underlying_symbol: underlying,
        expires_at,
        total_credit_received,
        current_group_p_l,
        group_approximate_p_l: None,
        percent_credit_received,
        total_delta: Some(round_cents(delta)),
        iv_rank: None,
        positions: legs,
    }
}

/// Attach IV ranks keyed by root symbol. Groups whose root has no entry keep
/// `iv_rank = None`.
pub fn apply_iv_ranks(groups: &mut [PositionGroup], ranks: &HashMap<String, f64>) {
    for group in groups {
        group.iv_rank = ranks.get(root_symbol(&group.underlying_symbol)).copied();
    }
}
