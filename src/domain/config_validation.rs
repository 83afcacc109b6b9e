//! Configuration validation.
//!
//! Every key is optional; validation checks that each configured value
//! parses and that the effective values (configured or default) are
//! consistent before any rule is built.

use crate::domain::contract::{DEFAULT_ROLL_DAYS, DEFAULT_ROOT};
use crate::domain::error::RiskdeskError;
use crate::domain::rule::*;
use crate::ports::config_port::ConfigPort;

pub const MAX_ROLL_DAYS: i64 = 90;

const INT_KEYS: [(&str, &str); 3] = [
    ("rules", "dte_alert_days"),
    ("rules", "dte_warning_days"),
    ("futures", "roll_days"),
];

const FLOAT_KEYS: [(&str, &str); 6] = [
    ("rules", "profit_alert_pct"),
    ("rules", "profit_warning_pct"),
    ("rules", "loss_alert_pct"),
    ("rules", "loss_warning_pct"),
    ("rules", "iv_rank_alert_below"),
    ("rules", "iv_rank_warning_below"),
];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), RiskdeskError> {
    validate_rules_config(config)?;
    validate_futures_config(config)?;
    Ok(())
}

pub fn validate_rules_config(config: &dyn ConfigPort) -> Result<(), RiskdeskError> {
    validate_numbers(config, "rules")?;
    validate_dte(config)?;
    validate_profit(config)?;
    validate_loss(config)?;
    validate_iv_rank(config)?;
    Ok(())
}

pub fn validate_futures_config(config: &dyn ConfigPort) -> Result<(), RiskdeskError> {
    validate_numbers(config, "futures")?;
    validate_root(config)?;
    validate_roll_days(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> RiskdeskError {
    RiskdeskError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Typed lookups fall back to the default on unparseable text, so configured
/// values are checked against their raw strings.
fn validate_numbers(config: &dyn ConfigPort, section: &str) -> Result<(), RiskdeskError> {
    for (_, key) in INT_KEYS.iter().filter(|(s, _)| *s == section) {
        if let Some(raw) = config.get_string(section, key) {
            if raw.trim().parse::<i64>().is_err() {
                return Err(invalid(
                    section,
                    key,
                    &format!("{key} must be an integer, got '{raw}'"),
                ));
            }
        }
    }
    for (_, key) in FLOAT_KEYS.iter().filter(|(s, _)| *s == section) {
        if let Some(raw) = config.get_string(section, key) {
            if raw.trim().parse::<f64>().is_err() {
                return Err(invalid(
                    section,
                    key,
                    &format!("{key} must be a number, got '{raw}'"),
                ));
            }
        }
    }
    Ok(())
}

fn validate_dte(config: &dyn ConfigPort) -> Result<(), RiskdeskError> {
    let alert = config.get_int("rules", "dte_alert_days", DEFAULT_DTE_ALERT_DAYS);
    let warning = config.get_int("rules", "dte_warning_days", DEFAULT_DTE_WARNING_DAYS);
    if alert < 0 {
        return Err(invalid(
            "rules",
            "dte_alert_days",
            "dte_alert_days must be non-negative",
        ));
    }
    if warning < alert {
        return Err(invalid(
            "rules",
            "dte_warning_days",
            "dte_warning_days must be at least dte_alert_days",
        ));
    }
    Ok(())
}

fn validate_profit(config: &dyn ConfigPort) -> Result<(), RiskdeskError> {
    let alert = config.get_double("rules", "profit_alert_pct", DEFAULT_PROFIT_ALERT_PCT);
    let warning = config.get_double("rules", "profit_warning_pct", DEFAULT_PROFIT_WARNING_PCT);
    if !alert.is_finite() || alert <= 0.0 {
        return Err(invalid(
            "rules",
            "profit_alert_pct",
            "profit_alert_pct must be positive",
        ));
    }
    if !warning.is_finite() || warning > alert {
        return Err(invalid(
            "rules",
            "profit_warning_pct",
            "profit_warning_pct must not exceed profit_alert_pct",
        ));
    }
    Ok(())
}

fn validate_loss(config: &dyn ConfigPort) -> Result<(), RiskdeskError> {
    let alert = config.get_double("rules", "loss_alert_pct", DEFAULT_LOSS_ALERT_PCT);
    let warning = config.get_double("rules", "loss_warning_pct", DEFAULT_LOSS_WARNING_PCT);
    if !alert.is_finite() || alert >= 0.0 {
        return Err(invalid(
            "rules",
            "loss_alert_pct",
            "loss_alert_pct must be negative",
        ));
    }
    if !warning.is_finite() || warning >= 0.0 || warning < alert {
        return Err(invalid(
            "rules",
            "loss_warning_pct",
            "loss_warning_pct must be negative and not below loss_alert_pct",
        ));
    }
    Ok(())
}

fn validate_iv_rank(config: &dyn ConfigPort) -> Result<(), RiskdeskError> {
    let alert = config.get_double("rules", "iv_rank_alert_below", DEFAULT_IV_RANK_ALERT_BELOW);
    let warning = config.get_double(
        "rules",
        "iv_rank_warning_below",
        DEFAULT_IV_RANK_WARNING_BELOW,
    );
    if !(0.0..=100.0).contains(&alert) {
        return Err(invalid(
            "rules",
            "iv_rank_alert_below",
            "iv_rank_alert_below must be between 0 and 100",
        ));
    }
    if !(0.0..=100.0).contains(&warning) || warning < alert {
        return Err(invalid(
            "rules",
            "iv_rank_warning_below",
            "iv_rank_warning_below must be between iv_rank_alert_below and 100",
        ));
    }
    Ok(())
}

fn validate_root(config: &dyn ConfigPort) -> Result<(), RiskdeskError> {
    let root = config
        .get_string("futures", "root")
        .unwrap_or_else(|| DEFAULT_ROOT.to_string());
    if root.trim().is_empty() {
        return Err(invalid("futures", "root", "root must not be empty"));
    }
    Ok(())
}

fn validate_roll_days(config: &dyn ConfigPort) -> Result<(), RiskdeskError> {
    let value = config.get_int("futures", "roll_days", i64::from(DEFAULT_ROLL_DAYS));
    if !(0..=MAX_ROLL_DAYS).contains(&value) {
        return Err(invalid(
            "futures",
            "roll_days",
            "roll_days must be between 0 and 90",
        ));
    }
    Ok(())
}
