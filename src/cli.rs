//! CLI definition and dispatch.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{read_iv_ranks, CsvPositionsAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_positions_adapter::JsonPositionsAdapter;
use crate::domain::config_validation::{
    validate_config, validate_futures_config, validate_rules_config,
};
use crate::domain::contract::{current_contract, DEFAULT_ROLL_DAYS, DEFAULT_ROOT};
use crate::domain::error::RiskdeskError;
use crate::domain::grouping::apply_iv_ranks;
use crate::domain::position::AccountPositions;
use crate::domain::rule::*;
use crate::domain::rule_eval::{annotate, percent_captured, AnnotatedGroup};
use crate::ports::config_port::ConfigPort;
use crate::ports::position_port::PositionPort;

#[derive(Parser, Debug)]
#[command(name = "riskdesk", about = "Position risk rules and futures contract roll")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate risk rules for every position group
    Evaluate {
        /// Positions file (.json document or .csv legs)
        #[arg(short, long)]
        positions: PathBuf,
        /// CSV of `symbol,iv_rank` keyed by root symbol
        #[arg(long)]
        iv_ranks: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Reference date (YYYY-MM-DD); defaults to now
        #[arg(long)]
        as_of: Option<String>,
        /// Emit annotated groups as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the current front-month futures contract
    Contract {
        #[arg(long)]
        root: Option<String>,
        #[arg(long)]
        as_of: Option<String>,
        #[arg(long)]
        roll_days: Option<u32>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the effective rule catalogue
    Rules {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Evaluate {
            positions,
            iv_ranks,
            config,
            as_of,
            json,
        } => run_evaluate(
            &positions,
            iv_ranks.as_deref(),
            config.as_deref(),
            as_of.as_deref(),
            json,
        ),
        Command::Contract {
            root,
            as_of,
            roll_days,
            config,
        } => run_contract(root.as_deref(), as_of.as_deref(), roll_days, config.as_deref()),
        Command::Rules { config } => run_rules(config.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: RiskdeskError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(&err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    tracing::info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path).map_err(|e| {
        fail(RiskdeskError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}

fn load_optional_config(path: Option<&Path>) -> Result<FileConfigAdapter, ExitCode> {
    match path {
        Some(p) => load_config(p),
        None => Ok(FileConfigAdapter::empty()),
    }
}

/// Build the rule catalogue from `[rules]`, in evaluation order.
pub fn build_rules(config: &dyn ConfigPort) -> Result<Vec<Rule>, RiskdeskError> {
    validate_rules_config(config)?;
    Ok(vec![
        Rule::DaysToExpiration {
            alert_days: config.get_int("rules", "dte_alert_days", DEFAULT_DTE_ALERT_DAYS),
            warning_days: config.get_int("rules", "dte_warning_days", DEFAULT_DTE_WARNING_DAYS),
        },
        Rule::ProfitTarget {
            alert_pct: config.get_double("rules", "profit_alert_pct", DEFAULT_PROFIT_ALERT_PCT),
            warning_pct: config.get_double(
                "rules",
                "profit_warning_pct",
                DEFAULT_PROFIT_WARNING_PCT,
            ),
        },
        Rule::LossLimit {
            alert_pct: config.get_double("rules", "loss_alert_pct", DEFAULT_LOSS_ALERT_PCT),
            warning_pct: config.get_double("rules", "loss_warning_pct", DEFAULT_LOSS_WARNING_PCT),
        },
        Rule::IvRankFloor {
            alert_below: config.get_double(
                "rules",
                "iv_rank_alert_below",
                DEFAULT_IV_RANK_ALERT_BELOW,
            ),
            warning_below: config.get_double(
                "rules",
                "iv_rank_warning_below",
                DEFAULT_IV_RANK_WARNING_BELOW,
            ),
        },
    ])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuturesConfig {
    pub root: String,
    pub roll_days: u32,
}

pub fn build_futures_config(config: &dyn ConfigPort) -> Result<FuturesConfig, RiskdeskError> {
    validate_futures_config(config)?;
    let root = config
        .get_string("futures", "root")
        .map(|r| r.trim().to_string())
        .unwrap_or_else(|| DEFAULT_ROOT.to_string());
    let roll_days = config.get_int("futures", "roll_days", i64::from(DEFAULT_ROLL_DAYS));
    Ok(FuturesConfig {
        root,
        roll_days: u32::try_from(roll_days).unwrap_or(DEFAULT_ROLL_DAYS),
    })
}

pub fn parse_date(value: &str) -> Result<NaiveDate, RiskdeskError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| RiskdeskError::InvalidDate {
        value: value.to_string(),
    })
}

/// Reference instant for rule evaluation: midnight of the given date, or the
/// current UTC time.
pub fn resolve_as_of(value: Option<&str>) -> Result<NaiveDateTime, RiskdeskError> {
    match value {
        Some(v) => Ok(parse_date(v)?.and_time(NaiveTime::MIN)),
        None => Ok(Utc::now().naive_utc()),
    }
}

/// Pick an adapter for `path` by extension: `.csv` is a leg file, anything
/// else a JSON positions document.
pub fn open_positions(path: &Path) -> Result<Box<dyn PositionPort>, RiskdeskError> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(Box::new(CsvPositionsAdapter::new(path.to_path_buf())))
    } else {
        Ok(Box::new(JsonPositionsAdapter::from_file(path)?))
    }
}

#[derive(Debug, Serialize)]
pub struct AnnotatedAccount<'a> {
    pub account_number: &'a str,
    pub nickname: &'a str,
    pub groups: Vec<AnnotatedGroup<'a>>,
}

pub fn annotate_accounts<'a>(
    accounts: &'a [AccountPositions],
    rules: &[Rule],
    as_of: NaiveDateTime,
) -> Vec<AnnotatedAccount<'a>> {
    accounts
        .iter()
        .map(|account| AnnotatedAccount {
            account_number: &account.account_number,
            nickname: &account.nickname,
            groups: account
                .groups
                .iter()
                .map(|g| annotate(g, rules, as_of))
                .collect(),
        })
        .collect()
}

pub fn render_text(accounts: &[AnnotatedAccount<'_>]) -> String {
    let mut out = String::new();
    for account in accounts {
        if account.nickname.is_empty() {
            out.push_str(&format!("Account {}\n", account.account_number));
        } else {
            out.push_str(&format!(
                "Account {} ({})\n",
                account.account_number, account.nickname
            ));
        }
        for annotated in &account.groups {
            let group = annotated.group;
            let severity = annotated
                .severity()
                .map_or_else(|| "-".to_string(), |s| s.to_string());
            let triggered: Vec<String> = annotated
                .rules
                .iter()
                .map(|r| format!("{} ({})", r.id, r.level))
                .collect();
            out.push_str(&format!(
                "  {:<8} {} {:>10.2} {:>10.2} {:>5.0}%  {:<7} {}\n",
                group.underlying_symbol,
                group.expires_at,
                group.total_credit_received,
                group.profit_loss(),
                percent_captured(group),
                severity,
                triggered.join(", ")
            ));
        }
    }
    out
}

pub fn render_json(accounts: &[AnnotatedAccount<'_>]) -> Result<String, RiskdeskError> {
    Ok(serde_json::to_string_pretty(accounts)?)
}

/// Load, annotate and render every group from `port`.
pub fn evaluate_report(
    port: &dyn PositionPort,
    rules: &[Rule],
    iv_ranks: Option<&HashMap<String, f64>>,
    as_of: NaiveDateTime,
    json: bool,
) -> Result<String, RiskdeskError> {
    let mut accounts = port.fetch_accounts()?;
    if let Some(ranks) = iv_ranks {
        for account in &mut accounts {
            apply_iv_ranks(&mut account.groups, ranks);
        }
    }

    let annotated = annotate_accounts(&accounts, rules, as_of);

    let mut alerts = 0;
    let mut warnings = 0;
    for group in annotated.iter().flat_map(|a| &a.groups) {
        match group.severity() {
            Some(Severity::Alert) => alerts += 1,
            Some(Severity::Warning) => warnings += 1,
            None => {}
        }
    }
    tracing::info!(
        accounts = annotated.len(),
        alerts,
        warnings,
        "evaluated position groups as of {as_of}"
    );

    if json {
        render_json(&annotated)
    } else {
        Ok(render_text(&annotated))
    }
}

fn run_evaluate(
    positions: &Path,
    iv_ranks: Option<&Path>,
    config_path: Option<&Path>,
    as_of: Option<&str>,
    json: bool,
) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let rules = match build_rules(&config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    let as_of = match resolve_as_of(as_of) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };

    tracing::info!("loading positions from {}", positions.display());
    let port = match open_positions(positions) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let ranks = match iv_ranks.map(read_iv_ranks).transpose() {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    match evaluate_report(port.as_ref(), &rules, ranks.as_ref(), as_of, json) {
        Ok(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_contract(
    root: Option<&str>,
    as_of: Option<&str>,
    roll_days: Option<u32>,
    config_path: Option<&Path>,
) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let futures = match build_futures_config(&config) {
        Ok(f) => f,
        Err(e) => return fail(e),
    };
    let as_of = match as_of {
        Some(v) => match parse_date(v) {
            Ok(d) => d,
            Err(e) => return fail(e),
        },
        None => Utc::now().date_naive(),
    };

    let root = root.unwrap_or(futures.root.as_str());
    let roll_days = roll_days.unwrap_or(futures.roll_days);
    let label = current_contract(root, as_of, roll_days);
    if let Some(expiry) = label.expiration() {
        tracing::debug!(%expiry, roll_days, "resolved {label} as of {as_of}");
    }
    println!("{label}");
    ExitCode::SUCCESS
}

fn run_rules(config_path: Option<&Path>) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    match build_rules(&config) {
        Ok(rules) => {
            for (i, rule) in rules.iter().enumerate() {
                println!("{}. {}", i + 1, rule);
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_config(&config) {
        return fail(e);
    }
    eprintln!("Configuration is valid.");
    ExitCode::SUCCESS
}
