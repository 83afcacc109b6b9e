//! CLI integration tests for command orchestration.
//!
//! Tests cover:
//! - Rule and futures config building from INI text and files
//! - Reference date parsing
//! - Adapter selection by file extension
//! - Text and JSON reports over a mock position port

mod common;

use common::*;
use riskdesk::adapters::file_config_adapter::FileConfigAdapter;
use riskdesk::cli;
use riskdesk::domain::error::RiskdeskError;
use riskdesk::domain::rule::{default_rules, Rule};
use std::collections::HashMap;
use std::io::Write;

fn write_temp_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const CUSTOM_INI: &str = r#"
[rules]
dte_alert_days = 14
dte_warning_days = 21
profit_alert_pct = 75
profit_warning_pct = 60
loss_alert_pct = -300
loss_warning_pct = -250
iv_rank_alert_below = 5
iv_rank_warning_below = 20

[futures]
root = /NQ
roll_days = 10
"#;

mod config_building {
    use super::*;

    #[test]
    fn empty_config_yields_default_catalogue() {
        let rules = cli::build_rules(&FileConfigAdapter::empty()).unwrap();
        assert_eq!(rules, default_rules());
    }

    #[test]
    fn custom_thresholds_change_rule_ids() {
        let config = FileConfigAdapter::from_string(CUSTOM_INI).unwrap();
        let rules = cli::build_rules(&config).unwrap();
        let ids: Vec<String> = rules.iter().map(Rule::id).collect();
        assert_eq!(ids, vec!["14 dte", "75% profit", "3x loss", "20 iv rank"]);
    }

    #[test]
    fn partial_rules_section_keeps_other_defaults() {
        let config = FileConfigAdapter::from_string("[rules]\nprofit_alert_pct = 60\n").unwrap();
        let rules = cli::build_rules(&config).unwrap();
        assert_eq!(
            rules[1],
            Rule::ProfitTarget {
                alert_pct: 60.0,
                warning_pct: 40.0
            }
        );
        assert_eq!(rules[0], default_rules()[0]);
    }

    #[test]
    fn inverted_dte_window_is_rejected() {
        let config =
            FileConfigAdapter::from_string("[rules]\ndte_alert_days = 30\ndte_warning_days = 20\n")
                .unwrap();
        let err = cli::build_rules(&config).unwrap_err();
        assert!(matches!(
            err,
            RiskdeskError::ConfigInvalid { ref key, .. } if key == "dte_warning_days"
        ));
    }

    #[test]
    fn positive_loss_limit_is_rejected() {
        let config = FileConfigAdapter::from_string("[rules]\nloss_alert_pct = 200\n").unwrap();
        assert!(cli::build_rules(&config).is_err());
    }

    #[test]
    fn futures_defaults() {
        let futures = cli::build_futures_config(&FileConfigAdapter::empty()).unwrap();
        assert_eq!(futures.root, "/ES");
        assert_eq!(futures.roll_days, 7);
    }

    #[test]
    fn futures_from_config() {
        let config = FileConfigAdapter::from_string(CUSTOM_INI).unwrap();
        let futures = cli::build_futures_config(&config).unwrap();
        assert_eq!(
            futures,
            cli::FuturesConfig {
                root: "/NQ".to_string(),
                roll_days: 10
            }
        );
    }

    #[test]
    fn negative_roll_days_is_rejected() {
        let config = FileConfigAdapter::from_string("[futures]\nroll_days = -1\n").unwrap();
        assert!(cli::build_futures_config(&config).is_err());
    }

    #[test]
    fn non_numeric_roll_days_is_rejected() {
        let config = FileConfigAdapter::from_string("[futures]\nroll_days = week\n").unwrap();
        let err = cli::build_futures_config(&config).unwrap_err();
        assert!(err.to_string().contains("roll_days"), "{err}");
    }

    #[test]
    fn load_config_from_disk() {
        let file = write_temp_file(".ini", CUSTOM_INI);
        let config = cli::load_config(file.path()).unwrap();
        let rules = cli::build_rules(&config).unwrap();
        assert_eq!(rules[0].id(), "14 dte");
    }

    #[test]
    fn load_config_missing_file_fails() {
        assert!(cli::load_config(std::path::Path::new("/nonexistent/riskdesk.ini")).is_err());
    }
}

mod dates {
    use super::*;

    #[test]
    fn parse_date_accepts_iso() {
        assert_eq!(cli::parse_date("2025-06-16").unwrap(), date(2025, 6, 16));
        assert_eq!(cli::parse_date(" 2025-06-16 ").unwrap(), date(2025, 6, 16));
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        let err = cli::parse_date("16/06/2025").unwrap_err();
        assert!(matches!(err, RiskdeskError::InvalidDate { .. }));
        assert!(err.to_string().contains("16/06/2025"));
    }

    #[test]
    fn resolve_as_of_uses_midnight() {
        assert_eq!(
            cli::resolve_as_of(Some("2025-01-01")).unwrap(),
            midnight(2025, 1, 1)
        );
    }

    #[test]
    fn resolve_as_of_defaults_to_now() {
        let before = chrono::Utc::now().naive_utc();
        let resolved = cli::resolve_as_of(None).unwrap();
        assert!(resolved >= before);
    }
}

mod adapter_selection {
    use super::*;

    const DOC: &str = r#"{"accounts": [{"account_number": "5WT00001", "groups": [
        {"underlying_symbol": "SPY", "expires_at": "2025-01-15",
         "total_credit_received": 100, "current_group_p_l": 10}
    ]}]}"#;

    const LEGS: &str = "\
account_number,nickname,symbol,underlying_symbol,instrument_type,expires_at,quantity,quantity_direction,average_open_price,multiplier,mark
5WT00001,Main,SPY P450,SPY,Equity Option,2025-01-15,1,Short,1.00,100,0.90
";

    #[test]
    fn json_file_uses_document_adapter() {
        let file = write_temp_file(".json", DOC);
        let port = cli::open_positions(file.path()).unwrap();
        let accounts = port.fetch_accounts().unwrap();
        assert_eq!(accounts[0].groups[0].underlying_symbol, "SPY");
    }

    #[test]
    fn csv_file_uses_leg_adapter() {
        let file = write_temp_file(".csv", LEGS);
        let port = cli::open_positions(file.path()).unwrap();
        let accounts = port.fetch_accounts().unwrap();
        assert_eq!(accounts[0].nickname, "Main");
        assert_eq!(accounts[0].groups[0].total_credit_received, 100.0);
        assert_eq!(accounts[0].groups[0].current_group_p_l, 10.0);
    }

    #[test]
    fn upper_case_extension_is_csv() {
        let file = write_temp_file(".CSV", LEGS);
        let port = cli::open_positions(file.path()).unwrap();
        assert_eq!(port.fetch_accounts().unwrap().len(), 1);
    }

    #[test]
    fn csv_content_in_json_file_is_data_error() {
        let file = write_temp_file(".json", LEGS);
        let err = cli::open_positions(file.path()).err().unwrap();
        assert!(matches!(err, RiskdeskError::PositionData { .. }));
    }
}

mod reports {
    use super::*;

    fn sample_port() -> MockPositionPort {
        MockPositionPort::new()
            .with_account(
                "5WT00001",
                "Main",
                vec![
                    make_group("SPY", date(2025, 1, 15), 100.0, 55.0, None, None),
                    make_group("QQQ", date(2025, 6, 20), 100.0, 5.0, Some(5.0), Some(50.0)),
                ],
            )
            .with_account(
                "5WT00002",
                "",
                vec![make_group("/ESH5", date(2025, 3, 21), 500.0, -50.0, None, None)],
            )
    }

    #[test]
    fn text_report_lists_groups_with_rules() {
        let report = cli::evaluate_report(
            &sample_port(),
            &default_rules(),
            None,
            midnight(2025, 1, 1),
            false,
        )
        .unwrap();

        assert!(report.contains("Account 5WT00001 (Main)"), "{report}");
        assert!(report.contains("Account 5WT00002\n"), "{report}");
        let spy = report.lines().find(|l| l.contains("SPY")).unwrap();
        assert!(spy.contains("2025-01-15"));
        assert!(spy.contains("alert"));
        assert!(spy.contains("21 dte (alert), 50% profit (alert)"));
        let qqq = report.lines().find(|l| l.contains("QQQ")).unwrap();
        assert!(qqq.contains(" - "), "{qqq}");
    }

    #[test]
    fn iv_ranks_are_applied_before_evaluation() {
        let mut ranks = HashMap::new();
        ranks.insert("/ES".to_string(), 8.0);
        let report = cli::evaluate_report(
            &sample_port(),
            &default_rules(),
            Some(&ranks),
            midnight(2025, 1, 1),
            false,
        )
        .unwrap();
        let es = report.lines().find(|l| l.contains("/ESH5")).unwrap();
        assert!(es.contains("14 iv rank (alert)"), "{es}");
        // QQQ has no entry, so its rank is cleared
        let qqq = report.lines().find(|l| l.contains("QQQ")).unwrap();
        assert!(!qqq.contains("iv rank"));
    }

    #[test]
    fn json_report_annotates_groups() {
        let report = cli::evaluate_report(
            &sample_port(),
            &default_rules(),
            None,
            midnight(2025, 1, 1),
            true,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&report).unwrap();
        let groups = &value[0]["groups"];
        assert_eq!(value[0]["account_number"], "5WT00001");
        assert_eq!(groups[0]["underlying_symbol"], "SPY");
        assert_eq!(groups[0]["expires_at"], "2025-01-15");
        assert_eq!(groups[0]["rules"][0]["id"], "21 dte");
        assert_eq!(groups[0]["rules"][0]["level"], "alert");
        assert_eq!(groups[1]["rules"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn document_with_opaque_legs_is_evaluated() {
        let doc = r#"{"accounts": [{"account_number": "5WT00001", "groups": [
            {"underlying_symbol": "SPY", "expires_at": "2025-01-15",
             "total_credit_received": 100, "group_approximate_p_l": 55,
             "current_group_p_l": 10,
             "positions": [{"symbol": "SPY P450", "some-field": 1}]}
        ]}]}"#;
        let file = write_temp_file(".json", doc);
        let port = cli::open_positions(file.path()).unwrap();
        let report = cli::evaluate_report(
            port.as_ref(),
            &default_rules(),
            None,
            midnight(2025, 1, 1),
            false,
        )
        .unwrap();
        assert!(
            report.contains("21 dte (alert), 50% profit (alert)"),
            "{report}"
        );
    }

    #[test]
    fn port_errors_propagate() {
        let port = MockPositionPort::new().with_error("broker unavailable");
        let err = cli::evaluate_report(&port, &default_rules(), None, midnight(2025, 1, 1), false)
            .unwrap_err();
        assert!(err.to_string().contains("broker unavailable"));
    }

    #[test]
    fn empty_port_renders_nothing() {
        let report = cli::evaluate_report(
            &MockPositionPort::new(),
            &default_rules(),
            None,
            midnight(2025, 1, 1),
            false,
        )
        .unwrap();
        assert!(report.is_empty());
    }
}
