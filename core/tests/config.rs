//! Configuration loading, directories, and mailbox derivation.

use escalation_core::{
    config::{
        Authority, EscalationConfig, HIGH_AMOUNT_THRESHOLD, MAX_GOLDEN_HOUR_MINUTES,
        MAX_PATTERN_WINDOW_DAYS,
    },
    types::mask_account,
    EscalationError,
};
use std::io::Write;

#[test]
fn partial_json_keeps_defaults() {
    let config = EscalationConfig::from_json(
        r#"{ "thresholds": { "high_amount": 50000.0 }, "transport": { "timeout_ms": 2000 } }"#,
    )
    .unwrap();
    assert_eq!(config.thresholds.high_amount, 50_000.0);
    assert_eq!(config.thresholds.golden_hour_minutes, 60);
    assert_eq!(config.thresholds.pattern_window_days, 7);
    assert_eq!(config.thresholds.pattern_min_prior, 2);
    assert_eq!(config.transport.timeout().as_millis(), 2000);
    assert_eq!(
        config.authorities.cyber_cell.email,
        "cybercell.odisha@police.gov.in"
    );
}

#[test]
fn defaults_match_constants() {
    let config = EscalationConfig::default();
    assert_eq!(config.thresholds.high_amount, HIGH_AMOUNT_THRESHOLD);
    assert_eq!(config.transport.timeout_ms, 5_000);
    assert_eq!(config.authorities.cyber_cell.sms_destination(), "9437001930");
}

#[test]
fn invalid_values_are_rejected() {
    for json in [
        r#"{ "transport": { "timeout_ms": 0 } }"#,
        r#"{ "thresholds": { "golden_hour_minutes": 0 } }"#,
        r#"{ "thresholds": { "high_amount": -1.0 } }"#,
        r#"{ "thresholds": { "pattern_window_days": 9000000000000 } }"#,
        r#"{ "thresholds": { "pattern_window_days": 367 } }"#,
        r#"{ "thresholds": { "golden_hour_minutes": 9223372036854775807 } }"#,
        r#"{ "thresholds": { "golden_hour_minutes": 1441 } }"#,
        r#"{ "thresholds": { "pattern_min_prior": 0 } }"#,
    ] {
        let err = EscalationConfig::from_json(json).unwrap_err();
        assert!(matches!(err, EscalationError::Config(_)), "{json}: {err}");
    }
}

#[test]
fn bounds_are_inclusive() {
    let config = EscalationConfig::from_json(
        r#"{ "thresholds": { "golden_hour_minutes": 1440, "pattern_window_days": 366, "pattern_min_prior": 1 } }"#,
    )
    .unwrap();
    assert_eq!(config.thresholds.golden_hour_minutes, MAX_GOLDEN_HOUR_MINUTES);
    assert_eq!(config.thresholds.pattern_window_days, MAX_PATTERN_WINDOW_DAYS);
}

#[test]
fn load_reads_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{ "banks": {{ "nodal_officers": {{ "UTKAL GRAMEEN BANK": "nodal@ugb.in" }} }} }}"#
    )
    .unwrap();

    let config = EscalationConfig::load(file.path().to_str().unwrap()).unwrap();
    assert_eq!(
        config.banks.nodal_email(Some("Utkal Grameen Bank"), "fallback@rbi.org.in"),
        "nodal@ugb.in"
    );
    // Replacing the directory drops the built-in banks.
    assert_eq!(
        config.banks.nodal_email(Some("HDFC Bank"), "fallback@rbi.org.in"),
        "fallback@rbi.org.in"
    );
}

#[test]
fn missing_file_is_a_config_error() {
    let err = EscalationConfig::load("/nonexistent/escalation.json").unwrap_err();
    assert!(matches!(err, EscalationError::Config(_)));
}

#[test]
fn authority_names_parse_case_insensitively() {
    assert_eq!(Authority::parse("cyber_cell").unwrap(), Authority::CyberCell);
    assert_eq!(Authority::parse("I4C_NATIONAL").unwrap(), Authority::National);
    assert_eq!(Authority::parse("Dgp_Office").unwrap(), Authority::SeniorOffice);
    assert_eq!(Authority::parse("RBI_NODAL").unwrap(), Authority::Regulator);
    assert!(matches!(
        Authority::parse("COLLECTOR"),
        Err(EscalationError::UnknownAuthority { .. })
    ));
}

#[test]
fn district_mailboxes() {
    let routing = EscalationConfig::default().routing;
    assert_eq!(
        routing.police_station_email("Cuttack").as_deref(),
        Some("ps.cuttack@odisha.gov.in")
    );
    assert_eq!(
        routing.district_cyber_cell_email("Mayurbhanj").as_deref(),
        Some("cybercell.mayurbhanj@police.gov.in")
    );
    assert_eq!(
        routing.police_station_email("  Nabarangpur  Town ").as_deref(),
        Some("ps.nabarangpur_town@odisha.gov.in")
    );
    assert_eq!(routing.police_station_email("   "), None);
    assert_eq!(
        routing.case_url("CMP-1"),
        "https://cyberfraud.odisha.gov.in/case/CMP-1"
    );
}

#[test]
fn bank_lookup_ignores_case_and_padding() {
    let banks = EscalationConfig::default().banks;
    assert_eq!(
        banks.nodal_email(Some(" hdfc bank "), "x"),
        "cybersecurity@hdfcbank.com"
    );
    assert_eq!(banks.nodal_email(None, "rbi"), "rbi");
}

#[test]
fn account_masking_keeps_last_four() {
    assert_eq!(mask_account("XYZ123"), "Z123****");
    assert_eq!(mask_account("123"), "123****");
}
