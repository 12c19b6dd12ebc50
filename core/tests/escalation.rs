//! Orchestrator tests: rule selection, ordering, failure isolation, and the
//! outcome report.

mod common;

use chrono::Duration;
use common::{complaint, now, Harness};
use escalation_core::{
    case::Complaint,
    types::{BankActionStatus, Channel, NotificationStatus},
    AlertKind, CancelToken, EscalationError,
};

/// The reference scenario: a large, fresh loss with an accused account.
#[test]
fn cuttack_scenario_escalates_everything_but_pattern() {
    let h = Harness::new();
    let c = complaint("CMP-CTC-001")
        .with_transaction("TXN-9911", now() - Duration::minutes(30))
        .with_accused("XYZ123", None);
    let c = Complaint {
        amount_lost: 150_000.0,
        ..c
    };
    h.file(&c);

    let report = h.engine.trigger_alerts("CMP-CTC-001").unwrap();

    assert_eq!(
        report.attempted(),
        vec![
            AlertKind::GoldenHour,
            AlertKind::HighAmount,
            AlertKind::BankFreeze,
            AlertKind::I4cSync,
            AlertKind::PoliceStation,
            AlertKind::DistrictCyberCell,
        ]
    );
    assert!(report.as_map().values().all(|ok| *ok), "{report:?}");

    let status = h.engine.alert_status("CMP-CTC-001").unwrap();
    assert!(status.is_funds_frozen);
    assert!(!status.is_priority);

    let actions = h.store.bank_actions_for("CMP-CTC-001").unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].status, BankActionStatus::Pending);
    assert_eq!(actions[0].account_number, "XYZ123");
    assert_eq!(actions[0].amount, 150_000.0);
}

/// The map holds exactly the rules whose predicates held, keyed by name.
#[test]
fn outcome_map_contains_only_attempted_rules() {
    let h = Harness::new();
    h.file(&complaint("CMP-SMALL"));

    let report = h.engine.trigger_alerts("CMP-SMALL").unwrap();
    let keys: Vec<&str> = report.as_map().keys().copied().collect();
    assert_eq!(keys, vec!["i4c_sync", "police_station", "district_cyber_cell"]);
    assert!(report.get(AlertKind::GoldenHour).is_none());
    assert!(report.get(AlertKind::PatternAlert).is_none());
}

#[test]
fn unknown_complaint_is_not_found() {
    let h = Harness::new();
    let err = h.engine.trigger_alerts("CMP-MISSING").unwrap_err();
    assert!(
        matches!(err, EscalationError::NotFound { ref complaint_id } if complaint_id == "CMP-MISSING"),
        "unexpected error: {err}"
    );
}

/// A dead email channel fails the email-only rules but nothing else, and
/// every attempted rule is still reported.
#[test]
fn email_outage_is_isolated_per_rule() {
    let h = Harness::new();
    let c = complaint("CMP-OUTAGE")
        .with_transaction("TXN-1", now() - Duration::minutes(10));
    let c = Complaint {
        amount_lost: 250_000.0,
        ..c
    };
    h.file(&c);
    h.transport.set_fail_email(true);

    let report = h.engine.trigger_alerts("CMP-OUTAGE").unwrap();
    let map = report.as_map();

    assert_eq!(map.len(), 5);
    // Best-effort delivery: the audit entry decides golden hour.
    assert!(map["golden_hour"]);
    assert!(map["i4c_sync"]);
    assert!(!map["high_amount"]);
    assert!(!map["police_station"]);
    assert!(!map["district_cyber_cell"]);

    let golden = report.get(AlertKind::GoldenHour).unwrap();
    assert!(golden.detail.as_deref().unwrap_or("").contains("EMAIL"));
    assert_eq!(h.transport.sms().len(), 1, "golden-hour SMS still goes out");
}

#[test]
fn summary_counts_successes_and_failures() {
    let h = Harness::new();
    h.file(&complaint("CMP-SUM"));
    h.transport.set_fail_email(true);

    let summary = h.engine.trigger_alerts("CMP-SUM").unwrap().summary();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.failed, 2);
}

/// A cancelled request starts no rules.
#[test]
fn cancelled_request_starts_no_rules() {
    let h = Harness::new();
    h.file(&complaint("CMP-CANCEL"));
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = h.engine.trigger_alerts_until("CMP-CANCEL", &cancel).unwrap();
    assert!(report.cancelled);
    assert!(report.outcomes.is_empty());
    assert!(h.transport.emails().is_empty());
}

/// Every send is persisted as a notification row per recipient.
#[test]
fn deliveries_are_recorded_as_notifications() {
    let h = Harness::new();
    h.file(&complaint("CMP-NOTIF"));

    h.engine.trigger_alerts("CMP-NOTIF").unwrap();

    let rows = h.store.notifications_for("CMP-NOTIF").unwrap();
    let recipients: Vec<&str> = rows.iter().map(|n| n.recipient.as_str()).collect();
    assert!(recipients.contains(&"ps.cuttack@odisha.gov.in"));
    assert!(recipients.contains(&"cybercell.cuttack@police.gov.in"));
    assert!(recipients.contains(&"cybercell.odisha@police.gov.in"));
    assert!(rows
        .iter()
        .all(|n| n.channel == Channel::Email && n.status == NotificationStatus::Sent));
}

#[test]
fn national_sync_writes_an_audit_entry() {
    let h = Harness::new();
    h.file(&complaint("CMP-I4C"));

    h.engine.trigger_alerts("CMP-I4C").unwrap();

    let activities = h.store.activities_for("CMP-I4C").unwrap();
    assert!(activities
        .iter()
        .any(|a| a.description == "Case synced with I4C/CFCFRMS"));
}

#[test]
fn manual_alert_reaches_named_authority() {
    let h = Harness::new();
    h.file(&complaint("CMP-MANUAL"));

    let delivery = h
        .engine
        .send_manual_alert("CMP-MANUAL", "dgp_office", "Please review this case")
        .unwrap();
    assert!(delivery.delivered);
    assert_eq!(delivery.recipients, vec!["dgp.odisha@police.gov.in".to_string()]);
    assert_eq!(h.transport.emails_with_subject("Manual Alert - CMP-MANUAL").len(), 1);

    let err = h
        .engine
        .send_manual_alert("CMP-MANUAL", "MAYOR", "hello")
        .unwrap_err();
    assert!(matches!(err, EscalationError::UnknownAuthority { .. }));
}

/// Single-rule triggers skip the predicate, but a direct freeze still needs
/// the accused account and bank.
#[test]
fn single_rule_trigger() {
    let h = Harness::new();
    h.file(&complaint("CMP-SINGLE").with_accused("ACC-77", None));

    let outcome = h
        .engine
        .trigger_single("CMP-SINGLE", AlertKind::GoldenHour)
        .unwrap();
    assert!(outcome.success);
    assert_eq!(h.transport.emails_with_subject("GOLDEN HOUR").len(), 1);

    let err = h
        .engine
        .trigger_single("CMP-SINGLE", AlertKind::BankFreeze)
        .unwrap_err();
    assert!(matches!(err, EscalationError::MissingAccusedAccount { .. }));
}
