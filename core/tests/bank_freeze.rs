//! Freeze requests: idempotence under retries and concurrency, release on a
//! rejected send, retention on a timed-out one, and bank responses.

mod common;

use chrono::Duration;
use common::{complaint, now, Harness};
use escalation_core::{
    clock::FixedClock,
    config::EscalationConfig,
    store::{CaseStore, NewBankAction},
    transport::RecordingTransport,
    types::{ActivityKind, BankActionKind, BankActionStatus},
    AlertKind, EscalationEngine, EscalationError,
};
use std::sync::Arc;
use std::thread;

const FREEZE_SUBJECT: &str = "Account Freeze Request";

#[test]
fn no_accused_account_means_no_freeze() {
    let h = Harness::new();
    h.file(&complaint("CMP-NOACC"));

    let report = h.engine.trigger_alerts("CMP-NOACC").unwrap();
    assert!(report.get(AlertKind::BankFreeze).is_none());
    assert!(h.store.bank_actions_for("CMP-NOACC").unwrap().is_empty());
}

#[test]
fn blank_accused_account_means_no_freeze() {
    let h = Harness::new();
    h.file(&complaint("CMP-BLANK").with_accused("", Some("HDFC Bank")));

    let report = h.engine.trigger_alerts("CMP-BLANK").unwrap();
    assert!(report.get(AlertKind::BankFreeze).is_none());
}

#[test]
fn repeated_trigger_files_one_freeze() {
    let h = Harness::new();
    h.file(&complaint("CMP-DUP").with_accused("ACC-1", Some("ICICI Bank")));

    let first = h.engine.trigger_alerts("CMP-DUP").unwrap();
    let second = h.engine.trigger_alerts("CMP-DUP").unwrap();

    assert_eq!(first.succeeded(AlertKind::BankFreeze), Some(true));
    let again = second.get(AlertKind::BankFreeze).unwrap();
    assert!(again.success);
    assert!(again.detail.as_deref().unwrap().contains("already requested"));

    assert_eq!(h.store.bank_actions_for("CMP-DUP").unwrap().len(), 1);
    assert_eq!(h.transport.emails_with_subject(FREEZE_SUBJECT).len(), 1);
}

/// Many threads escalating the same complaint through one shared engine.
#[test]
fn concurrent_triggers_on_shared_engine_file_one_freeze() {
    let h = Harness::new();
    h.file(&complaint("CMP-RACE").with_accused("ACC-RACE", Some("Axis Bank")));

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                let report = h.engine.trigger_alerts("CMP-RACE").unwrap();
                assert_eq!(report.succeeded(AlertKind::BankFreeze), Some(true));
            });
        }
    });

    let actions = h.store.bank_actions_for("CMP-RACE").unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].status, BankActionStatus::Pending);
    assert_eq!(h.transport.emails_with_subject(FREEZE_SUBJECT).len(), 1);
    assert!(h.engine.alert_status("CMP-RACE").unwrap().is_funds_frozen);
}

/// Separate processes share only the database file; each thread here opens
/// its own connection to it.
#[test]
fn concurrent_triggers_on_separate_connections_file_one_freeze() {
    common::init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cases.db");
    let path = path.to_str().unwrap().to_string();

    let seed = CaseStore::open(&path).unwrap();
    seed.migrate().unwrap();
    seed.insert_complaint(&complaint("CMP-MULTI").with_accused("ACC-MULTI", Some("PNB")))
        .unwrap();

    let transport = Arc::new(RecordingTransport::new());
    thread::scope(|s| {
        for _ in 0..4 {
            let path = path.clone();
            let transport = Arc::clone(&transport);
            s.spawn(move || {
                let store = Arc::new(CaseStore::open(&path).unwrap());
                let engine = EscalationEngine::new(
                    store,
                    transport,
                    Arc::new(FixedClock::new(now())),
                    EscalationConfig::default(),
                );
                engine.trigger_alerts("CMP-MULTI").unwrap();
            });
        }
    });

    assert_eq!(seed.bank_actions_for("CMP-MULTI").unwrap().len(), 1);
    let freeze_emails = transport.emails_with_subject(FREEZE_SUBJECT);
    assert_eq!(freeze_emails.len(), 1);
    assert!(freeze_emails[0].to.contains("cyberfraud@pnb.co.in"));
}

/// A freeze request that never reached the bank does not leave the complaint
/// marked frozen, so the next escalation files it again.
#[test]
fn undelivered_freeze_is_released_and_retried() {
    let h = Harness::new();
    h.file(&complaint("CMP-RETRY").with_accused("ACC-R", Some("HDFC Bank")));
    h.transport.set_fail_email(true);

    let report = h.engine.trigger_alerts("CMP-RETRY").unwrap();
    let outcome = report.get(AlertKind::BankFreeze).unwrap();
    assert!(!outcome.success);
    assert!(outcome
        .detail
        .as_deref()
        .unwrap()
        .contains("cybersecurity@hdfcbank.com"));
    assert!(!h.engine.alert_status("CMP-RETRY").unwrap().is_funds_frozen);

    let actions = h.store.bank_actions_for("CMP-RETRY").unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].status, BankActionStatus::Failed);
    // No SMS to the victim for a request that was never sent.
    assert!(h.transport.sms().is_empty());
    let activities = h.store.activities_for("CMP-RETRY").unwrap();
    assert!(activities.iter().any(|a| a.kind == ActivityKind::BankNotified
        && a.description == "Freeze request to HDFC Bank not delivered"));

    h.transport.set_fail_email(false);
    let report = h.engine.trigger_alerts("CMP-RETRY").unwrap();
    assert_eq!(report.succeeded(AlertKind::BankFreeze), Some(true));
    assert!(h.engine.alert_status("CMP-RETRY").unwrap().is_funds_frozen);

    let actions = h.store.bank_actions_for("CMP-RETRY").unwrap();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[1].status, BankActionStatus::Pending);
}

/// A send that overran the timeout may still reach the bank, so the claim is
/// kept and a later escalation does not send a second request.
#[test]
fn timed_out_freeze_is_not_sent_twice() {
    let mut config = EscalationConfig::default();
    config.transport.timeout_ms = 50;
    let h = Harness::with_config(config);
    h.file(&complaint("CMP-SLOW").with_accused("ACC-SLOW", Some("HDFC Bank")));
    h.transport.set_latency(Some(std::time::Duration::from_millis(150)));

    let report = h.engine.trigger_alerts("CMP-SLOW").unwrap();
    assert_eq!(report.succeeded(AlertKind::BankFreeze), Some(false));
    assert!(h.engine.alert_status("CMP-SLOW").unwrap().is_funds_frozen);

    // Let the worker finish the late send.
    thread::sleep(std::time::Duration::from_millis(300));
    h.transport.set_latency(None);

    let report = h.engine.trigger_alerts("CMP-SLOW").unwrap();
    let again = report.get(AlertKind::BankFreeze).unwrap();
    assert!(again.success);
    assert!(again.detail.as_deref().unwrap().contains("already requested"));

    assert_eq!(h.transport.emails_with_subject(FREEZE_SUBJECT).len(), 1);
    let actions = h.store.bank_actions_for("CMP-SLOW").unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].status, BankActionStatus::Pending);
    assert!(actions[0]
        .remarks
        .as_deref()
        .unwrap()
        .starts_with("Freeze request delivery unconfirmed"));

    let activities = h.store.activities_for("CMP-SLOW").unwrap();
    assert!(activities.iter().any(|a| a.kind == ActivityKind::BankNotified
        && a.description == "Freeze request to HDFC Bank unconfirmed"));
}

#[test]
fn freeze_request_payload_and_victim_update() {
    let h = Harness::new();
    h.file(
        &complaint("CMP-PAYLOAD")
            .with_transaction("TXN-P", now() - Duration::minutes(15))
            .with_accused("ACC-PAY-9", Some("State Bank of India"))
            .with_fir("FIR-77"),
    );

    h.engine.trigger_alerts("CMP-PAYLOAD").unwrap();

    let emails = h.transport.emails_with_subject(FREEZE_SUBJECT);
    assert_eq!(emails.len(), 1);
    let email = &emails[0];
    assert!(email.to.contains("cyberfraud.nodal@sbi.co.in"));
    assert_eq!(email.subject, "URGENT: Account Freeze Request - CMP-PAYLOAD");

    let payload: serde_json::Value = serde_json::from_str(&email.body).unwrap();
    assert_eq!(payload["account_number"], "ACC-PAY-9");
    assert_eq!(payload["request_type"], "FREEZE");
    assert_eq!(payload["priority"], "HIGH");
    assert_eq!(payload["legal_basis"], "FIR-77");
    assert_eq!(payload["requesting_authority"], "Odisha Police Cyber Cell");

    let action = &h.store.bank_actions_for("CMP-PAYLOAD").unwrap()[0];
    assert_eq!(payload["request_id"], action.request_id.as_str());

    assert!(h
        .transport
        .sms()
        .iter()
        .any(|s| s.to == "+91-9000000001" && s.body.contains("State Bank of India")));
}

#[test]
fn unknown_bank_falls_back_to_regulator() {
    let h = Harness::new();
    h.file(&complaint("CMP-COOP").with_accused("ACC-C", Some("Utkal Cooperative Bank")));

    h.engine.trigger_alerts("CMP-COOP").unwrap();

    let emails = h.transport.emails_with_subject(FREEZE_SUBJECT);
    assert!(emails[0].to.contains("cybersecurity@rbi.org.in"));

    let payload: serde_json::Value = serde_json::from_str(&emails[0].body).unwrap();
    assert_eq!(payload["priority"], "NORMAL");
    assert_eq!(payload["legal_basis"], "Under Investigation");
}

#[test]
fn bank_confirms_freeze() {
    let h = Harness::new();
    h.file(&complaint("CMP-OK").with_accused("ACC-OK", Some("HDFC Bank")));
    h.engine.trigger_alerts("CMP-OK").unwrap();
    let action_id = h.store.bank_actions_for("CMP-OK").unwrap()[0].id;

    let action = h
        .engine
        .record_bank_response(action_id, BankActionStatus::Success, Some("HDFC-REF-1"))
        .unwrap();
    assert_eq!(action.status, BankActionStatus::Success);
    assert_eq!(action.bank_reference.as_deref(), Some("HDFC-REF-1"));
    assert!(h.engine.alert_status("CMP-OK").unwrap().is_funds_frozen);

    let activities = h.store.activities_for("CMP-OK").unwrap();
    assert!(activities
        .iter()
        .any(|a| a.kind == ActivityKind::FundsFrozen));

    let err = h
        .engine
        .record_bank_response(action_id, BankActionStatus::Failed, None)
        .unwrap_err();
    assert!(matches!(err, EscalationError::BankActionResolved { .. }));
}

#[test]
fn bank_rejects_freeze() {
    let h = Harness::new();
    h.file(&complaint("CMP-REJ").with_accused("ACC-REJ", Some("HDFC Bank")));
    h.engine.trigger_alerts("CMP-REJ").unwrap();
    let action_id = h.store.bank_actions_for("CMP-REJ").unwrap()[0].id;

    h.engine
        .record_bank_response(action_id, BankActionStatus::Failed, None)
        .unwrap();
    assert!(!h.engine.alert_status("CMP-REJ").unwrap().is_funds_frozen);

    // The rejected action is superseded; the next escalation files anew.
    h.engine.trigger_alerts("CMP-REJ").unwrap();
    assert_eq!(h.store.bank_actions_for("CMP-REJ").unwrap().len(), 2);
}

#[test]
fn bank_response_must_resolve_the_action() {
    let h = Harness::new();
    let err = h
        .engine
        .record_bank_response(999, BankActionStatus::Pending, None)
        .unwrap_err();
    assert!(matches!(err, EscalationError::InvalidBankResponse { .. }));

    let err = h
        .engine
        .record_bank_response(999, BankActionStatus::Success, None)
        .unwrap_err();
    assert!(matches!(err, EscalationError::BankActionNotFound { id: 999 }));
}

/// Only freeze confirmations are logged as FUNDS_FROZEN.
#[test]
fn confirming_a_non_freeze_action_logs_nothing() {
    let h = Harness::new();
    h.file(&complaint("CMP-RECOV").with_accused("ACC-H", Some("PNB")));
    let action_id = h
        .store
        .create_bank_action(&NewBankAction {
            complaint_id: "CMP-RECOV",
            request_id: "REQ-RECOV-1",
            bank_name: Some("PNB"),
            account_number: "ACC-H",
            kind: BankActionKind::Recovery,
            amount: 5_000.0,
            at: now(),
        })
        .unwrap();

    h.engine
        .record_bank_response(action_id, BankActionStatus::Success, Some("PNB-9"))
        .unwrap();

    assert!(h.store.activities_for("CMP-RECOV").unwrap().is_empty());
    assert!(!h.engine.alert_status("CMP-RECOV").unwrap().is_funds_frozen);
}
