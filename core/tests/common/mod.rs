//! Shared fixtures: an in-memory store, a fixed clock, and a recording transport.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use escalation_core::{
    case::Complaint, clock::FixedClock, config::EscalationConfig, store::CaseStore,
    transport::RecordingTransport, types::FraudType, EscalationEngine,
};
use std::sync::Arc;

/// The fixed "now" every test runs at.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A small complaint: no transaction time, no accused account, low amount.
/// Only the unconditional rules apply to it.
pub fn complaint(id: &str) -> Complaint {
    Complaint::new(
        id,
        FraudType::UpiScam,
        5_000.0,
        "Cuttack",
        "Asha Das",
        "+91-9000000001",
        now() - Duration::minutes(5),
    )
}

pub struct Harness {
    pub engine: EscalationEngine,
    pub store: Arc<CaseStore>,
    pub transport: Arc<RecordingTransport>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EscalationConfig::default())
    }

    pub fn with_config(config: EscalationConfig) -> Self {
        init_logging();
        let store = Arc::new(CaseStore::in_memory().expect("in-memory store"));
        store.migrate().expect("migrate");
        let transport = Arc::new(RecordingTransport::new());
        let clock = Arc::new(FixedClock::new(now()));
        let engine = EscalationEngine::new(
            Arc::clone(&store),
            transport.clone(),
            clock.clone(),
            config,
        );
        Self {
            engine,
            store,
            transport,
            clock,
        }
    }

    pub fn file(&self, complaint: &Complaint) {
        self.store.insert_complaint(complaint).expect("insert complaint");
    }
}
