//! Incident escalation engine for cyber-fraud complaints.
//!
//! Given a complaint id, [`engine::EscalationEngine`] decides which
//! authorities hear about it, over which channels, and records what it did.

pub mod case;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod pattern;
pub mod rules;
pub mod store;
pub mod transport;
pub mod types;

pub use engine::{CancelToken, EscalationEngine};
pub use error::{EscalationError, EscalationResult};
pub use outcome::{AlertKind, EscalationReport, RuleOutcome};
