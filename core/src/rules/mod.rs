//! Escalation rule trait and the built-in rules.
//!
//! RULE: Every rule implements EscalationRule.
//! The engine asks each registered rule whether it applies, then executes it,
//! in registration order. Execution order is fixed and documented in engine.rs.
//! Rules never call each other; shared predicates live as free functions.

use crate::{
    case::Complaint,
    config::EscalationConfig,
    dispatcher::Dispatcher,
    error::EscalationResult,
    outcome::{AlertKind, RuleOutcome},
    store::CaseStore,
};
use chrono::{DateTime, Utc};

mod bank_freeze;
mod district;
mod golden_hour;
mod high_value;
mod national_sync;
mod pattern_alert;

pub use bank_freeze::BankFreezeRule;
pub use district::{DistrictCyberCellRule, PoliceStationRule};
pub use golden_hour::{minutes_since_transaction, within_golden_hour, GoldenHourRule};
pub use high_value::HighValueRule;
pub use national_sync::{NationalSyncPayload, NationalSyncRule};
pub use pattern_alert::PatternAlertRule;

/// Everything a rule may read or act through for one complaint.
pub struct RuleContext<'a> {
    pub complaint: &'a Complaint,
    /// Evaluation time, read once per invocation so every rule agrees on it.
    pub now: DateTime<Utc>,
    pub config: &'a EscalationConfig,
    pub store: &'a CaseStore,
    pub dispatcher: &'a Dispatcher,
}

/// The contract every escalation rule must fulfill.
pub trait EscalationRule: Send + Sync {
    fn kind(&self) -> AlertKind;

    /// The rule's predicate. Unconditional rules return true.
    fn applies(&self, ctx: &RuleContext<'_>) -> EscalationResult<bool>;

    /// Carry out the escalation. An `Err` is recorded by the engine as a failed
    /// outcome for this rule only.
    fn execute(&self, ctx: &RuleContext<'_>) -> EscalationResult<RuleOutcome>;
}

/// Indian-style amount for message bodies: `₹1,50,000.00`.
pub(crate) fn format_rupees(amount: f64) -> String {
    let rounded = (amount * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let paise = ((rounded - rounded.trunc()) * 100.0).round() as u64;
    let digits = whole.to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, last3) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (h, t) = rest.split_at(rest.len() - 2);
            groups.push(t);
            rest = h;
        }
        groups.push(rest);
        groups.reverse();
        format!("{},{last3}", groups.join(","))
    };
    format!("₹{grouped}.{paise:02}")
}

#[cfg(test)]
mod tests {
    use super::format_rupees;

    #[test]
    fn rupees_use_lakh_grouping() {
        assert_eq!(format_rupees(0.0), "₹0.00");
        assert_eq!(format_rupees(999.5), "₹999.50");
        assert_eq!(format_rupees(150_000.0), "₹1,50,000.00");
        assert_eq!(format_rupees(12_345_678.9), "₹1,23,45,678.90");
    }
}
