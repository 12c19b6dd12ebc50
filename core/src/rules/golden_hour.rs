//! Golden hour: the fraud happened recently enough that a freeze may still
//! catch the money.

use super::{format_rupees, EscalationRule, RuleContext};
use crate::{
    case::Complaint,
    error::EscalationResult,
    outcome::{AlertKind, RuleOutcome},
    types::{ActivityKind, MessagePriority},
};
use chrono::{DateTime, Duration, Utc};

/// True if the transaction time is known and no more than `window_minutes`
/// before `now`. A timestamp slightly in the future (clock skew) counts as inside.
pub fn within_golden_hour(complaint: &Complaint, now: DateTime<Utc>, window_minutes: i64) -> bool {
    match complaint.transaction_at {
        Some(at) => match Duration::try_minutes(window_minutes) {
            Some(window) => now.signed_duration_since(at) <= window,
            None => true,
        },
        None => false,
    }
}

/// Whole minutes since the transaction, floored at zero.
pub fn minutes_since_transaction(complaint: &Complaint, now: DateTime<Utc>) -> Option<i64> {
    complaint
        .transaction_at
        .map(|at| (now - at).num_minutes().max(0))
}

pub struct GoldenHourRule;

impl GoldenHourRule {
    fn message(ctx: &RuleContext<'_>) -> String {
        let c = ctx.complaint;
        let minutes = minutes_since_transaction(c, ctx.now).unwrap_or(0);
        format!(
            "GOLDEN HOUR ALERT\n\n\
             Complaint ID: {}\n\
             Amount: {}\n\
             Fraud Type: {}\n\
             Time Since Fraud: {minutes} minutes\n\n\
             Accused Account: {}\n\
             Accused Bank: {}\n\
             Transaction ID: {}\n\n\
             IMMEDIATE ACTION REQUIRED - FREEZE FUNDS NOW\n\n\
             District: {}\n\
             Victim Contact: {}\n",
            c.complaint_id,
            format_rupees(c.amount_lost),
            c.fraud_type,
            c.accused_account().unwrap_or("Not reported"),
            c.accused_bank_or_unknown(),
            c.transaction_id.as_deref().unwrap_or("Not reported"),
            c.district,
            c.victim_phone,
        )
    }
}

impl EscalationRule for GoldenHourRule {
    fn kind(&self) -> AlertKind {
        AlertKind::GoldenHour
    }

    fn applies(&self, ctx: &RuleContext<'_>) -> EscalationResult<bool> {
        Ok(within_golden_hour(
            ctx.complaint,
            ctx.now,
            ctx.config.thresholds.golden_hour_minutes,
        ))
    }

    /// Both channels are always attempted. Delivery is best-effort: the rule
    /// succeeds once the audit entry is written, and channel failures are
    /// reported in the outcome detail.
    fn execute(&self, ctx: &RuleContext<'_>) -> EscalationResult<RuleOutcome> {
        let c = ctx.complaint;
        let authorities = &ctx.config.authorities;

        let sms = ctx.dispatcher.sms(
            &c.complaint_id,
            authorities.cyber_cell.sms_destination(),
            &format!(
                "GOLDEN HOUR: {} - {} - {}",
                c.complaint_id,
                format_rupees(c.amount_lost),
                c.accused_bank_or_unknown()
            ),
            ctx.now,
        );
        let email = ctx.dispatcher.email(
            &c.complaint_id,
            [
                authorities.cyber_cell.email.as_str(),
                authorities.national.email.as_str(),
            ],
            "GOLDEN HOUR - URGENT FRAUD ALERT",
            &Self::message(ctx),
            MessagePriority::High,
            ctx.now,
        );
        let deliveries = vec![sms, email];

        ctx.store.append_activity(
            &c.complaint_id,
            ActivityKind::BankNotified,
            "Golden hour alert sent to authorities",
            Some("Urgent - Within 1 hour of fraud"),
            ctx.now,
        )?;

        let outcome = match RuleOutcome::delivery_failures(&deliveries) {
            Some(failures) => RuleOutcome::succeeded(deliveries).with_detail(failures),
            None => RuleOutcome::succeeded(deliveries),
        };
        Ok(outcome)
    }
}
