use super::{format_rupees, EscalationRule, RuleContext};
use crate::{
    error::EscalationResult,
    outcome::{AlertKind, RuleOutcome},
    types::{ActivityKind, MessagePriority},
};

/// Losses at or above the configured threshold go to senior officials.
pub struct HighValueRule;

impl EscalationRule for HighValueRule {
    fn kind(&self) -> AlertKind {
        AlertKind::HighAmount
    }

    fn applies(&self, ctx: &RuleContext<'_>) -> EscalationResult<bool> {
        Ok(ctx.complaint.amount_lost >= ctx.config.thresholds.high_amount)
    }

    fn execute(&self, ctx: &RuleContext<'_>) -> EscalationResult<RuleOutcome> {
        let c = ctx.complaint;
        let amount = format_rupees(c.amount_lost);
        let body = format!(
            "HIGH VALUE FRAUD ALERT\n\n\
             Complaint ID: {}\n\
             Amount Lost: {amount}\n\
             Fraud Type: {}\n\n\
             Victim: {}\n\
             District: {}\n\
             FIR Status: {}\n\n\
             This case requires senior officer attention due to high amount involved.\n",
            c.complaint_id,
            c.fraud_type,
            c.victim_name,
            c.district,
            c.fir_status(),
        );
        let delivery = ctx.dispatcher.email(
            &c.complaint_id,
            [ctx.config.authorities.senior_office.email.as_str()],
            &format!("High Value Fraud Alert - {amount}"),
            &body,
            MessagePriority::High,
            ctx.now,
        );
        let delivered = delivery.delivered;
        let deliveries = vec![delivery];

        let description = if delivered {
            "High amount alert sent to senior officials"
        } else {
            "High amount alert to senior officials not delivered"
        };
        ctx.store.append_activity(
            &c.complaint_id,
            ActivityKind::ComplaintRegistered,
            description,
            Some(&format!("Amount: {amount}")),
            ctx.now,
        )?;

        Ok(match RuleOutcome::delivery_failures(&deliveries) {
            Some(failures) => RuleOutcome::failed(failures, deliveries),
            None => RuleOutcome::succeeded(deliveries),
        })
    }
}
