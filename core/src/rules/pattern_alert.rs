//! Organised-fraud warning when one accused account recurs across complaints.
//!
//! The priority flag is the event marker: it is claimed false→true before the
//! warning goes out, so a complaint that is already priority never re-fires.
//! If the warning cannot be delivered the claim is rolled back.

use super::{format_rupees, EscalationRule, RuleContext};
use crate::{
    error::EscalationResult,
    outcome::{AlertKind, RuleOutcome},
    pattern::PatternDetector,
    types::{mask_account, ActivityKind, ComplaintFlag, MessagePriority},
};

pub struct PatternAlertRule {
    detector: PatternDetector,
}

impl PatternAlertRule {
    pub fn new(detector: PatternDetector) -> Self {
        Self { detector }
    }
}

impl EscalationRule for PatternAlertRule {
    fn kind(&self) -> AlertKind {
        AlertKind::PatternAlert
    }

    fn applies(&self, ctx: &RuleContext<'_>) -> EscalationResult<bool> {
        Ok(self
            .detector
            .detect(ctx.store, ctx.complaint, ctx.now)?
            .is_some())
    }

    fn execute(&self, ctx: &RuleContext<'_>) -> EscalationResult<RuleOutcome> {
        let c = ctx.complaint;
        let claimed = ctx
            .store
            .set_flag(&c.complaint_id, ComplaintFlag::Priority, true, false)?;
        if !claimed {
            return Ok(RuleOutcome::succeeded(vec![])
                .with_detail("complaint already flagged priority; pattern alert not re-sent"));
        }

        let total = self
            .detector
            .detect(ctx.store, c, ctx.now)?
            .map(|m| m.total_complaints().to_string())
            .unwrap_or_else(|| "Multiple".to_string());
        let body = format!(
            "FRAUD PATTERN DETECTED\n\n\
             {total} complaints detected with similar characteristics:\n\
             Accused Account: {}\n\
             Bank: {}\n\n\
             This may indicate organized fraud gang activity.\n\
             Recommend immediate investigation and inter-district coordination.\n\n\
             Latest Complaint: {}\n\
             Amount: {}\n",
            c.accused_account().unwrap_or("Not reported"),
            c.accused_bank_or_unknown(),
            c.complaint_id,
            format_rupees(c.amount_lost),
        );
        let authorities = &ctx.config.authorities;
        let delivery = ctx.dispatcher.email(
            &c.complaint_id,
            [
                authorities.cyber_cell.email.as_str(),
                authorities.senior_office.email.as_str(),
                authorities.national.email.as_str(),
            ],
            "Fraud Pattern Detected - Organized Activity Suspected",
            &body,
            MessagePriority::High,
            ctx.now,
        );

        let remark = format!("{total} complaints against the same account");
        if !delivery.delivered {
            ctx.store
                .set_flag(&c.complaint_id, ComplaintFlag::Priority, false, true)?;
            ctx.store.append_activity(
                &c.complaint_id,
                ActivityKind::ComplaintRegistered,
                "Pattern alert to authorities not delivered",
                Some(&remark),
                ctx.now,
            )?;
            let deliveries = vec![delivery];
            let detail = RuleOutcome::delivery_failures(&deliveries)
                .unwrap_or_else(|| "pattern alert not delivered".to_string());
            return Ok(RuleOutcome::failed(detail, deliveries));
        }
        ctx.store.append_activity(
            &c.complaint_id,
            ActivityKind::ComplaintRegistered,
            "Pattern alert sent to authorities",
            Some(&remark),
            ctx.now,
        )?;
        log::info!(
            "{} flagged priority: pattern on account {}",
            c.complaint_id,
            mask_account(c.accused_account().unwrap_or_default())
        );
        Ok(RuleOutcome::succeeded(vec![delivery]))
    }
}
