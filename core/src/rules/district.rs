//! Local police station and district cyber cell alerts.
//!
//! Both mailboxes are derived from the district name. Success is whether the
//! transport accepted the email; no audit entry is written.

use super::{format_rupees, EscalationRule, RuleContext};
use crate::{
    dispatcher::Delivery,
    error::{EscalationError, EscalationResult},
    outcome::{AlertKind, RuleOutcome},
    types::MessagePriority,
};

fn blank_district(ctx: &RuleContext<'_>) -> EscalationError {
    EscalationError::InvalidComplaint {
        complaint_id: ctx.complaint.complaint_id.clone(),
        reason: "district is blank; no district mailbox".to_string(),
    }
}

fn outcome(delivery: Delivery) -> RuleOutcome {
    let deliveries = vec![delivery];
    match RuleOutcome::delivery_failures(&deliveries) {
        Some(failures) => RuleOutcome::failed(failures, deliveries),
        None => RuleOutcome::succeeded(deliveries),
    }
}

/// Asks the district's police station to register an FIR.
pub struct PoliceStationRule;

impl EscalationRule for PoliceStationRule {
    fn kind(&self) -> AlertKind {
        AlertKind::PoliceStation
    }

    fn applies(&self, _ctx: &RuleContext<'_>) -> EscalationResult<bool> {
        Ok(true)
    }

    fn execute(&self, ctx: &RuleContext<'_>) -> EscalationResult<RuleOutcome> {
        let c = ctx.complaint;
        let routing = &ctx.config.routing;
        let station = routing
            .police_station_email(&c.district)
            .ok_or_else(|| blank_district(ctx))?;
        let body = format!(
            "NEW CYBER FRAUD COMPLAINT\n\n\
             Complaint ID: {}\n\
             District: {}\n\
             Amount: {}\n\
             Fraud Type: {}\n\n\
             Victim Details:\n\
             Name: {}\n\
             Phone: {}\n\n\
             Action Required: Register FIR and update in CCTNS system\n\n\
             Case Details: View at {}\n",
            c.complaint_id,
            c.district,
            format_rupees(c.amount_lost),
            c.fraud_type,
            c.victim_name,
            c.victim_phone,
            routing.case_url(&c.complaint_id),
        );
        let delivery = ctx.dispatcher.email(
            &c.complaint_id,
            [station],
            &format!("New Cyber Fraud Complaint - {}", c.complaint_id),
            &body,
            MessagePriority::Normal,
            ctx.now,
        );
        Ok(outcome(delivery))
    }
}

/// Copies the district cyber cell and the state cyber cell.
pub struct DistrictCyberCellRule;

impl EscalationRule for DistrictCyberCellRule {
    fn kind(&self) -> AlertKind {
        AlertKind::DistrictCyberCell
    }

    fn applies(&self, _ctx: &RuleContext<'_>) -> EscalationResult<bool> {
        Ok(true)
    }

    fn execute(&self, ctx: &RuleContext<'_>) -> EscalationResult<RuleOutcome> {
        let c = ctx.complaint;
        let cell = ctx
            .config
            .routing
            .district_cyber_cell_email(&c.district)
            .ok_or_else(|| blank_district(ctx))?;
        let delivery = ctx.dispatcher.email(
            &c.complaint_id,
            [cell, ctx.config.authorities.cyber_cell.email.clone()],
            &format!("District Cyber Fraud - {}", c.complaint_id),
            &format!(
                "New case registered in {}. Amount: {}",
                c.district,
                format_rupees(c.amount_lost)
            ),
            MessagePriority::Normal,
            ctx.now,
        );
        Ok(outcome(delivery))
    }
}
