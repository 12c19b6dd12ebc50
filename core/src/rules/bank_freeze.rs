//! Freeze request to the accused's bank.
//!
//! The bank action row and the funds-frozen flag are claimed together in one
//! store transaction before anything is sent. A complaint that is already
//! frozen short-circuits, so retries and concurrent invocations send at most
//! one freeze request.
//!
//! A rejected send releases the claim so a later escalation may file again.
//! A timed-out send keeps it: the worker may still hand the request to the
//! bank, and releasing would risk a second freeze request.

use super::{within_golden_hour, EscalationRule, RuleContext};
use crate::{
    error::{EscalationError, EscalationResult},
    outcome::{AlertKind, RuleOutcome},
    store::{FreezeClaim, NewBankAction},
    types::{ActivityKind, BankActionKind, MessagePriority},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The JSON document mailed to the bank's nodal officer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreezeRequest {
    pub request_id: String,
    pub complaint_id: String,
    pub account_number: String,
    pub bank_name: Option<String>,
    pub amount: f64,
    pub request_type: BankActionKind,
    /// HIGH inside the golden hour, NORMAL otherwise.
    pub priority: MessagePriority,
    pub requesting_authority: String,
    pub legal_basis: String,
}

pub struct BankFreezeRule;

impl EscalationRule for BankFreezeRule {
    fn kind(&self) -> AlertKind {
        AlertKind::BankFreeze
    }

    fn applies(&self, ctx: &RuleContext<'_>) -> EscalationResult<bool> {
        Ok(ctx.complaint.accused_account().is_some())
    }

    fn execute(&self, ctx: &RuleContext<'_>) -> EscalationResult<RuleOutcome> {
        let c = ctx.complaint;
        let account = c
            .accused_account()
            .ok_or_else(|| EscalationError::MissingAccusedAccount {
                complaint_id: c.complaint_id.clone(),
            })?;

        let golden = within_golden_hour(c, ctx.now, ctx.config.thresholds.golden_hour_minutes);
        let request = FreezeRequest {
            request_id: Uuid::new_v4().to_string(),
            complaint_id: c.complaint_id.clone(),
            account_number: account.to_string(),
            bank_name: c.accused_bank.clone(),
            amount: c.amount_lost,
            request_type: BankActionKind::Freeze,
            priority: if golden { MessagePriority::High } else { MessagePriority::Normal },
            requesting_authority: ctx.config.identity.requesting_authority.clone(),
            legal_basis: c
                .fir_number
                .clone()
                .unwrap_or_else(|| "Under Investigation".to_string()),
        };
        let payload = serde_json::to_string_pretty(&request)?;

        let claim = ctx.store.claim_freeze(&NewBankAction {
            complaint_id: &c.complaint_id,
            request_id: &request.request_id,
            bank_name: c.accused_bank.as_deref(),
            account_number: account,
            kind: BankActionKind::Freeze,
            amount: c.amount_lost,
            at: ctx.now,
        })?;
        let action_id = match claim {
            FreezeClaim::Filed { action_id } => action_id,
            FreezeClaim::AlreadyFrozen => {
                log::info!(
                    "Freeze for {} already requested; not sending again",
                    c.complaint_id
                );
                return Ok(RuleOutcome::succeeded(vec![])
                    .with_detail("freeze already requested for this complaint"));
            }
        };

        let nodal = ctx
            .config
            .banks
            .nodal_email(c.accused_bank.as_deref(), &ctx.config.authorities.regulator.email);
        let to_bank = ctx.dispatcher.email(
            &c.complaint_id,
            [nodal],
            &format!("URGENT: Account Freeze Request - {}", c.complaint_id),
            &payload,
            MessagePriority::High,
            ctx.now,
        );
        if !to_bank.delivered {
            let reason = to_bank
                .error
                .clone()
                .unwrap_or_else(|| "not delivered".to_string());
            let description = if to_bank.timed_out {
                let remark = format!("Freeze request delivery unconfirmed: {reason}");
                ctx.store.note_pending_action(action_id, &remark)?;
                format!("Freeze request to {} unconfirmed", c.accused_bank_or_unknown())
            } else {
                ctx.store.release_freeze(
                    &c.complaint_id,
                    action_id,
                    &format!("Freeze request not delivered: {reason}"),
                    ctx.now,
                )?;
                format!("Freeze request to {} not delivered", c.accused_bank_or_unknown())
            };
            ctx.store.append_activity(
                &c.complaint_id,
                ActivityKind::BankNotified,
                &description,
                Some(&format!("Request {} to {nodal}: {reason}", request.request_id)),
                ctx.now,
            )?;
            return Ok(RuleOutcome::failed(
                format!("freeze request to {nodal} not delivered: {reason}"),
                vec![to_bank],
            ));
        }

        ctx.store.append_activity(
            &c.complaint_id,
            ActivityKind::BankNotified,
            &format!("Freeze request sent to {}", c.accused_bank_or_unknown()),
            Some(&format!("Request {} to {nodal}", request.request_id)),
            ctx.now,
        )?;

        let to_victim = ctx.dispatcher.sms(
            &c.complaint_id,
            &c.victim_phone,
            &format!(
                "Your case {}: Bank freeze request sent to {}. You will be updated on the status.",
                c.complaint_id,
                c.accused_bank_or_unknown()
            ),
            ctx.now,
        );
        let deliveries = vec![to_bank, to_victim];
        Ok(match RuleOutcome::delivery_failures(&deliveries) {
            Some(failures) => RuleOutcome::succeeded(deliveries).with_detail(failures),
            None => RuleOutcome::succeeded(deliveries),
        })
    }
}
