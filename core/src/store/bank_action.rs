//! Bank action rows and the freeze claim.
//!
//! A complaint's funds-frozen flag and its live FREEZE action change together:
//! the flag flips false→true in the same immediate transaction that inserts the
//! PENDING action, and a FAILED action clears the flag in the same transaction
//! that supersedes it.

use super::{from_millis, to_millis, CaseStore};
use crate::{
    case::BankAction,
    error::{EscalationError, EscalationResult},
    types::{ActivityKind, BankActionId, BankActionKind, BankActionStatus},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};

const BANK_ACTION_COLUMNS: &str = "id, complaint_id, request_id, bank_name, account_number,
    action_kind, amount, status, requested_at_ms, responded_at_ms, bank_reference, remarks";

fn bank_action_row_mapper(r: &rusqlite::Row<'_>) -> rusqlite::Result<BankAction> {
    Ok(BankAction {
        id: r.get(0)?,
        complaint_id: r.get(1)?,
        request_id: r.get(2)?,
        bank_name: r.get(3)?,
        account_number: r.get(4)?,
        kind: r.get(5)?,
        amount: r.get(6)?,
        status: r.get(7)?,
        requested_at: from_millis(r.get(8)?),
        responded_at: r.get::<_, Option<i64>>(9)?.map(from_millis),
        bank_reference: r.get(10)?,
        remarks: r.get(11)?,
    })
}

/// Result of trying to file a freeze request for a complaint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreezeClaim {
    /// The flag was false; it is now true and a PENDING action was created.
    Filed { action_id: BankActionId },
    /// The flag was already true. Nothing was written.
    AlreadyFrozen,
}

/// Parameters of a new bank action request.
#[derive(Debug, Clone)]
pub struct NewBankAction<'a> {
    pub complaint_id: &'a str,
    pub request_id: &'a str,
    pub bank_name: Option<&'a str>,
    pub account_number: &'a str,
    pub kind: BankActionKind,
    pub amount: f64,
    pub at: DateTime<Utc>,
}

fn insert_bank_action(tx: &Transaction<'_>, a: &NewBankAction<'_>) -> rusqlite::Result<BankActionId> {
    tx.execute(
        "INSERT INTO bank_action (
            complaint_id, request_id, bank_name, account_number, action_kind,
            amount, status, requested_at_ms
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            a.complaint_id,
            a.request_id,
            a.bank_name,
            a.account_number,
            a.kind,
            a.amount,
            BankActionStatus::Pending,
            to_millis(a.at),
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

impl CaseStore {
    // ── Bank actions ───────────────────────────────────────────────

    /// Record a bank action request with status PENDING. Does not touch flags;
    /// freeze requests go through [`claim_freeze`](Self::claim_freeze).
    pub fn create_bank_action(&self, action: &NewBankAction<'_>) -> EscalationResult<BankActionId> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let id = insert_bank_action(&tx, action)?;
        tx.commit()?;
        Ok(id)
    }

    /// Atomically set funds-frozen false→true and create the PENDING FREEZE
    /// action. Concurrent or repeated claims for one complaint create exactly one row.
    pub fn claim_freeze(&self, action: &NewBankAction<'_>) -> EscalationResult<FreezeClaim> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE complaint SET is_funds_frozen = 1
             WHERE complaint_id = ?1 AND is_funds_frozen = 0",
            params![action.complaint_id],
        )?;
        if changed == 0 {
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM complaint WHERE complaint_id = ?1)",
                params![action.complaint_id],
                |r| r.get(0),
            )?;
            if !exists {
                return Err(EscalationError::NotFound {
                    complaint_id: action.complaint_id.to_string(),
                });
            }
            return Ok(FreezeClaim::AlreadyFrozen);
        }
        let action_id = insert_bank_action(
            &tx,
            &NewBankAction {
                kind: BankActionKind::Freeze,
                ..action.clone()
            },
        )?;
        tx.commit()?;
        Ok(FreezeClaim::Filed { action_id })
    }

    /// Undo a freeze claim whose request never reached the bank: the action is
    /// marked FAILED and the flag cleared, so a later escalation may file again.
    pub fn release_freeze(
        &self,
        complaint_id: &str,
        action_id: BankActionId,
        remark: &str,
        at: DateTime<Utc>,
    ) -> EscalationResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "UPDATE bank_action SET status = ?1, remarks = ?2, responded_at_ms = ?3
             WHERE id = ?4 AND status = ?5",
            params![
                BankActionStatus::Failed,
                remark,
                to_millis(at),
                action_id,
                BankActionStatus::Pending
            ],
        )?;
        tx.execute(
            "UPDATE complaint SET is_funds_frozen = 0
             WHERE complaint_id = ?1 AND is_funds_frozen = 1",
            params![complaint_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Attach a remark to an action that is still PENDING. Returns whether it was.
    pub fn note_pending_action(
        &self,
        action_id: BankActionId,
        remark: &str,
    ) -> EscalationResult<bool> {
        let changed = self.conn().execute(
            "UPDATE bank_action SET remarks = ?1 WHERE id = ?2 AND status = ?3",
            params![remark, action_id, BankActionStatus::Pending],
        )?;
        Ok(changed == 1)
    }

    /// Apply a bank's reply to a PENDING action. SUCCESS logs FUNDS_FROZEN for
    /// freeze actions; FAILED supersedes the action and clears funds-frozen.
    pub fn record_bank_response(
        &self,
        action_id: BankActionId,
        status: BankActionStatus,
        bank_reference: Option<&str>,
        at: DateTime<Utc>,
    ) -> EscalationResult<BankAction> {
        if status == BankActionStatus::Pending {
            return Err(EscalationError::InvalidBankResponse { status });
        }
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let action = tx
            .query_row(
                &format!("SELECT {BANK_ACTION_COLUMNS} FROM bank_action WHERE id = ?1"),
                params![action_id],
                bank_action_row_mapper,
            )
            .optional()?
            .ok_or(EscalationError::BankActionNotFound { id: action_id })?;
        if action.status != BankActionStatus::Pending {
            return Err(EscalationError::BankActionResolved {
                id: action_id,
                status: action.status,
            });
        }
        tx.execute(
            "UPDATE bank_action SET status = ?1, bank_reference = ?2, responded_at_ms = ?3
             WHERE id = ?4",
            params![status, bank_reference, to_millis(at), action_id],
        )?;
        match (action.kind, status) {
            (BankActionKind::Freeze, BankActionStatus::Success) => {
                tx.execute(
                    "INSERT INTO case_activity (complaint_id, action_kind, description, remark, created_at_ms)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        &action.complaint_id,
                        ActivityKind::FundsFrozen,
                        format!(
                            "Funds frozen by {}",
                            action.bank_name.as_deref().unwrap_or("bank")
                        ),
                        bank_reference.map(|r| format!("Bank reference: {r}")),
                        to_millis(at),
                    ],
                )?;
            }
            (BankActionKind::Freeze, BankActionStatus::Failed) => {
                tx.execute(
                    "UPDATE complaint SET is_funds_frozen = 0
                     WHERE complaint_id = ?1 AND is_funds_frozen = 1",
                    params![&action.complaint_id],
                )?;
            }
            _ => {}
        }
        tx.commit()?;
        Ok(BankAction {
            status,
            bank_reference: bank_reference.map(String::from),
            responded_at: Some(at),
            ..action
        })
    }

    pub fn bank_actions_for(&self, complaint_id: &str) -> EscalationResult<Vec<BankAction>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {BANK_ACTION_COLUMNS} FROM bank_action
             WHERE complaint_id = ?1 ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map(params![complaint_id], bank_action_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
