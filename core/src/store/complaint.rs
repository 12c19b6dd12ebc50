use super::{from_millis, to_millis, CaseStore};
use crate::{
    case::Complaint,
    error::{EscalationError, EscalationResult},
    types::{CaseStatus, ComplaintFlag},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, TransactionBehavior};

const COMPLAINT_COLUMNS: &str = "complaint_id, fraud_type, status, amount_lost, amount_recovered,
    transaction_id, transaction_at_ms, accused_account, accused_bank, fir_number,
    district, victim_name, victim_phone, reported_at_ms, created_at_ms,
    is_funds_frozen, is_priority";

// Helper function for mapping complaint rows
fn complaint_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Complaint> {
    Ok(Complaint {
        complaint_id: row.get(0)?,
        fraud_type: row.get(1)?,
        status: row.get(2)?,
        amount_lost: row.get(3)?,
        amount_recovered: row.get(4)?,
        transaction_id: row.get(5)?,
        transaction_at: row.get::<_, Option<i64>>(6)?.map(from_millis),
        accused_account: row.get(7)?,
        accused_bank: row.get(8)?,
        fir_number: row.get(9)?,
        district: row.get(10)?,
        victim_name: row.get(11)?,
        victim_phone: row.get(12)?,
        reported_at: from_millis(row.get(13)?),
        created_at: from_millis(row.get(14)?),
        is_funds_frozen: row.get::<_, i32>(15)? != 0,
        is_priority: row.get::<_, i32>(16)? != 0,
    })
}

impl CaseStore {
    // ── Complaint ──────────────────────────────────────────────────

    pub fn insert_complaint(&self, c: &Complaint) -> EscalationResult<()> {
        if !(c.amount_lost.is_finite() && c.amount_lost >= 0.0) {
            return Err(EscalationError::InvalidComplaint {
                complaint_id: c.complaint_id.clone(),
                reason: format!("amount_lost must be non-negative, got {}", c.amount_lost),
            });
        }
        self.conn().execute(
            &format!(
                "INSERT INTO complaint ({COMPLAINT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
            ),
            params![
                &c.complaint_id,
                c.fraud_type,
                c.status,
                c.amount_lost,
                c.amount_recovered,
                c.transaction_id.as_deref(),
                c.transaction_at.map(to_millis),
                c.accused_account.as_deref(),
                c.accused_bank.as_deref(),
                c.fir_number.as_deref(),
                &c.district,
                &c.victim_name,
                &c.victim_phone,
                to_millis(c.reported_at),
                to_millis(c.created_at),
                c.is_funds_frozen as i32,
                c.is_priority as i32,
            ],
        )?;
        Ok(())
    }

    pub fn get_complaint(&self, complaint_id: &str) -> EscalationResult<Option<Complaint>> {
        self.conn()
            .query_row(
                &format!("SELECT {COMPLAINT_COLUMNS} FROM complaint WHERE complaint_id = ?1"),
                params![complaint_id],
                complaint_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Like [`get_complaint`](Self::get_complaint) but an unknown id is `NotFound`.
    pub fn require_complaint(&self, complaint_id: &str) -> EscalationResult<Complaint> {
        self.get_complaint(complaint_id)?
            .ok_or_else(|| EscalationError::NotFound {
                complaint_id: complaint_id.to_string(),
            })
    }

    /// Compare-and-swap on a complaint flag: set `flag` to `value` only if it
    /// currently equals `expected_previous`. Returns whether the row changed.
    pub fn set_flag(
        &self,
        complaint_id: &str,
        flag: ComplaintFlag,
        value: bool,
        expected_previous: bool,
    ) -> EscalationResult<bool> {
        let column = flag.column();
        let changed = self.conn().execute(
            &format!(
                "UPDATE complaint SET {column} = ?1
                 WHERE complaint_id = ?2 AND {column} = ?3"
            ),
            params![value as i32, complaint_id, expected_previous as i32],
        )?;
        Ok(changed == 1)
    }

    /// Count complaints against `accused_account`, other than `excluding_id`,
    /// created in `[since, until]`. Served by the (accused_account, created_at_ms) index.
    pub fn count_recent_matches(
        &self,
        accused_account: &str,
        excluding_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> EscalationResult<u32> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM complaint
             WHERE accused_account = ?1
               AND created_at_ms BETWEEN ?2 AND ?3
               AND complaint_id != ?4",
            params![accused_account, to_millis(since), to_millis(until), excluding_id],
            |r| r.get(0),
        )?;
        Ok(count as u32)
    }

    /// Move a complaint to `to`, rejecting transitions outside the status table.
    /// Returns the previous status.
    pub fn transition_status(
        &self,
        complaint_id: &str,
        to: CaseStatus,
    ) -> EscalationResult<CaseStatus> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let from: CaseStatus = tx
            .query_row(
                "SELECT status FROM complaint WHERE complaint_id = ?1",
                params![complaint_id],
                |r| r.get(0),
            )
            .optional()?
            .ok_or_else(|| EscalationError::NotFound {
                complaint_id: complaint_id.to_string(),
            })?;
        if !from.can_transition_to(to) {
            return Err(EscalationError::IllegalTransition { from, to });
        }
        tx.execute(
            "UPDATE complaint SET status = ?1 WHERE complaint_id = ?2",
            params![to, complaint_id],
        )?;
        tx.commit()?;
        Ok(from)
    }
}
