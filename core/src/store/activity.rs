use super::{from_millis, to_millis, CaseStore};
use crate::{case::CaseActivity, error::EscalationResult, types::ActivityKind};
use chrono::{DateTime, Utc};
use rusqlite::params;

impl CaseStore {
    // ── Case activity (append-only) ─────────────────────────────────

    pub fn append_activity(
        &self,
        complaint_id: &str,
        kind: ActivityKind,
        description: &str,
        remark: Option<&str>,
        at: DateTime<Utc>,
    ) -> EscalationResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO case_activity (complaint_id, action_kind, description, remark, created_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![complaint_id, kind, description, remark, to_millis(at)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Activities for a complaint, oldest first.
    pub fn activities_for(&self, complaint_id: &str) -> EscalationResult<Vec<CaseActivity>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, complaint_id, action_kind, description, remark, created_at_ms
             FROM case_activity WHERE complaint_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![complaint_id], |r| {
            Ok(CaseActivity {
                id: r.get(0)?,
                complaint_id: r.get(1)?,
                kind: r.get(2)?,
                description: r.get(3)?,
                remark: r.get(4)?,
                created_at: from_millis(r.get(5)?),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
