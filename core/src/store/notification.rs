use super::{from_millis, to_millis, CaseStore};
use crate::{
    case::NotificationRecord,
    error::EscalationResult,
    types::{Channel, NotificationStatus},
};
use chrono::{DateTime, Utc};
use rusqlite::params;

impl CaseStore {
    // ── Notifications ──────────────────────────────────────────────

    pub fn create_notification(
        &self,
        complaint_id: &str,
        channel: Channel,
        recipient: &str,
        message: &str,
        status: NotificationStatus,
        at: DateTime<Utc>,
    ) -> EscalationResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO notification (complaint_id, channel, recipient, message, status, sent_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![complaint_id, channel, recipient, message, status, to_millis(at)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn notifications_for(&self, complaint_id: &str) -> EscalationResult<Vec<NotificationRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, complaint_id, channel, recipient, message, status, sent_at_ms
             FROM notification WHERE complaint_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![complaint_id], |r| {
            Ok(NotificationRecord {
                id: r.get(0)?,
                complaint_id: r.get(1)?,
                channel: r.get(2)?,
                recipient: r.get(3)?,
                message: r.get(4)?,
                status: r.get(5)?,
                sent_at: from_millis(r.get(6)?),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
