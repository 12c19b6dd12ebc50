//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Rules and the engine call store methods; they never execute SQL directly.
//!
//! One `CaseStore` owns one connection behind a mutex, so a store can be
//! shared across threads as `Arc<CaseStore>`. Separate stores opened on the
//! same file coordinate through SQLite's own locking (WAL + busy timeout).

use crate::error::EscalationResult;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

mod activity;
mod bank_action;
mod complaint;
mod notification;

pub use bank_action::{FreezeClaim, NewBankAction};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct CaseStore {
    conn: Mutex<Connection>,
}

impl CaseStore {
    pub fn open(path: &str) -> EscalationResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        if let Err(e) = conn.execute_batch("PRAGMA journal_mode=WAL;") {
            log::debug!("WAL not enabled for {path}: {e}");
        }
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EscalationResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EscalationResult<()> {
        self.conn()
            .execute_batch(include_str!("../../../migrations/001_cases.sql"))?;
        Ok(())
    }

    /// A poisoned lock only means another thread panicked mid-call; every
    /// multi-statement write runs in a transaction, so the connection is still usable.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
