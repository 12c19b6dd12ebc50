//! Case records owned by the record store.
//!
//! The engine only reads complaints and asks the store for conditional
//! flag changes. Activities are append-only.

use crate::types::{
    ActivityKind, BankActionId, BankActionKind, BankActionStatus, CaseStatus, Channel,
    ComplaintId, FraudType, NotificationStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub complaint_id: ComplaintId,
    pub fraud_type: FraudType,
    pub status: CaseStatus,
    pub amount_lost: f64,
    pub amount_recovered: f64,
    pub transaction_id: Option<String>,
    /// Absent means the golden hour can never apply.
    pub transaction_at: Option<DateTime<Utc>>,
    pub accused_account: Option<String>,
    pub accused_bank: Option<String>,
    pub fir_number: Option<String>,
    pub district: String,
    pub victim_name: String,
    pub victim_phone: String,
    pub reported_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_funds_frozen: bool,
    pub is_priority: bool,
}

impl Complaint {
    /// A freshly registered complaint with no transaction details, FIR, or flags.
    pub fn new(
        complaint_id: impl Into<String>,
        fraud_type: FraudType,
        amount_lost: f64,
        district: impl Into<String>,
        victim_name: impl Into<String>,
        victim_phone: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            complaint_id: complaint_id.into(),
            fraud_type,
            status: CaseStatus::Pending,
            amount_lost,
            amount_recovered: 0.0,
            transaction_id: None,
            transaction_at: None,
            accused_account: None,
            accused_bank: None,
            fir_number: None,
            district: district.into(),
            victim_name: victim_name.into(),
            victim_phone: victim_phone.into(),
            reported_at: created_at,
            created_at,
            is_funds_frozen: false,
            is_priority: false,
        }
    }

    pub fn with_transaction(mut self, transaction_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self.transaction_at = Some(at);
        self
    }

    pub fn with_accused(mut self, account: impl Into<String>, bank: Option<&str>) -> Self {
        self.accused_account = Some(account.into());
        self.accused_bank = bank.map(String::from);
        self
    }

    pub fn with_fir(mut self, fir_number: impl Into<String>) -> Self {
        self.fir_number = Some(fir_number.into());
        self
    }

    /// The accused account, if one was reported and is not blank.
    pub fn accused_account(&self) -> Option<&str> {
        self.accused_account
            .as_deref()
            .filter(|a| !a.trim().is_empty())
    }

    pub fn accused_bank_or_unknown(&self) -> &str {
        self.accused_bank.as_deref().unwrap_or("UNKNOWN BANK")
    }

    pub fn fir_status(&self) -> &str {
        self.fir_number.as_deref().unwrap_or("Pending")
    }
}

/// Append-only audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseActivity {
    pub id: i64,
    pub complaint_id: ComplaintId,
    pub kind: ActivityKind,
    pub description: String,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAction {
    pub id: BankActionId,
    pub complaint_id: ComplaintId,
    pub request_id: String,
    pub bank_name: Option<String>,
    pub account_number: String,
    pub kind: BankActionKind,
    pub amount: f64,
    pub status: BankActionStatus,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub bank_reference: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: i64,
    pub complaint_id: ComplaintId,
    pub channel: Channel,
    pub recipient: String,
    pub message: String,
    pub status: NotificationStatus,
    pub sent_at: DateTime<Utc>,
}

/// Current escalation state of one complaint, as shown to officers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertStatus {
    pub complaint_id: ComplaintId,
    pub is_funds_frozen: bool,
    pub is_priority: bool,
    pub fir_registered: bool,
    pub status: CaseStatus,
}

impl From<&Complaint> for AlertStatus {
    fn from(c: &Complaint) -> Self {
        Self {
            complaint_id: c.complaint_id.clone(),
            is_funds_frozen: c.is_funds_frozen,
            is_priority: c.is_priority,
            fir_registered: c.fir_number.is_some(),
            status: c.status,
        }
    }
}
