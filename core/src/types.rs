//! Shared primitive types used across the escalation engine.
//!
//! Every enumeration here is persisted as its SCREAMING_SNAKE_CASE name,
//! the same spelling the case portal and bank officers see.

use crate::error::EscalationError;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// External complaint identifier (the 1930 helpline / portal reference).
pub type ComplaintId = String;

/// Row id of a bank action request.
pub type BankActionId = i64;

/// Declares a closed, string-backed enumeration with a stable storage name
/// and SQLite conversions.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = EscalationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(EscalationError::Config(format!(
                        "unknown {} value '{other}'",
                        stringify!($name)
                    ))),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                text.parse().map_err(|e: EscalationError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

string_enum! {
    /// Fraud category reported by the victim.
    pub enum FraudType {
        UpiScam => "UPI_SCAM",
        Phishing => "PHISHING",
        OnlineShopping => "ONLINE_SHOPPING",
        InvestmentFraud => "INVESTMENT_FRAUD",
        LoanFraud => "LOAN_FRAUD",
        SocialMedia => "SOCIAL_MEDIA",
        JobFraud => "JOB_FRAUD",
        Other => "OTHER",
    }
}

string_enum! {
    /// Lifecycle of a complaint. See [`CaseStatus::can_transition_to`].
    pub enum CaseStatus {
        Pending => "PENDING",
        InProcess => "IN_PROCESS",
        BankActionTaken => "BANK_ACTION_TAKEN",
        Refunded => "REFUNDED",
        Closed => "CLOSED",
    }
}

impl CaseStatus {
    /// Legal status transitions. CLOSED is terminal and a status never
    /// transitions to itself.
    pub fn can_transition_to(self, next: CaseStatus) -> bool {
        use CaseStatus::*;
        matches!(
            (self, next),
            (Pending, InProcess)
                | (Pending, Closed)
                | (InProcess, BankActionTaken)
                | (InProcess, Closed)
                | (BankActionTaken, Refunded)
                | (BankActionTaken, Closed)
                | (Refunded, Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == CaseStatus::Closed
    }
}

string_enum! {
    /// Kind of an audit-trail entry.
    pub enum ActivityKind {
        ComplaintRegistered => "COMPLAINT_REGISTERED",
        FirFiled => "FIR_FILED",
        BankNotified => "BANK_NOTIFIED",
        FundsFrozen => "FUNDS_FROZEN",
        RecoveryInitiated => "RECOVERY_INITIATED",
        RefundProcessed => "REFUND_PROCESSED",
        CaseClosed => "CASE_CLOSED",
    }
}

string_enum! {
    pub enum BankActionKind {
        Freeze => "FREEZE",
        Unfreeze => "UNFREEZE",
        Recovery => "RECOVERY",
    }
}

string_enum! {
    pub enum BankActionStatus {
        Pending => "PENDING",
        Success => "SUCCESS",
        Failed => "FAILED",
    }
}

string_enum! {
    /// Outbound notification channel.
    pub enum Channel {
        Email => "EMAIL",
        Sms => "SMS",
    }
}

string_enum! {
    pub enum NotificationStatus {
        Sent => "SENT",
        Failed => "FAILED",
    }
}

string_enum! {
    /// Mutable complaint flags the engine is allowed to change.
    pub enum ComplaintFlag {
        FundsFrozen => "FUNDS_FROZEN",
        Priority => "PRIORITY",
    }
}

impl ComplaintFlag {
    pub(crate) fn column(self) -> &'static str {
        match self {
            ComplaintFlag::FundsFrozen => "is_funds_frozen",
            ComplaintFlag::Priority => "is_priority",
        }
    }
}

string_enum! {
    /// Email urgency, passed through to the provider.
    pub enum MessagePriority {
        Normal => "NORMAL",
        High => "HIGH",
    }
}

/// Mask an account number for display: last four characters then `****`.
pub fn mask_account(account: &str) -> String {
    let chars: Vec<char> = account.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{tail}****")
}
