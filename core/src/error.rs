use crate::types::{BankActionId, BankActionStatus, CaseStatus, Channel};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EscalationError {
    #[error("Complaint '{complaint_id}' not found")]
    NotFound { complaint_id: String },

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{channel} delivery failed: {reason}")]
    TransportFailure { channel: Channel, reason: String },

    #[error("{channel} delivery timed out after {timeout_ms} ms")]
    TransportTimeout { channel: Channel, timeout_ms: u64 },

    #[error("Illegal status transition {from} -> {to}")]
    IllegalTransition { from: CaseStatus, to: CaseStatus },

    #[error("Complaint '{complaint_id}' has no accused account details")]
    MissingAccusedAccount { complaint_id: String },

    #[error("Complaint '{complaint_id}' is invalid: {reason}")]
    InvalidComplaint { complaint_id: String, reason: String },

    #[error("Bank action {id} not found")]
    BankActionNotFound { id: BankActionId },

    #[error("Bank action {id} already resolved as {status}")]
    BankActionResolved { id: BankActionId, status: BankActionStatus },

    #[error("A bank response must be SUCCESS or FAILED, got {status}")]
    InvalidBankResponse { status: BankActionStatus },

    #[error("Unknown authority '{name}'")]
    UnknownAuthority { name: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EscalationError {
    /// True for failures of an outbound send, as opposed to store or input errors.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            EscalationError::TransportFailure { .. } | EscalationError::TransportTimeout { .. }
        )
    }
}

pub type EscalationResult<T> = Result<T, EscalationError>;
