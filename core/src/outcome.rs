//! Per-rule outcomes and the aggregated escalation report.

use crate::{dispatcher::Delivery, types::ComplaintId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The escalation rules, declared in evaluation order. `Ord` follows that
/// order, so maps keyed by `AlertKind` iterate the way the engine ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    GoldenHour,
    HighAmount,
    BankFreeze,
    I4cSync,
    PoliceStation,
    DistrictCyberCell,
    PatternAlert,
}

impl AlertKind {
    pub const ALL: [AlertKind; 7] = [
        AlertKind::GoldenHour,
        AlertKind::HighAmount,
        AlertKind::BankFreeze,
        AlertKind::I4cSync,
        AlertKind::PoliceStation,
        AlertKind::DistrictCyberCell,
        AlertKind::PatternAlert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::GoldenHour => "golden_hour",
            AlertKind::HighAmount => "high_amount",
            AlertKind::BankFreeze => "bank_freeze",
            AlertKind::I4cSync => "i4c_sync",
            AlertKind::PoliceStation => "police_station",
            AlertKind::DistrictCyberCell => "district_cyber_cell",
            AlertKind::PatternAlert => "pattern_alert",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one rule did. `success` is the rule's verdict; channel-level results
/// are kept in `deliveries` even when they do not decide it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub success: bool,
    pub detail: Option<String>,
    pub deliveries: Vec<Delivery>,
}

impl RuleOutcome {
    pub fn succeeded(deliveries: Vec<Delivery>) -> Self {
        Self {
            success: true,
            detail: None,
            deliveries,
        }
    }

    pub fn failed(detail: impl Into<String>, deliveries: Vec<Delivery>) -> Self {
        Self {
            success: false,
            detail: Some(detail.into()),
            deliveries,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Failed channels, formatted for the outcome detail.
    pub(crate) fn delivery_failures(deliveries: &[Delivery]) -> Option<String> {
        let failures: Vec<String> = deliveries
            .iter()
            .filter(|d| !d.delivered)
            .map(|d| {
                format!(
                    "{} to {}: {}",
                    d.channel,
                    d.recipients.join(", "),
                    d.error.as_deref().unwrap_or("not delivered")
                )
            })
            .collect();
        (!failures.is_empty()).then(|| failures.join("; "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Outcomes of every rule attempted for one complaint. Rules whose predicate
/// did not hold are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationReport {
    pub complaint_id: ComplaintId,
    pub outcomes: BTreeMap<AlertKind, RuleOutcome>,
    /// Set when cancellation stopped evaluation before every rule was considered.
    pub cancelled: bool,
}

impl EscalationReport {
    pub fn new(complaint_id: impl Into<String>) -> Self {
        Self {
            complaint_id: complaint_id.into(),
            outcomes: BTreeMap::new(),
            cancelled: false,
        }
    }

    /// `alert_kind -> success` for every attempted rule.
    pub fn as_map(&self) -> BTreeMap<&'static str, bool> {
        self.outcomes
            .iter()
            .map(|(kind, outcome)| (kind.as_str(), outcome.success))
            .collect()
    }

    pub fn attempted(&self) -> Vec<AlertKind> {
        self.outcomes.keys().copied().collect()
    }

    pub fn get(&self, kind: AlertKind) -> Option<&RuleOutcome> {
        self.outcomes.get(&kind)
    }

    pub fn succeeded(&self, kind: AlertKind) -> Option<bool> {
        self.outcomes.get(&kind).map(|o| o.success)
    }

    pub fn summary(&self) -> AlertSummary {
        let successful = self.outcomes.values().filter(|o| o.success).count();
        AlertSummary {
            total: self.outcomes.len(),
            successful,
            failed: self.outcomes.len() - successful,
        }
    }
}
