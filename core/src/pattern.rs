//! Cross-complaint pattern detection.
//!
//! A pattern is the same accused account showing up in several complaints
//! inside a trailing window. The lookup is one indexed range count over
//! (accused_account, created_at), never a pairwise scan.

use crate::{
    case::Complaint,
    config::{AlertThresholds, PATTERN_MIN_PRIOR_COMPLAINTS, PATTERN_WINDOW_DAYS},
    error::EscalationResult,
    store::CaseStore,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub accused_account: String,
    /// Matching complaints other than the one being escalated.
    pub other_complaints: u32,
    pub window_days: i64,
}

impl PatternMatch {
    /// Complaints in the pattern, counting the current one.
    pub fn total_complaints(&self) -> u32 {
        self.other_complaints + 1
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PatternDetector {
    window_days: i64,
    min_other_complaints: u32,
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new(PATTERN_WINDOW_DAYS, PATTERN_MIN_PRIOR_COMPLAINTS)
    }
}

impl PatternDetector {
    pub fn new(window_days: i64, min_other_complaints: u32) -> Self {
        Self {
            window_days,
            min_other_complaints,
        }
    }

    pub fn from_thresholds(t: &AlertThresholds) -> Self {
        Self::new(t.pattern_window_days, t.pattern_min_prior)
    }

    /// Match for `complaint` in the window `[now - window, now]`, excluding the
    /// complaint itself. None if it has no accused account or too few matches.
    pub fn detect(
        &self,
        store: &CaseStore,
        complaint: &Complaint,
        now: DateTime<Utc>,
    ) -> EscalationResult<Option<PatternMatch>> {
        let Some(account) = complaint.accused_account() else {
            return Ok(None);
        };
        // A window too wide to represent reaches back to the earliest instant.
        let since = Duration::try_days(self.window_days)
            .and_then(|w| now.checked_sub_signed(w))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let others = store.count_recent_matches(account, &complaint.complaint_id, since, now)?;
        log::debug!(
            "pattern check {}: {others} other complaint(s) against {account} in {} day(s)",
            complaint.complaint_id,
            self.window_days
        );
        if others < self.min_other_complaints {
            return Ok(None);
        }
        Ok(Some(PatternMatch {
            accused_account: account.to_string(),
            other_complaints: others,
            window_days: self.window_days,
        }))
    }
}
