//! The escalation engine: decides who hears about a fraud complaint.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. golden_hour          (transaction within the golden-hour window)
//!   2. high_amount          (amount lost >= high-value threshold)
//!   3. bank_freeze          (accused account present)
//!   4. i4c_sync             (always)
//!   5. police_station       (always)
//!   6. district_cyber_cell  (always)
//!   7. pattern_alert        (pattern detector reports a match)
//!
//! RULES:
//!   - Rules run in registration order, one complaint per invocation.
//!   - A rule whose predicate is false is skipped and absent from the report.
//!   - A failing rule is recorded as failed; it never stops later rules.
//!   - The only error that escapes `trigger_alerts` is an unknown complaint
//!     (or a store failure while loading it).
//!   - Flag changes go through compare-and-swap store calls, so concurrent
//!     invocations for one complaint cannot duplicate a freeze or a pattern alert.

use crate::{
    case::{AlertStatus, BankAction},
    clock::Clock,
    config::{Authority, EscalationConfig},
    dispatcher::{Delivery, Dispatcher},
    error::{EscalationError, EscalationResult},
    outcome::{AlertKind, EscalationReport, RuleOutcome},
    pattern::PatternDetector,
    rules::{
        BankFreezeRule, DistrictCyberCellRule, EscalationRule, GoldenHourRule, HighValueRule,
        NationalSyncRule, PatternAlertRule, PoliceStationRule, RuleContext,
    },
    store::CaseStore,
    transport::NotificationTransport,
    types::{BankActionId, BankActionStatus, CaseStatus, MessagePriority},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag. Once set, no further rules start; sends already
/// in flight are allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct EscalationEngine {
    config: EscalationConfig,
    store: Arc<CaseStore>,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
    rules: Vec<Box<dyn EscalationRule>>,
}

impl EscalationEngine {
    /// Build a fully wired engine with every rule registered in order.
    pub fn new(
        store: Arc<CaseStore>,
        transport: Arc<dyn NotificationTransport>,
        clock: Arc<dyn Clock>,
        config: EscalationConfig,
    ) -> Self {
        let dispatcher = Dispatcher::new(
            transport,
            Arc::clone(&store),
            config.transport.timeout(),
            config.identity.from_address.clone(),
        );
        let detector = PatternDetector::from_thresholds(&config.thresholds);
        let mut engine = Self {
            config,
            store,
            dispatcher,
            clock,
            rules: Vec::new(),
        };

        // EXECUTION ORDER: see module docs.
        engine.register(Box::new(GoldenHourRule));
        engine.register(Box::new(HighValueRule));
        engine.register(Box::new(BankFreezeRule));
        engine.register(Box::new(NationalSyncRule));
        engine.register(Box::new(PoliceStationRule));
        engine.register(Box::new(DistrictCyberCellRule));
        engine.register(Box::new(PatternAlertRule::new(detector)));
        engine
    }

    fn register(&mut self, rule: Box<dyn EscalationRule>) {
        debug_assert!(
            self.rules.last().map_or(true, |r| r.kind() < rule.kind()),
            "rules must be registered in evaluation order"
        );
        self.rules.push(rule);
    }

    pub fn store(&self) -> &CaseStore {
        &self.store
    }

    /// Evaluate every rule for `complaint_id` and report what was attempted.
    pub fn trigger_alerts(&self, complaint_id: &str) -> EscalationResult<EscalationReport> {
        self.trigger_alerts_until(complaint_id, &CancelToken::new())
    }

    /// As [`trigger_alerts`](Self::trigger_alerts), checking `cancel` before
    /// each rule starts.
    pub fn trigger_alerts_until(
        &self,
        complaint_id: &str,
        cancel: &CancelToken,
    ) -> EscalationResult<EscalationReport> {
        let complaint = self.store.require_complaint(complaint_id)?;
        let ctx = RuleContext {
            complaint: &complaint,
            now: self.clock.now(),
            config: &self.config,
            store: &self.store,
            dispatcher: &self.dispatcher,
        };

        let mut report = EscalationReport::new(complaint_id);
        for rule in &self.rules {
            if cancel.is_cancelled() {
                log::warn!(
                    "Escalation of {complaint_id} cancelled before {}",
                    rule.kind()
                );
                report.cancelled = true;
                break;
            }
            if let Some(outcome) = Self::evaluate(rule.as_ref(), &ctx) {
                report.outcomes.insert(rule.kind(), outcome);
            }
        }

        let summary = report.summary();
        log::info!(
            "Escalated {complaint_id}: {} attempted, {} ok, {} failed [{}]",
            summary.total,
            summary.successful,
            summary.failed,
            report
                .attempted()
                .iter()
                .map(AlertKind::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(report)
    }

    /// None when the rule's predicate is false. A predicate that cannot be
    /// evaluated counts as an attempted, failed rule.
    fn evaluate(rule: &dyn EscalationRule, ctx: &RuleContext<'_>) -> Option<RuleOutcome> {
        match rule.applies(ctx) {
            Ok(false) => None,
            Ok(true) => Some(Self::execute(rule, ctx)),
            Err(e) => {
                log::warn!(
                    "{} predicate failed for {}: {e}",
                    rule.kind(),
                    ctx.complaint.complaint_id
                );
                Some(RuleOutcome::failed(
                    format!("predicate could not be evaluated: {e}"),
                    vec![],
                ))
            }
        }
    }

    fn execute(rule: &dyn EscalationRule, ctx: &RuleContext<'_>) -> RuleOutcome {
        match rule.execute(ctx) {
            Ok(outcome) => {
                if let Some(detail) = &outcome.detail {
                    log::debug!("{} for {}: {detail}", rule.kind(), ctx.complaint.complaint_id);
                }
                outcome
            }
            Err(e) => {
                if e.is_transport() {
                    log::warn!("{} failed for {}: {e}", rule.kind(), ctx.complaint.complaint_id);
                } else {
                    log::error!("{} failed for {}: {e}", rule.kind(), ctx.complaint.complaint_id);
                }
                RuleOutcome::failed(e.to_string(), vec![])
            }
        }
    }

    /// Run one rule on demand, skipping its predicate. A bank freeze still
    /// needs both the accused account and bank.
    pub fn trigger_single(
        &self,
        complaint_id: &str,
        kind: AlertKind,
    ) -> EscalationResult<RuleOutcome> {
        let complaint = self.store.require_complaint(complaint_id)?;
        if kind == AlertKind::BankFreeze
            && (complaint.accused_account().is_none() || complaint.accused_bank.is_none())
        {
            return Err(EscalationError::MissingAccusedAccount {
                complaint_id: complaint_id.to_string(),
            });
        }
        let rule = self
            .rules
            .iter()
            .find(|r| r.kind() == kind)
            .ok_or_else(|| anyhow::anyhow!("no rule registered for {kind}"))?;
        let ctx = RuleContext {
            complaint: &complaint,
            now: self.clock.now(),
            config: &self.config,
            store: &self.store,
            dispatcher: &self.dispatcher,
        };
        Ok(Self::execute(rule.as_ref(), &ctx))
    }

    /// Email an officer-written message to a named authority
    /// (`CYBER_CELL`, `I4C_NATIONAL`, `DGP_OFFICE`, `RBI_NODAL`).
    pub fn send_manual_alert(
        &self,
        complaint_id: &str,
        authority: &str,
        message: &str,
    ) -> EscalationResult<Delivery> {
        let authority = Authority::parse(authority)?;
        self.store.require_complaint(complaint_id)?;
        let contact = self.config.authorities.contact(authority);
        let delivery = self.dispatcher.email(
            complaint_id,
            [contact.email.as_str()],
            &format!("Manual Alert - {complaint_id}"),
            message,
            MessagePriority::Normal,
            self.clock.now(),
        );
        log::info!(
            "Manual alert for {complaint_id} to {}: delivered={}",
            authority.as_str(),
            delivery.delivered
        );
        Ok(delivery)
    }

    pub fn alert_status(&self, complaint_id: &str) -> EscalationResult<AlertStatus> {
        let complaint = self.store.require_complaint(complaint_id)?;
        Ok(AlertStatus::from(&complaint))
    }

    /// Apply a bank's reply to a freeze (or other) request.
    pub fn record_bank_response(
        &self,
        action_id: BankActionId,
        status: BankActionStatus,
        bank_reference: Option<&str>,
    ) -> EscalationResult<BankAction> {
        let action = self
            .store
            .record_bank_response(action_id, status, bank_reference, self.clock.now())?;
        log::info!(
            "Bank action {action_id} for {} resolved as {status}",
            action.complaint_id
        );
        Ok(action)
    }

    /// Move a complaint along the status table; returns the previous status.
    pub fn transition_status(
        &self,
        complaint_id: &str,
        to: CaseStatus,
    ) -> EscalationResult<CaseStatus> {
        let from = self.store.transition_status(complaint_id, to)?;
        log::info!("{complaint_id}: status {from} -> {to}");
        Ok(from)
    }
}
