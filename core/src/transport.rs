//! Notification transport: the email / SMS capability set.
//!
//! Rules never talk to a provider directly. They hand messages to the
//! [`Dispatcher`](crate::dispatcher::Dispatcher), which drives whichever
//! `NotificationTransport` the deployment injected.

use crate::{
    error::{EscalationError, EscalationResult},
    types::{Channel, MessagePriority},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: BTreeSet<String>,
    pub subject: String,
    pub body: String,
    pub priority: MessagePriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
}

/// A pluggable delivery provider. Each call is one at-least-once attempt.
pub trait NotificationTransport: Send + Sync {
    /// Stable provider name, used in logs.
    fn name(&self) -> &'static str;

    fn send_email(&self, email: &EmailMessage) -> EscalationResult<()>;

    fn send_sms(&self, sms: &SmsMessage) -> EscalationResult<()>;
}

// ── Log-only provider ──────────────────────────────────────────────

/// Accepts every message and writes it to the log. The default when no live
/// provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

impl NotificationTransport for LogTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    fn send_email(&self, email: &EmailMessage) -> EscalationResult<()> {
        let to = email.to.iter().cloned().collect::<Vec<_>>().join(", ");
        log::info!(
            "EMAIL [{}] {} -> {to}: {}",
            email.priority,
            email.from,
            email.subject
        );
        log::debug!("EMAIL body:\n{}", email.body);
        Ok(())
    }

    fn send_sms(&self, sms: &SmsMessage) -> EscalationResult<()> {
        log::info!("SMS -> {}: {}", sms.to, sms.body);
        Ok(())
    }
}

// ── HTTP gateway provider ──────────────────────────────────────────

/// Delivers through an HTTP messaging gateway: each message is POSTed as JSON
/// to the email or SMS endpoint. Credentials are supplied by the caller.
pub struct HttpGatewayTransport {
    client: reqwest::blocking::Client,
    email_endpoint: String,
    sms_endpoint: String,
    bearer_token: Option<String>,
}

impl HttpGatewayTransport {
    pub fn new(
        email_endpoint: impl Into<String>,
        sms_endpoint: impl Into<String>,
        request_timeout: Duration,
    ) -> EscalationResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| EscalationError::Config(format!("cannot build gateway client: {e}")))?;
        Ok(Self {
            client,
            email_endpoint: email_endpoint.into(),
            sms_endpoint: sms_endpoint.into(),
            bearer_token: None,
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    fn post<T: Serialize>(&self, channel: Channel, endpoint: &str, body: &T) -> EscalationResult<()> {
        let mut request = self.client.post(endpoint).json(body);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().map_err(|e| EscalationError::TransportFailure {
            channel,
            reason: e.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(EscalationError::TransportFailure {
                channel,
                reason: format!("gateway answered {status}"),
            });
        }
        Ok(())
    }
}

impl NotificationTransport for HttpGatewayTransport {
    fn name(&self) -> &'static str {
        "http-gateway"
    }

    fn send_email(&self, email: &EmailMessage) -> EscalationResult<()> {
        self.post(Channel::Email, &self.email_endpoint, email)
    }

    fn send_sms(&self, sms: &SmsMessage) -> EscalationResult<()> {
        self.post(Channel::Sms, &self.sms_endpoint, sms)
    }
}

// ── In-memory double ───────────────────────────────────────────────

/// Records every accepted message. Failures and latency can be injected per
/// channel to exercise delivery-failure paths.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    emails: Mutex<Vec<EmailMessage>>,
    sms: Mutex<Vec<SmsMessage>>,
    fail_email: AtomicBool,
    fail_sms: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_email(&self, fail: bool) {
        self.fail_email.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_sms(&self, fail: bool) {
        self.fail_sms.store(fail, Ordering::SeqCst);
    }

    /// Delay every send by `latency` before it is accepted.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    pub fn emails(&self) -> Vec<EmailMessage> {
        self.emails.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sms(&self) -> Vec<SmsMessage> {
        self.sms.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Emails whose subject contains `needle`.
    pub fn emails_with_subject(&self, needle: &str) -> Vec<EmailMessage> {
        self.emails()
            .into_iter()
            .filter(|e| e.subject.contains(needle))
            .collect()
    }

    fn wait(&self) {
        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(latency) = latency {
            std::thread::sleep(latency);
        }
    }
}

impl NotificationTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn send_email(&self, email: &EmailMessage) -> EscalationResult<()> {
        self.wait();
        if self.fail_email.load(Ordering::SeqCst) {
            return Err(EscalationError::TransportFailure {
                channel: Channel::Email,
                reason: "injected email failure".to_string(),
            });
        }
        self.emails
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(email.clone());
        Ok(())
    }

    fn send_sms(&self, sms: &SmsMessage) -> EscalationResult<()> {
        self.wait();
        if self.fail_sms.load(Ordering::SeqCst) {
            return Err(EscalationError::TransportFailure {
                channel: Channel::Sms,
                reason: "injected sms failure".to_string(),
            });
        }
        self.sms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(sms.clone());
        Ok(())
    }
}
