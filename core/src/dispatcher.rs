//! Bounded, recorded delivery on top of a [`NotificationTransport`].
//!
//! Each send runs on its own worker thread and the caller waits at most the
//! configured timeout. A send that overruns counts as failed for the caller,
//! but the worker is left to finish, so a message already handed to the
//! provider is not cut off mid-flight.
//!
//! Every attempt is persisted as one `notification` row per recipient.

use crate::{
    error::{EscalationError, EscalationResult},
    store::CaseStore,
    transport::{EmailMessage, NotificationTransport, SmsMessage},
    types::{Channel, MessagePriority, NotificationStatus},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Outcome of one send attempt on one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub channel: Channel,
    pub recipients: Vec<String>,
    pub delivered: bool,
    /// The send overran the timeout: the provider may still accept it, so the
    /// outcome is unknown rather than rejected.
    #[serde(default)]
    pub timed_out: bool,
    pub error: Option<String>,
}

pub struct Dispatcher {
    transport: Arc<dyn NotificationTransport>,
    store: Arc<CaseStore>,
    timeout: Duration,
    from_address: String,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn NotificationTransport>,
        store: Arc<CaseStore>,
        timeout: Duration,
        from_address: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            timeout,
            from_address: from_address.into(),
        }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Send one email to every address in `to` (duplicates collapse).
    pub fn email<I, S>(
        &self,
        complaint_id: &str,
        to: I,
        subject: &str,
        body: &str,
        priority: MessagePriority,
        at: DateTime<Utc>,
    ) -> Delivery
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let email = EmailMessage {
            from: self.from_address.clone(),
            to: to.into_iter().map(Into::into).collect::<BTreeSet<String>>(),
            subject: subject.to_string(),
            body: body.to_string(),
            priority,
        };
        let recipients: Vec<String> = email.to.iter().cloned().collect();
        let result = if recipients.is_empty() {
            Err(EscalationError::TransportFailure {
                channel: Channel::Email,
                reason: "no recipients".to_string(),
            })
        } else {
            self.run(Channel::Email, move |t| t.send_email(&email))
        };
        let record = format!("{subject}\n\n{body}");
        self.finish(complaint_id, Channel::Email, recipients, &record, result, at)
    }

    pub fn sms(&self, complaint_id: &str, to: &str, body: &str, at: DateTime<Utc>) -> Delivery {
        let sms = SmsMessage {
            to: to.to_string(),
            body: body.to_string(),
        };
        let result = self.run(Channel::Sms, move |t| t.send_sms(&sms));
        self.finish(complaint_id, Channel::Sms, vec![to.to_string()], body, result, at)
    }

    fn run<F>(&self, channel: Channel, send: F) -> EscalationResult<()>
    where
        F: FnOnce(&dyn NotificationTransport) -> EscalationResult<()> + Send + 'static,
    {
        let transport = Arc::clone(&self.transport);
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name(format!("send-{}", channel.as_str().to_lowercase()))
            .spawn(move || {
                // The receiver is gone if the caller already timed out.
                let _ = tx.send(send(transport.as_ref()));
            })
            .map_err(|e| EscalationError::TransportFailure {
                channel,
                reason: format!("cannot start sender: {e}"),
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(EscalationError::TransportTimeout {
                channel,
                timeout_ms: self.timeout.as_millis() as u64,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(EscalationError::TransportFailure {
                channel,
                reason: "sender exited without a result".to_string(),
            }),
        }
    }

    fn finish(
        &self,
        complaint_id: &str,
        channel: Channel,
        recipients: Vec<String>,
        message: &str,
        result: EscalationResult<()>,
        at: DateTime<Utc>,
    ) -> Delivery {
        let (status, error) = match &result {
            Ok(()) => (NotificationStatus::Sent, None),
            Err(e) => {
                log::warn!(
                    "{channel} to [{}] for {complaint_id} via {} failed: {e}",
                    recipients.join(", "),
                    self.transport.name()
                );
                (NotificationStatus::Failed, Some(e.to_string()))
            }
        };
        for recipient in &recipients {
            if let Err(e) = self
                .store
                .create_notification(complaint_id, channel, recipient, message, status, at)
            {
                log::warn!("Could not record {channel} notification for {complaint_id}: {e}");
            }
        }
        Delivery {
            channel,
            recipients,
            delivered: result.is_ok(),
            timed_out: matches!(result, Err(EscalationError::TransportTimeout { .. })),
            error,
        }
    }
}
