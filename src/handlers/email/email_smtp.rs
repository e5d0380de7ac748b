use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::{debug, info, warn};

use crate::{
    config::RelayConfig,
    utils::utils_transports::{create_smtp_relay, RelayEnvelope, RelayTransport},
};

use super::{
    email_normalizer::{envelope_recipients, parse_raw, sender_address},
    models::RawMessageRecord,
};

/// Result of offering one message to the forwarder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    Sent { recipients: usize },
    Disabled,
    SkippedAlreadyProcessed,
    SkippedNoPayload,
    SkippedNoRecipients,
    FailedParse,
    FailedTransport(String),
}

impl ForwardOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, ForwardOutcome::Sent { .. })
    }
}

/// Re-sends captured messages to an SMTP relay, each identifier at most
/// once for the lifetime of the forwarder.
pub struct SmtpForwarder {
    relay: Option<Arc<dyn RelayTransport>>,
    processed: Mutex<HashSet<String>>,
}

impl SmtpForwarder {
    pub fn new(relay: Option<Arc<dyn RelayTransport>>) -> Self {
        Self {
            relay,
            processed: Mutex::new(HashSet::new()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        if config.enabled {
            info!(host = %config.host, port = config.port, "SMTP forwarding enabled");
            Self::new(Some(Arc::new(create_smtp_relay(&config.host, config.port))))
        } else {
            info!("SMTP forwarding disabled");
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.relay.is_some()
    }

    pub fn is_processed(&self, id: &str) -> bool {
        self.ledger().contains(id)
    }

    /// Clears the ledger so every identifier becomes eligible again.
    /// Returns how many identifiers were dropped.
    pub fn reset(&self) -> usize {
        let mut ledger = self.ledger();
        let cleared = ledger.len();
        ledger.clear();
        info!(cleared, "Forwarding ledger reset");
        cleared
    }

    pub async fn forward_batch(&self, records: &[RawMessageRecord]) -> usize {
        if !self.is_enabled() {
            return 0;
        }

        let mut forwarded = 0;
        for record in records {
            if self.forward_message(record).await.is_sent() {
                forwarded += 1;
            }
        }
        forwarded
    }

    pub async fn forward_message(&self, record: &RawMessageRecord) -> ForwardOutcome {
        let relay = match &self.relay {
            Some(relay) => relay,
            None => return ForwardOutcome::Disabled,
        };

        // Claiming up front marks the message processed whatever happens next.
        if !self.ledger().insert(record.id.clone()) {
            return ForwardOutcome::SkippedAlreadyProcessed;
        }

        let raw = match record.raw_payload() {
            Some(raw) => raw,
            None => {
                debug!(id = %record.id, "Message has no raw data, skipping SMTP forward");
                return ForwardOutcome::SkippedNoPayload;
            }
        };

        let (subject, envelope) = match parse_raw(raw) {
            Some(message) => (
                message.subject().unwrap_or_default().to_string(),
                RelayEnvelope {
                    from: sender_address(&message).or_else(|| record.source.clone()),
                    to: envelope_recipients(&message),
                },
            ),
            None => {
                warn!(id = %record.id, "Failed to parse message, skipping SMTP forward");
                return ForwardOutcome::FailedParse;
            }
        };

        if envelope.to.is_empty() {
            debug!(id = %record.id, "Message has no recipients, skipping SMTP forward");
            return ForwardOutcome::SkippedNoRecipients;
        }

        match relay.send_raw(&envelope, raw.as_bytes()).await {
            Ok(()) => {
                info!(
                    id = %record.id,
                    subject = %subject,
                    recipients = envelope.to.len(),
                    "Forwarded email to SMTP"
                );
                ForwardOutcome::Sent {
                    recipients: envelope.to.len(),
                }
            }
            Err(err) => {
                warn!(id = %record.id, error = %err, "Failed to forward message to SMTP");
                ForwardOutcome::FailedTransport(err.to_string())
            }
        }
    }

    fn ledger(&self) -> MutexGuard<'_, HashSet<String>> {
        self.processed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::error::RelayError;

    #[derive(Default)]
    struct RecordingRelay {
        fail: bool,
        sent: Mutex<Vec<(RelayEnvelope, Vec<u8>)>>,
    }

    #[async_trait]
    impl RelayTransport for RecordingRelay {
        async fn send_raw(&self, envelope: &RelayEnvelope, raw: &[u8]) -> Result<(), RelayError> {
            tokio::task::yield_now().await;
            if self.fail {
                return Err(RelayError::Smtp("SMTP error".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((envelope.clone(), raw.to_vec()));
            Ok(())
        }
    }

    fn enabled(relay: Arc<RecordingRelay>) -> SmtpForwarder {
        SmtpForwarder::new(Some(relay))
    }

    fn record(value: serde_json::Value) -> RawMessageRecord {
        serde_json::from_value(value).unwrap()
    }

    fn raw_message(id: &str, raw: &str) -> RawMessageRecord {
        record(json!({ "Id": id, "Source": "sender@example.com", "RawData": raw }))
    }

    const SIMPLE_EML: &str = "From: sender@example.com\nTo: recipient@example.com\n\
Subject: Test Email\nMIME-Version: 1.0\nContent-Type: text/plain\n\nTest body";

    #[tokio::test]
    async fn disabled_forwarder_does_not_touch_ledger() {
        let forwarder = SmtpForwarder::disabled();
        let message = raw_message("test-123", "test");

        assert_eq!(forwarder.forward_message(&message).await, ForwardOutcome::Disabled);
        assert_eq!(forwarder.forward_batch(&[message.clone(), message]).await, 0);
        assert!(!forwarder.is_processed("test-123"));
    }

    #[tokio::test]
    async fn message_without_raw_data_is_marked_processed() {
        let forwarder = enabled(Arc::new(RecordingRelay::default()));
        let message = record(json!({ "Id": "test-123", "Subject": "x" }));

        assert_eq!(
            forwarder.forward_message(&message).await,
            ForwardOutcome::SkippedNoPayload
        );
        assert!(forwarder.is_processed("test-123"));
    }

    #[tokio::test]
    async fn valid_message_is_relayed_with_original_payload() {
        let relay = Arc::new(RecordingRelay::default());
        let forwarder = enabled(relay.clone());

        let outcome = forwarder
            .forward_message(&raw_message("test-456", SIMPLE_EML))
            .await;

        assert_eq!(outcome, ForwardOutcome::Sent { recipients: 1 });
        assert!(forwarder.is_processed("test-456"));

        let sent = relay.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].0,
            RelayEnvelope {
                from: Some("sender@example.com".to_string()),
                to: vec!["recipient@example.com".to_string()],
            }
        );
        assert_eq!(sent[0].1, SIMPLE_EML.as_bytes());
    }

    #[tokio::test]
    async fn already_processed_message_is_not_sent_again() {
        let relay = Arc::new(RecordingRelay::default());
        let forwarder = enabled(relay.clone());
        let message = raw_message("test-123", SIMPLE_EML);

        assert!(forwarder.forward_message(&message).await.is_sent());
        assert_eq!(
            forwarder.forward_message(&message).await,
            ForwardOutcome::SkippedAlreadyProcessed
        );
        assert_eq!(relay.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn message_without_recipients_is_skipped() {
        let relay = Arc::new(RecordingRelay::default());
        let forwarder = enabled(relay.clone());
        let message = raw_message(
            "test-789",
            "From: sender@example.com\nSubject: Test Email\nMIME-Version: 1.0\n\nTest body",
        );

        assert_eq!(
            forwarder.forward_message(&message).await,
            ForwardOutcome::SkippedNoRecipients
        );
        assert!(forwarder.is_processed("test-789"));
        assert!(relay.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cc_and_bcc_only_message_is_forwarded() {
        let relay = Arc::new(RecordingRelay::default());
        let forwarder = enabled(relay.clone());
        let message = raw_message(
            "cc-only",
            "From: sender@example.com\nCc: cc@example.com\nBcc: bcc@example.com\nSubject: x\n\nBody",
        );

        assert_eq!(
            forwarder.forward_message(&message).await,
            ForwardOutcome::Sent { recipients: 2 }
        );
        let sent = relay.sent.lock().unwrap();
        assert_eq!(sent[0].0.to, vec!["cc@example.com", "bcc@example.com"]);
    }

    #[tokio::test]
    async fn missing_from_header_uses_record_source() {
        let relay = Arc::new(RecordingRelay::default());
        let forwarder = enabled(relay.clone());
        let message = record(json!({
            "Id": "no-from",
            "Source": "source@example.com",
            "RawData": "To: r@example.com\nSubject: x\n\nBody"
        }));

        assert!(forwarder.forward_message(&message).await.is_sent());
        let sent = relay.sent.lock().unwrap();
        assert_eq!(sent[0].0.from.as_deref(), Some("source@example.com"));
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let relay = Arc::new(RecordingRelay {
            fail: true,
            ..Default::default()
        });
        let forwarder = enabled(relay);
        let message = raw_message("test-error", SIMPLE_EML);

        assert!(matches!(
            forwarder.forward_message(&message).await,
            ForwardOutcome::FailedTransport(_)
        ));
        assert!(forwarder.is_processed("test-error"));
        assert_eq!(
            forwarder.forward_message(&message).await,
            ForwardOutcome::SkippedAlreadyProcessed
        );
    }

    #[tokio::test]
    async fn unparseable_payload_is_marked_processed_without_sending() {
        let relay = Arc::new(RecordingRelay::default());
        let forwarder = enabled(relay.clone());
        let message = raw_message("bad", " ");

        assert_eq!(
            forwarder.forward_message(&message).await,
            ForwardOutcome::FailedParse
        );
        assert!(forwarder.is_processed("bad"));
        assert!(relay.sent.lock().unwrap().is_empty());
        assert_eq!(
            forwarder.forward_message(&message).await,
            ForwardOutcome::SkippedAlreadyProcessed
        );
    }

    #[tokio::test]
    async fn concurrent_attempts_on_one_id_send_once() {
        let relay = Arc::new(RecordingRelay::default());
        let forwarder = enabled(relay.clone());
        let message = raw_message("race", SIMPLE_EML);

        let (first, second) = tokio::join!(
            forwarder.forward_message(&message),
            forwarder.forward_message(&message)
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|outcome| outcome.is_sent()).count(), 1);
        assert!(outcomes.contains(&ForwardOutcome::SkippedAlreadyProcessed));
        assert_eq!(relay.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn batch_forwards_each_message_once() {
        let relay = Arc::new(RecordingRelay::default());
        let forwarder = enabled(relay.clone());
        let batch = vec![
            raw_message("msg-1", "From: s@example.com\nTo: r1@example.com\nSubject: 1\n\nBody 1"),
            raw_message("msg-2", "From: s@example.com\nTo: r2@example.com\nSubject: 2\n\nBody 2"),
        ];

        assert_eq!(forwarder.forward_batch(&batch).await, 2);
        assert_eq!(forwarder.forward_batch(&batch).await, 0);
        assert_eq!(relay.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reset_makes_messages_eligible_again() {
        let relay = Arc::new(RecordingRelay::default());
        let forwarder = enabled(relay.clone());
        let message = raw_message("test-reset", SIMPLE_EML);

        forwarder.forward_message(&message).await;
        assert!(forwarder.is_processed("test-reset"));

        assert_eq!(forwarder.reset(), 1);
        assert!(!forwarder.is_processed("test-reset"));

        assert!(forwarder.forward_message(&message).await.is_sent());
        assert_eq!(relay.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn from_config_respects_enabled_flag() {
        let mut config = RelayConfig {
            enabled: false,
            host: "localhost".to_string(),
            port: 2525,
        };
        assert!(!SmtpForwarder::from_config(&config).is_enabled());

        config.enabled = true;
        assert!(SmtpForwarder::from_config(&config).is_enabled());
    }
}
