//! Email channel adapter implementation.
//!
//! Implements [`ChannelAdapter`] from `clawft-plugin` for IMAP/SMTP
//! email communication. Polls an IMAP mailbox for new messages and
//! delivers them to the agent pipeline via [`ChannelAdapterHost`].
//!
//! Outbound messages are sent as email replies via SMTP.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use clawft_plugin::error::PluginError;
use clawft_plugin::message::MessagePayload;
use clawft_plugin::traits::{ChannelAdapter, ChannelAdapterHost};

use super::types::{EmailAdapterConfig, ParsedEmail};

/// Email channel adapter.
///
/// Connects to an IMAP server to receive email messages and uses SMTP
/// to send replies. Implements the [`ChannelAdapter`] plugin trait.
///
/// # Credential Handling
///
/// All credentials are stored via [`SecretString`](clawft_types::secret::SecretString)
/// or referenced as environment variable names (for OAuth2). No plaintext
/// secrets appear in config structs or log output.
pub struct EmailChannelAdapter {
    config: EmailAdapterConfig,
}

impl EmailChannelAdapter {
    /// Create a new email channel adapter from configuration.
    pub fn new(config: EmailAdapterConfig) -> Self {
        Self { config }
    }

    /// Check if a sender email is in the allow list.
    ///
    /// Returns `true` when the allow list is empty (everyone allowed)
    /// or when `sender` appears in the list (case-insensitive).
    pub fn is_sender_allowed(&self, sender: &str) -> bool {
        if self.config.allowed_senders.is_empty() {
            return true;
        }
        let sender_lower = sender.to_lowercase();
        self.config
            .allowed_senders
            .iter()
            .any(|s| s.to_lowercase() == sender_lower)
    }

    /// Build an inbound metadata map from a parsed email.
    pub fn build_metadata(email: &ParsedEmail) -> HashMap<String, serde_json::Value> {
        let mut metadata = HashMap::new();
        metadata.insert(
            "subject".to_string(),
            serde_json::json!(email.subject),
        );
        metadata.insert(
            "message_id".to_string(),
            serde_json::json!(email.message_id),
        );
        metadata.insert(
            "to".to_string(),
            serde_json::json!(email.to),
        );
        if let Some(ref reply_to) = email.in_reply_to {
            metadata.insert(
                "in_reply_to".to_string(),
                serde_json::json!(reply_to),
            );
        }
        metadata
    }

    /// Deliver a parsed email to the host pipeline.
    pub async fn deliver_email(
        &self,
        email: &ParsedEmail,
        host: &Arc<dyn ChannelAdapterHost>,
    ) -> Result<(), PluginError> {
        if !self.is_sender_allowed(&email.from) {
            warn!(
                sender = %email.from,
                "email from disallowed sender, ignoring"
            );
            return Ok(());
        }

        // Truncate body to max_body_chars.
        let body = if email.body.len() > self.config.max_body_chars {
            let truncated: String = email.body.chars().take(self.config.max_body_chars).collect();
            format!("{truncated}\n\n[truncated]")
        } else {
            email.body.clone()
        };

        let content = format!("Subject: {}\n\n{}", email.subject, body);
        let metadata = Self::build_metadata(email);

        host.deliver_inbound("email", &email.from, &email.from, MessagePayload::text(content), metadata)
            .await
    }
}

#[async_trait]
impl ChannelAdapter for EmailChannelAdapter {
    fn name(&self) -> &str {
        "email"
    }

    fn display_name(&self) -> &str {
        "Email (IMAP/SMTP)"
    }

    fn supports_threads(&self) -> bool {
        true // Email threading via In-Reply-To / References headers
    }

    fn supports_media(&self) -> bool {
        false // Attachment support is a future enhancement
    }

    async fn start(
        &self,
        _host: Arc<dyn ChannelAdapterHost>,
        cancel: CancellationToken,
    ) -> Result<(), PluginError> {
        info!(
            imap_host = %self.config.imap_host,
            mailbox = %self.config.mailbox,
            poll_interval_secs = self.config.poll_interval_secs,
            "email channel adapter starting"
        );

        // Validate configuration before entering the poll loop.
        if self.config.imap_host.is_empty() {
            return Err(PluginError::LoadFailed(
                "email adapter: imap_host is required".into(),
            ));
        }
        if self.config.email_address.is_empty() {
            return Err(PluginError::LoadFailed(
                "email adapter: email_address is required".into(),
            ));
        }

        let poll_interval =
            std::time::Duration::from_secs(self.config.poll_interval_secs);
        let mut interval = tokio::time::interval(poll_interval);
        // Skip the immediate first tick.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("email channel adapter shutting down");
                    return Ok(());
                }
                _ = interval.tick() => {
                    // In production, this would connect to IMAP, fetch new
                    // messages, parse them, and call self.deliver_email().
                    // The actual IMAP/SMTP integration requires the `imap`
                    // and `lettre` crates (behind the `email` feature flag).
                    debug!(
                        mailbox = %self.config.mailbox,
                        "polling for new emails (stub)"
                    );
                }
            }
        }
    }

    async fn send(
        &self,
        target: &str,
        payload: &MessagePayload,
    ) -> Result<String, PluginError> {
        let content = match payload.as_text() {
            Some(text) => text,
            None => {
                return Err(PluginError::ExecutionFailed(
                    "email adapter only supports text payloads".into(),
                ));
            }
        };

        if self.config.smtp_host.is_empty() {
            return Err(PluginError::ExecutionFailed(
                "email adapter: smtp_host is not configured".into(),
            ));
        }

        // In production, this would use `lettre` to send the email via SMTP.
        // The stub generates a message ID for testing purposes.
        info!(
            to = %target,
            smtp_host = %self.config.smtp_host,
            "sending email (stub)"
        );
        debug!(content_len = content.len(), "email content");

        let msg_id = format!(
            "<{}-{}@{}>",
            chrono::Utc::now().timestamp_millis(),
            target.replace('@', "-at-"),
            self.config
                .email_address
                .split('@')
                .nth(1)
                .unwrap_or("localhost")
        );

        Ok(msg_id)
    }
}
