//! IRC channel adapter implementation.
//!
//! Implements [`ChannelAdapter`] for IRC messaging.
//! This is a properly-typed skeleton -- the actual IRC protocol client
//! integration will be added when the `irc` crate is brought in as a
//! dependency.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use clawft_plugin::error::PluginError;
use clawft_plugin::message::MessagePayload;
use clawft_plugin::traits::{ChannelAdapter, ChannelAdapterHost};

use super::types::{validate_config, IrcAdapterConfig};

/// IRC channel adapter.
///
/// Connects to an IRC server and bridges messages between IRC channels
/// and the clawft agent pipeline.
///
/// **Status**: Skeleton implementation. The IRC protocol client will be
/// integrated when the `irc` crate is added as a dependency.
pub struct IrcChannelAdapter {
    config: IrcAdapterConfig,
}

impl IrcChannelAdapter {
    /// Create a new IRC channel adapter with the given configuration.
    pub fn new(config: IrcAdapterConfig) -> Self {
        Self { config }
    }

    /// Check if a sender nickname is in the allow list.
    ///
    /// If `allowed_senders` is empty, all senders are allowed.
    /// Otherwise, the sender must match one of the entries exactly.
    pub fn is_sender_allowed(&self, sender: &str) -> bool {
        if self.config.allowed_senders.is_empty() {
            return true;
        }
        self.config.allowed_senders.iter().any(|s| s == sender)
    }

    /// Validate the adapter configuration, returning a `PluginError`
    /// on failure.
    fn validate(&self) -> Result<(), PluginError> {
        validate_config(&self.config).map_err(PluginError::LoadFailed)
    }
}

#[async_trait]
impl ChannelAdapter for IrcChannelAdapter {
    fn name(&self) -> &str {
        "irc"
    }

    fn display_name(&self) -> &str {
        "IRC"
    }

    fn supports_threads(&self) -> bool {
        false
    }

    fn supports_media(&self) -> bool {
        false
    }

    async fn start(
        &self,
        _host: Arc<dyn ChannelAdapterHost>,
        cancel: CancellationToken,
    ) -> Result<(), PluginError> {
        info!("IRC channel adapter starting");

        self.validate()?;

        // TODO: Connect to the IRC server using an IRC client library.
        //
        // In production, this would:
        // 1. Establish a TCP (or TLS) connection to `self.config.server:self.config.port`
        // 2. Authenticate using the configured `auth_method`
        // 3. Join all channels listed in `self.config.channels`
        // 4. Listen for PRIVMSG events and forward them to host.deliver_inbound()
        // 5. Handle reconnection with `self.config.reconnect_delay_secs`
        //
        // The actual IRC protocol client will be integrated when the `irc`
        // crate is added as a dependency.
        debug!(
            server = %self.config.server,
            port = self.config.port,
            use_tls = self.config.use_tls,
            nickname = %self.config.nickname,
            channels = ?self.config.channels,
            auth_method = %self.config.auth_method,
            "IRC connection would be established here (stub)"
        );

        cancel.cancelled().await;
        info!("IRC channel adapter shutting down");
        Ok(())
    }

    async fn send(
        &self,
        target: &str,
        payload: &MessagePayload,
    ) -> Result<String, PluginError> {
        // IRC only supports text payloads.
        let content = match payload {
            MessagePayload::Text { content } => content,
            MessagePayload::Binary { .. } => {
                return Err(PluginError::ExecutionFailed(
                    "irc: binary payloads are not supported (IRC is text-only)".into(),
                ));
            }
            MessagePayload::Structured { .. } => {
                return Err(PluginError::ExecutionFailed(
                    "irc: structured payloads are not supported (IRC is text-only)".into(),
                ));
            }
        };

        // TODO: Send the message using the connected IRC client.
        //
        // In production, this would issue a PRIVMSG command:
        //   PRIVMSG <target> :<content>
        //
        // For now, we return an error indicating the client is not
        // connected since no real IRC client is instantiated.
        debug!(
            to = %target,
            content_len = content.len(),
            "would send IRC PRIVMSG (stub -- client not connected)"
        );

        // Stub: return a synthetic message ID.
        // In a real implementation, this would only succeed when the
        // client is connected and the PRIVMSG has been sent.
        let msg_id = format!(
            "irc-{}-{}",
            target,
            chrono::Utc::now().timestamp_millis()
        );
        Ok(msg_id)
    }
}
