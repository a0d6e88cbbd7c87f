//! WhatsApp channel adapter implementation.
//!
//! Implements [`ChannelAdapter`] for WhatsApp Cloud API communication.
//! Uses webhook for inbound messages and REST API for outbound.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use clawft_plugin::error::PluginError;
use clawft_plugin::message::MessagePayload;
use clawft_plugin::traits::{ChannelAdapter, ChannelAdapterHost};

use super::types::WhatsAppAdapterConfig;

/// WhatsApp channel adapter using the Cloud API.
pub struct WhatsAppChannelAdapter {
    config: WhatsAppAdapterConfig,
}

impl WhatsAppChannelAdapter {
    /// Create a new WhatsApp channel adapter.
    pub fn new(config: WhatsAppAdapterConfig) -> Self {
        Self { config }
    }

    /// Check if a phone number is in the allow list.
    pub fn is_number_allowed(&self, number: &str) -> bool {
        if self.config.allowed_numbers.is_empty() {
            return true;
        }
        self.config.allowed_numbers.iter().any(|n| n == number)
    }
}

#[async_trait]
impl ChannelAdapter for WhatsAppChannelAdapter {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn display_name(&self) -> &str {
        "WhatsApp"
    }

    fn supports_threads(&self) -> bool {
        false
    }

    fn supports_media(&self) -> bool {
        true
    }

    async fn start(
        &self,
        _host: Arc<dyn ChannelAdapterHost>,
        cancel: CancellationToken,
    ) -> Result<(), PluginError> {
        info!("WhatsApp channel adapter starting");

        if self.config.phone_number_id.is_empty() {
            return Err(PluginError::LoadFailed(
                "whatsapp adapter: phone_number_id is required".into(),
            ));
        }
        if self.config.access_token.is_empty() {
            return Err(PluginError::LoadFailed(
                "whatsapp adapter: access_token is required".into(),
            ));
        }

        // In production, this would set up a webhook listener for
        // incoming message notifications from the WhatsApp Cloud API.
        cancel.cancelled().await;
        info!("WhatsApp channel adapter shutting down");
        Ok(())
    }

    async fn send(
        &self,
        target: &str,
        payload: &MessagePayload,
    ) -> Result<String, PluginError> {
        let content = payload.as_text().ok_or_else(|| {
            PluginError::ExecutionFailed("whatsapp: only text payloads supported".into())
        })?;

        if self.config.phone_number_id.is_empty() {
            return Err(PluginError::ExecutionFailed(
                "whatsapp: phone_number_id not configured".into(),
            ));
        }

        // In production, this would POST to the WhatsApp Cloud API:
        // POST /{api_version}/{phone_number_id}/messages
        debug!(
            to = %target,
            content_len = content.len(),
            "sending WhatsApp message (stub)"
        );

        let msg_id = format!("wamid.{}", chrono::Utc::now().timestamp_millis());
        Ok(msg_id)
    }
}
