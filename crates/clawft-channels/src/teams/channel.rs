//! Microsoft Teams channel adapter implementation.
//!
//! Implements [`ChannelAdapter`] for Microsoft Teams via the
//! Bot Framework and Graph API. Uses Azure AD client credentials
//! for authentication.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use clawft_plugin::error::PluginError;
use clawft_plugin::message::MessagePayload;
use clawft_plugin::traits::{ChannelAdapter, ChannelAdapterHost};

use super::types::TeamsAdapterConfig;

/// Microsoft Teams channel adapter.
///
/// Connects to Teams via the Bot Framework for inbound messages
/// and the Graph API for outbound messages. Uses Azure AD
/// client credentials flow for authentication.
pub struct TeamsChannelAdapter {
    config: TeamsAdapterConfig,
}

impl TeamsChannelAdapter {
    /// Create a new Teams channel adapter.
    pub fn new(config: TeamsAdapterConfig) -> Self {
        Self { config }
    }

    /// Check if a user principal name is in the allow list.
    pub fn is_user_allowed(&self, upn: &str) -> bool {
        if self.config.allowed_users.is_empty() {
            return true;
        }
        let upn_lower = upn.to_lowercase();
        self.config
            .allowed_users
            .iter()
            .any(|u| u.to_lowercase() == upn_lower)
    }
}

#[async_trait]
impl ChannelAdapter for TeamsChannelAdapter {
    fn name(&self) -> &str {
        "teams"
    }

    fn display_name(&self) -> &str {
        "Microsoft Teams"
    }

    fn supports_threads(&self) -> bool {
        true // Teams supports threaded conversations
    }

    fn supports_media(&self) -> bool {
        false // Media support is a future enhancement
    }

    async fn start(
        &self,
        _host: Arc<dyn ChannelAdapterHost>,
        cancel: CancellationToken,
    ) -> Result<(), PluginError> {
        info!("Teams channel adapter starting");

        if self.config.tenant_id.is_empty() {
            return Err(PluginError::LoadFailed(
                "teams adapter: tenant_id is required".into(),
            ));
        }
        if self.config.client_id.is_empty() {
            return Err(PluginError::LoadFailed(
                "teams adapter: client_id is required".into(),
            ));
        }
        if self.config.client_secret.is_empty() {
            return Err(PluginError::LoadFailed(
                "teams adapter: client_secret is required".into(),
            ));
        }

        // In production, this would:
        // 1. Acquire an Azure AD token via client credentials
        // 2. Register a webhook endpoint with the Bot Framework
        // 3. Process incoming Activity objects
        // 4. Deliver parsed messages to host
        debug!(
            tenant = %self.config.tenant_id,
            client = %self.config.client_id,
            graph_url = %self.config.graph_url,
            "teams bot framework loop would start here (stub)"
        );

        cancel.cancelled().await;
        info!("Teams channel adapter shutting down");
        Ok(())
    }

    async fn send(
        &self,
        target: &str,
        payload: &MessagePayload,
    ) -> Result<String, PluginError> {
        let content = payload.as_text().ok_or_else(|| {
            PluginError::ExecutionFailed(
                "teams: only text payloads supported".into(),
            )
        })?;

        if self.config.tenant_id.is_empty() {
            return Err(PluginError::ExecutionFailed(
                "teams: tenant_id not configured".into(),
            ));
        }

        // In production, this would POST to the Graph API:
        // POST /teams/{team-id}/channels/{channel-id}/messages
        debug!(
            channel = %target,
            content_len = content.len(),
            "sending Teams message (stub)"
        );

        let msg_id = format!(
            "teams-{}",
            chrono::Utc::now().timestamp_millis()
        );
        Ok(msg_id)
    }
}
