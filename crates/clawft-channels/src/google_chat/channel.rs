//! Google Chat channel adapter implementation (skeleton).
//!
//! Implements [`ChannelAdapter`] for Google Chat via the Chat API.
//! Full OAuth2 integration is deferred to Workstream F6; this
//! skeleton provides the adapter structure and configuration.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use clawft_plugin::error::PluginError;
use clawft_plugin::message::MessagePayload;
use clawft_plugin::traits::{ChannelAdapter, ChannelAdapterHost};

use super::types::GoogleChatAdapterConfig;

/// Google Chat channel adapter (skeleton).
///
/// The adapter structure and trait implementation are in place.
/// Actual API calls require OAuth2 service account credentials
/// which are planned for Workstream F6.
pub struct GoogleChatChannelAdapter {
    config: GoogleChatAdapterConfig,
}

impl GoogleChatChannelAdapter {
    /// Create a new Google Chat channel adapter.
    pub fn new(config: GoogleChatAdapterConfig) -> Self {
        Self { config }
    }

    /// Check if a user email is in the allow list.
    pub fn is_user_allowed(&self, user_email: &str) -> bool {
        if self.config.allowed_users.is_empty() {
            return true;
        }
        let email_lower = user_email.to_lowercase();
        self.config
            .allowed_users
            .iter()
            .any(|u| u.to_lowercase() == email_lower)
    }
}

#[async_trait]
impl ChannelAdapter for GoogleChatChannelAdapter {
    fn name(&self) -> &str {
        "google_chat"
    }

    fn display_name(&self) -> &str {
        "Google Chat"
    }

    fn supports_threads(&self) -> bool {
        true // Google Chat supports threaded messages
    }

    fn supports_media(&self) -> bool {
        false // Media support is a future enhancement
    }

    async fn start(
        &self,
        _host: Arc<dyn ChannelAdapterHost>,
        cancel: CancellationToken,
    ) -> Result<(), PluginError> {
        info!("Google Chat channel adapter starting");

        if self.config.project_id.is_empty() {
            return Err(PluginError::LoadFailed(
                "google_chat adapter: project_id is required".into(),
            ));
        }

        // OAuth2 integration deferred to Workstream F6.
        // In production, this would:
        // 1. Load service account credentials
        // 2. Exchange for an OAuth2 access token
        // 3. Subscribe to space events via the Chat API
        // 4. Process incoming messages
        debug!(
            project_id = %self.config.project_id,
            spaces = self.config.spaces.len(),
            "google chat event loop would start here (stub, blocked on F6 OAuth2)"
        );

        cancel.cancelled().await;
        info!("Google Chat channel adapter shutting down");
        Ok(())
    }

    async fn send(
        &self,
        target: &str,
        payload: &MessagePayload,
    ) -> Result<String, PluginError> {
        let content = payload.as_text().ok_or_else(|| {
            PluginError::ExecutionFailed(
                "google_chat: only text payloads supported".into(),
            )
        })?;

        if self.config.project_id.is_empty() {
            return Err(PluginError::ExecutionFailed(
                "google_chat: project_id not configured".into(),
            ));
        }

        // In production, this would POST to the Chat API:
        // POST /v1/{target}/messages
        debug!(
            space = %target,
            content_len = content.len(),
            "sending Google Chat message (stub, blocked on F6 OAuth2)"
        );

        let msg_id = format!(
            "spaces/{}/messages/gchat-{}",
            target,
            chrono::Utc::now().timestamp_millis()
        );
        Ok(msg_id)
    }
}
