//! Matrix channel adapter implementation.
//!
//! Implements [`ChannelAdapter`] for Matrix messaging via the
//! client-server API. Supports threaded rooms and text payloads.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use clawft_plugin::error::PluginError;
use clawft_plugin::message::MessagePayload;
use clawft_plugin::traits::{ChannelAdapter, ChannelAdapterHost};

use super::types::MatrixAdapterConfig;

/// Matrix channel adapter using the client-server API.
///
/// Connects to a Matrix homeserver for sending and receiving messages.
/// Supports threaded conversations via Matrix room threads.
pub struct MatrixChannelAdapter {
    config: MatrixAdapterConfig,
}

impl MatrixChannelAdapter {
    /// Create a new Matrix channel adapter.
    pub fn new(config: MatrixAdapterConfig) -> Self {
        Self { config }
    }

    /// Check if a user ID is in the allow list.
    pub fn is_user_allowed(&self, user_id: &str) -> bool {
        if self.config.allowed_users.is_empty() {
            return true;
        }
        self.config.allowed_users.iter().any(|u| u == user_id)
    }
}

#[async_trait]
impl ChannelAdapter for MatrixChannelAdapter {
    fn name(&self) -> &str {
        "matrix"
    }

    fn display_name(&self) -> &str {
        "Matrix"
    }

    fn supports_threads(&self) -> bool {
        true // Matrix supports threaded conversations
    }

    fn supports_media(&self) -> bool {
        true // Matrix supports media via content repository
    }

    async fn start(
        &self,
        _host: Arc<dyn ChannelAdapterHost>,
        cancel: CancellationToken,
    ) -> Result<(), PluginError> {
        info!("Matrix channel adapter starting");

        if self.config.homeserver_url.is_empty() {
            return Err(PluginError::LoadFailed(
                "matrix adapter: homeserver_url is required".into(),
            ));
        }
        if self.config.access_token.is_empty() {
            return Err(PluginError::LoadFailed(
                "matrix adapter: access_token is required".into(),
            ));
        }
        if self.config.user_id.is_empty() {
            return Err(PluginError::LoadFailed(
                "matrix adapter: user_id is required".into(),
            ));
        }

        // In production, this would:
        // 1. Perform an initial /sync to get the since token
        // 2. Auto-join rooms listed in config
        // 3. Long-poll /sync for new events
        // 4. Parse m.room.message events and deliver via host
        debug!(
            homeserver = %self.config.homeserver_url,
            user = %self.config.user_id,
            rooms = self.config.auto_join_rooms.len(),
            "matrix sync loop would start here (stub)"
        );

        cancel.cancelled().await;
        info!("Matrix channel adapter shutting down");
        Ok(())
    }

    async fn send(
        &self,
        target: &str,
        payload: &MessagePayload,
    ) -> Result<String, PluginError> {
        let content = payload.as_text().ok_or_else(|| {
            PluginError::ExecutionFailed(
                "matrix: only text payloads supported currently".into(),
            )
        })?;

        if self.config.homeserver_url.is_empty() {
            return Err(PluginError::ExecutionFailed(
                "matrix: homeserver_url not configured".into(),
            ));
        }

        // In production, this would PUT to:
        // /_matrix/client/v3/rooms/{target}/send/m.room.message/{txnId}
        debug!(
            room = %target,
            content_len = content.len(),
            "sending Matrix message (stub)"
        );

        let event_id = format!(
            "${}",
            chrono::Utc::now().timestamp_millis()
        );
        Ok(event_id)
    }
}
