//! Unified plugin host extensions for C7: PluginHost Unification.
//!
//! Provides:
//! - [`ChannelAdapterShim`] -- bridges the existing [`Channel`] trait to the
//!   new [`ChannelAdapter`] trait from `clawft-plugin`, allowing existing
//!   Telegram, Discord, and Slack channels to work through the unified
//!   plugin system without behavior changes.
//! - [`SoulConfig`] -- loads and injects SOUL.md personality content into
//!   the Assembler pipeline stage system prompt.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::traits::{Channel, ChannelHost, ChannelStatus, MessageId};
use clawft_plugin::error::PluginError;
use clawft_plugin::message::MessagePayload;
use clawft_plugin::traits::{ChannelAdapter, ChannelAdapterHost};
use clawft_types::event::OutboundMessage;

// ---------------------------------------------------------------------------
// ChannelAdapterShim
// ---------------------------------------------------------------------------

/// Bridges an existing [`Channel`] implementation to the [`ChannelAdapter`]
/// trait from `clawft-plugin`.
///
/// This shim allows Telegram, Discord, Slack, and other channels that
/// implement the original `Channel` trait to participate in the unified
/// plugin host system without requiring rewrites.
///
/// The shim converts between the two trait signatures:
/// - `Channel::start(host: Arc<dyn ChannelHost>, cancel)` <->
///   `ChannelAdapter::start(host: Arc<dyn ChannelAdapterHost>, cancel)`
/// - `Channel::send(msg: &OutboundMessage) -> MessageId` <->
///   `ChannelAdapter::send(target, payload: &MessagePayload) -> String`
pub struct ChannelAdapterShim {
    /// The underlying channel implementation.
    channel: Arc<dyn Channel>,
    /// Bridge host for converting between trait interfaces.
    bridge_host: Arc<dyn ChannelHost>,
}

impl ChannelAdapterShim {
    /// Create a new shim wrapping an existing channel.
    pub fn new(channel: Arc<dyn Channel>, host: Arc<dyn ChannelHost>) -> Self {
        Self {
            channel,
            bridge_host: host,
        }
    }

    /// Get the underlying channel's status.
    pub fn status(&self) -> ChannelStatus {
        self.channel.status()
    }
}

#[async_trait]
impl ChannelAdapter for ChannelAdapterShim {
    fn name(&self) -> &str {
        self.channel.name()
    }

    fn display_name(&self) -> &str {
        // Use metadata for display name
        // We return name() since the metadata is not cheaply cloneable
        self.channel.name()
    }

    fn supports_threads(&self) -> bool {
        self.channel.metadata().supports_threads
    }

    fn supports_media(&self) -> bool {
        self.channel.metadata().supports_media
    }

    async fn start(
        &self,
        _host: Arc<dyn ChannelAdapterHost>,
        cancel: CancellationToken,
    ) -> Result<(), PluginError> {
        self.channel
            .start(self.bridge_host.clone(), cancel)
            .await
            .map_err(|e| PluginError::ExecutionFailed(format!("channel start: {e}")))
    }

    async fn send(
        &self,
        target: &str,
        payload: &MessagePayload,
    ) -> Result<String, PluginError> {
        let content = match payload {
            MessagePayload::Text { content } => content.clone(),
            MessagePayload::Structured { data } => serde_json::to_string(data)
                .unwrap_or_else(|_| data.to_string()),
            MessagePayload::Binary { mime_type, data } => {
                return Err(PluginError::NotImplemented(format!(
                    "binary payload ({mime_type}, {} bytes) not supported by legacy channel shim",
                    data.len()
                )));
            }
        };

        let msg = OutboundMessage {
            channel: self.channel.name().to_owned(),
            chat_id: target.to_owned(),
            content,
            reply_to: None,
            media: vec![],
            metadata: HashMap::new(),
        };

        let MessageId(id) = self
            .channel
            .send(&msg)
            .await
            .map_err(|e| PluginError::ExecutionFailed(format!("channel send: {e}")))?;

        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// SoulConfig -- SOUL.md injection
// ---------------------------------------------------------------------------

/// SOUL.md configuration for personality injection.
///
/// Loads a `SOUL.md` file and provides its content for injection into
/// the Assembler pipeline stage system prompt. The SOUL.md format is
/// a markdown file containing personality directives, tone, and
/// behavioral guidelines for the agent.
#[derive(Debug, Clone)]
pub struct SoulConfig {
    /// Raw content of the SOUL.md file.
    pub content: String,
    /// Path to the SOUL.md file (for hot-reload detection).
    pub source_path: Option<PathBuf>,
}

impl SoulConfig {
    /// Create a new SoulConfig from content.
    pub fn new(content: String) -> Self {
        Self {
            content,
            source_path: None,
        }
    }

    /// Load SOUL.md from a workspace directory.
    ///
    /// Searches for `SOUL.md` in:
    /// 1. `{workspace}/.clawft/SOUL.md`
    /// 2. `{workspace}/SOUL.md`
    /// 3. `~/.clawft/SOUL.md` (global fallback)
    ///
    /// Returns `None` if no SOUL.md file is found.
    pub fn load_from_workspace(workspace: &Path) -> Option<Self> {
        let candidates = [
            workspace.join(".clawft").join("SOUL.md"),
            workspace.join("SOUL.md"),
        ];

        for path in &candidates {
            if let Ok(content) = std::fs::read_to_string(path)
                && !content.trim().is_empty()
            {
                info!(path = %path.display(), "loaded SOUL.md");
                return Some(Self {
                    content,
                    source_path: Some(path.clone()),
                });
            }
        }

        // Global fallback
        if let Some(home) = dirs::home_dir() {
            let global_path = home.join(".clawft").join("SOUL.md");
            if let Ok(content) = std::fs::read_to_string(&global_path)
                && !content.trim().is_empty()
            {
                info!(path = %global_path.display(), "loaded global SOUL.md");
                return Some(Self {
                    content,
                    source_path: Some(global_path),
                });
            }
        }

        debug!("no SOUL.md found");
        None
    }

    /// Inject SOUL.md content into a system prompt.
    ///
    /// Appends the SOUL.md content as a personality section to the
    /// given system prompt string. If the SOUL.md content is empty,
    /// the system prompt is returned unchanged.
    pub fn inject_into_prompt(&self, system_prompt: &str) -> String {
        if self.content.trim().is_empty() {
            return system_prompt.to_owned();
        }

        format!(
            "{system_prompt}\n\n\
             ## Agent Personality (SOUL.md)\n\n\
             {}\n",
            self.content.trim()
        )
    }

    /// Check if the SOUL.md file has been modified since load.
    ///
    /// Returns `true` if the file no longer matches the loaded content,
    /// or if it has been deleted. This supports hot-reload detection.
    pub fn is_stale(&self) -> bool {
        match &self.source_path {
            Some(path) => {
                match std::fs::read_to_string(path) {
                    Ok(current) => current != self.content,
                    Err(_) => true, // File deleted or unreadable
                }
            }
            None => false, // No file to check
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelAdapterHostBridge
// ---------------------------------------------------------------------------

/// Bridges [`ChannelAdapterHost`] to the existing [`ChannelHost`] interface.
///
/// Converts inbound `MessagePayload` variants to the `InboundMessage` format
/// expected by the existing pipeline.
pub struct ChannelAdapterHostBridge {
    inner: Arc<dyn ChannelHost>,
}

impl ChannelAdapterHostBridge {
    /// Create a new bridge wrapping an existing ChannelHost.
    pub fn new(host: Arc<dyn ChannelHost>) -> Self {
        Self { inner: host }
    }
}

#[async_trait]
impl ChannelAdapterHost for ChannelAdapterHostBridge {
    async fn deliver_inbound(
        &self,
        channel: &str,
        sender_id: &str,
        chat_id: &str,
        payload: MessagePayload,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<(), PluginError> {
        let content = match payload {
            MessagePayload::Text { content } => content,
            MessagePayload::Structured { data } => serde_json::to_string(&data)
                .unwrap_or_else(|_| data.to_string()),
            MessagePayload::Binary { mime_type, data } => {
                warn!(
                    channel = channel,
                    mime_type = %mime_type,
                    size = data.len(),
                    "binary payload received but not yet supported by pipeline"
                );
                format!("[binary: {mime_type}, {} bytes]", data.len())
            }
        };

        self.inner
            .publish_inbound(channel, sender_id, chat_id, &content, vec![], metadata)
            .await
            .map_err(|e| PluginError::ExecutionFailed(format!("deliver inbound: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
