//! Message tool for sending messages through the message bus.
//!
//! Allows the agent to proactively send messages to specific channels
//! and chat IDs, enabling multi-channel communication.

use std::sync::Arc;

use async_trait::async_trait;
use clawft_core::bus::MessageBus;
use clawft_core::tools::registry::{Tool, ToolError};
use clawft_types::event::OutboundMessage;
use serde_json::json;
use tracing::debug;

/// Tool for sending messages through the message bus.
///
/// Enables the agent to dispatch messages to specific channels and chat IDs
/// without going through the normal response path. Useful for:
/// - Sending notifications to other channels
/// - Broadcasting updates
/// - Cross-channel communication
pub struct MessageTool {
    bus: Arc<MessageBus>,
}

impl MessageTool {
    /// Create a new message tool backed by the given message bus.
    pub fn new(bus: Arc<MessageBus>) -> Self {
        Self { bus }
    }
}

#[cfg_attr(not(feature = "browser"), async_trait)]
#[cfg_attr(feature = "browser", async_trait(?Send))]
impl Tool for MessageTool {
    fn name(&self) -> &str {
        "message"
    }

    fn description(&self) -> &str {
        "Send a message to a specific channel and chat. Useful for cross-channel notifications."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "channel": {
                    "type": "string",
                    "description": "Target channel (e.g., 'telegram', 'slack', 'discord')"
                },
                "chat_id": {
                    "type": "string",
                    "description": "Target chat/conversation ID"
                },
                "content": {
                    "type": "string",
                    "description": "Message content to send"
                }
            },
            "required": ["channel", "chat_id", "content"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let channel = args
            .get("channel")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArgs("missing required field: channel".into()))?;

        let chat_id = args
            .get("chat_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArgs("missing required field: chat_id".into()))?;

        let content = args
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArgs("missing required field: content".into()))?;

        debug!(
            channel = %channel,
            chat_id = %chat_id,
            content_len = content.len(),
            "sending message via tool"
        );

        let outbound = OutboundMessage {
            channel: channel.to_owned(),
            chat_id: chat_id.to_owned(),
            content: content.to_owned(),
            reply_to: None,
            media: vec![],
            metadata: Default::default(),
        };

        self.bus
            .dispatch_outbound(outbound)
            .map_err(|e| ToolError::ExecutionFailed(format!("failed to dispatch message: {e}")))?;

        Ok(json!({
            "status": "sent",
            "channel": channel,
            "chat_id": chat_id,
            "content_length": content.len(),
        }))
    }
}
