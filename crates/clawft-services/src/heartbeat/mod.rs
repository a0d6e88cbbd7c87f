//! Heartbeat service.
//!
//! Periodically posts a prompt as an [`InboundMessage`] at a fixed interval,
//! useful for health checks or periodic agent nudges.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{Result, ServiceError};
use clawft_types::event::InboundMessage;

/// A service that emits heartbeat messages at a regular interval.
pub struct HeartbeatService {
    interval: Duration,
    prompt: String,
    message_tx: mpsc::UnboundedSender<InboundMessage>,
}

impl HeartbeatService {
    /// Create a new heartbeat service.
    ///
    /// `interval_minutes` sets the delay between heartbeats.
    /// `prompt` is the message content delivered each heartbeat.
    pub fn new(
        interval_minutes: u64,
        prompt: String,
        message_tx: mpsc::UnboundedSender<InboundMessage>,
    ) -> Self {
        Self {
            interval: Duration::from_secs(interval_minutes * 60),
            prompt,
            message_tx,
        }
    }

    /// Start the heartbeat loop.
    ///
    /// Posts an [`InboundMessage`] with `channel: "heartbeat"` at each tick.
    /// Exits gracefully when the cancellation token is triggered.
    pub async fn start(&self, cancel: CancellationToken) -> Result<()> {
        info!(
            interval_secs = self.interval.as_secs(),
            "heartbeat service started"
        );
        let mut interval = tokio::time::interval(self.interval);

        // The first tick fires immediately; skip it so the first heartbeat
        // happens after one full interval.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("heartbeat service shutting down");
                    return Ok(());
                }
                _ = interval.tick() => {
                    let msg = InboundMessage {
                        channel: "heartbeat".to_string(),
                        sender_id: "system".to_string(),
                        chat_id: "heartbeat".to_string(),
                        content: self.prompt.clone(),
                        timestamp: Utc::now(),
                        media: vec![],
                        metadata: HashMap::new(),
                    };

                    if self.message_tx.send(msg).is_err() {
                        return Err(ServiceError::ChannelClosed);
                    }
                }
            }
        }
    }
}
