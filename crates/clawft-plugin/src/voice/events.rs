//! WebSocket event types for voice status reporting.
//!
//! Defines the `voice:status` event that is broadcast to WebSocket
//! clients when the voice channel status changes.

use serde::{Deserialize, Serialize};

use super::channel::VoiceStatus;

/// WebSocket event for voice status changes.
///
/// Sent to connected WebSocket clients whenever the voice pipeline
/// transitions between states (idle, listening, transcribing,
/// processing, speaking).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceWsEvent {
    /// Event type identifier. Always `"voice:status"`.
    pub event: String,
    /// Current voice pipeline status.
    pub status: VoiceStatus,
    /// Unix timestamp in milliseconds when the event occurred.
    pub timestamp: u64,
}

impl VoiceWsEvent {
    /// Create a new voice status event with the current timestamp.
    pub fn new(status: VoiceStatus) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            event: "voice:status".into(),
            status,
            timestamp,
        }
    }
}
