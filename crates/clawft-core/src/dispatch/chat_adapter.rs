//! Chat-facing lifecycle around one dispatch call: a "thinking" message,
//! periodic progress edits while the work runs, a final edit carrying
//! metrics, and threaded replies.
//!
//! Grounded on `clawft-channels/src/traits.rs` (`Channel::send`,
//! `MessageId`) for the send contract and `clawft-channels/src/host.rs`'s
//! per-task `CancellationToken` spawn pattern for the progress-edit task.
//! The thread-id convention (`metadata["thread_ts"]`/`metadata["ts"]`)
//! follows `clawft-channels/src/slack/channel.rs`. No teacher module does
//! a thinking-message/periodic-edit flow -- this is built fresh in that
//! idiom; channels that cannot edit in place (no `edit_message_id`
//! support) simply post each edit as a new message.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use clawft_types::event::{InboundMessage, OutboundMessage};

use clawft_channels::traits::{Channel, MessageId};

use super::error::Result;
use super::llm_client::Metrics;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(15);
const MAX_PROGRESS_EDITS: u32 = 9;
const MAX_MESSAGE_CHARS: usize = 7_000;

const PROGRESS_PHRASES: &[&str] = &[
    "Still working on it...",
    "Digging through the data...",
    "Almost there...",
    "Checking a few more sources...",
    "Putting the pieces together...",
    "Hang tight, wrapping up...",
    "Cross-referencing findings...",
    "Finalizing the report...",
    "Just a little longer...",
];

/// A message author this adapter should never respond to: other bots, and
/// non-human senders.
fn is_bot_or_system(msg: &InboundMessage) -> bool {
    msg.metadata
        .get("is_bot")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Whether the sender is flagged as something other than a person (a
/// service account, a webhook, etc). Absent the field, the sender is
/// assumed to be a person.
fn is_non_person_actor(msg: &InboundMessage) -> bool {
    msg.metadata
        .get("is_person")
        .and_then(|v| v.as_bool())
        .map(|is_person| !is_person)
        .unwrap_or(false)
}

/// The event verb, when the channel supplies one (e.g. "post" vs "edit"/"delete").
fn verb(msg: &InboundMessage) -> Option<&str> {
    msg.metadata.get("verb").and_then(|v| v.as_str())
}

/// The sender's domain, when the channel supplies one.
fn sender_domain(msg: &InboundMessage) -> Option<&str> {
    msg.metadata.get("sender_domain").and_then(|v| v.as_str())
}

/// Truncate `content` to at most `max_chars` characters, appending a
/// suffix that records the original length.
fn truncate_message(content: &str, max_chars: usize) -> String {
    let char_count = content.chars().count();
    if char_count <= max_chars {
        return content.to_string();
    }
    let suffix = format!("\n\n... [truncated, original length: {char_count} characters]");
    let available = max_chars.saturating_sub(suffix.chars().count());
    let mut truncated: String = content.chars().take(available).collect();
    truncated.push_str(&suffix);
    truncated
}

/// The result of the wrapped work: the text to send, metrics if an LLM
/// was invoked, and an optional artifact to attach.
pub struct AdapterOutcome {
    pub content: String,
    pub metrics: Option<Metrics>,
    pub artifact_path: Option<String>,
}

pub struct ChatAdapter {
    channel: Arc<dyn Channel>,
    approved_rooms: Vec<String>,
    approved_domains: Vec<String>,
}

impl ChatAdapter {
    pub fn new(channel: Arc<dyn Channel>, approved_rooms: Vec<String>, approved_domains: Vec<String>) -> Self {
        Self { channel, approved_rooms, approved_domains }
    }

    /// Whether this message should be dispatched at all: not from a bot,
    /// authored by a person, a "post" event (when the channel labels
    /// verbs at all), and within the configured room/domain allowlists.
    pub fn should_handle(&self, msg: &InboundMessage) -> bool {
        if is_bot_or_system(msg) || is_non_person_actor(msg) {
            return false;
        }
        if let Some(verb) = verb(msg) {
            if verb != "post" {
                return false;
            }
        }
        if !self.approved_domains.is_empty() {
            match sender_domain(msg) {
                Some(domain) if self.approved_domains.iter().any(|d| d == domain) => {}
                _ => return false,
            }
        }
        self.approved_rooms.is_empty() || self.approved_rooms.iter().any(|r| r == &msg.chat_id)
    }

    fn thread_id(&self, msg: &InboundMessage) -> Option<String> {
        msg.metadata
            .get("thread_ts")
            .or_else(|| msg.metadata.get("ts"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn outbound(&self, msg: &InboundMessage, content: String, edit_of: Option<&MessageId>) -> OutboundMessage {
        let mut metadata = std::collections::HashMap::new();
        if let Some(thread) = self.thread_id(msg) {
            metadata.insert("thread_ts".into(), serde_json::Value::String(thread));
        }
        if let Some(id) = edit_of {
            metadata.insert("edit_message_id".into(), serde_json::Value::String(id.0.clone()));
        }
        OutboundMessage {
            channel: msg.channel.clone(),
            chat_id: msg.chat_id.clone(),
            content,
            reply_to: None,
            media: Vec::new(),
            metadata,
        }
    }

    /// Run `work`, posting a thinking message, editing it with rotating
    /// progress phrases every 15s (capped at 9 edits) until it completes,
    /// then replacing it with the final content. On error, replaces it
    /// with a short, user-safe failure message instead of propagating
    /// internals to chat.
    pub async fn run<F, Fut>(&self, msg: &InboundMessage, work: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AdapterOutcome>>,
    {
        let thinking = self
            .channel
            .send(&self.outbound(msg, "Thinking...".to_string(), None))
            .await
            .map_err(|e| super::error::DispatchError::Unavailable(e.to_string()))?;

        let progress_token = CancellationToken::new();
        let progress_handle = self.spawn_progress_task(msg, &thinking, progress_token.clone());

        let outcome = work().await;
        progress_token.cancel();
        let _ = progress_handle.await;

        let artifact_path = outcome.as_ref().ok().and_then(|o| o.artifact_path.clone());

        let final_message = match outcome {
            Ok(outcome) => {
                let content = truncate_message(&render_final(&outcome), MAX_MESSAGE_CHARS);
                let mut message = self.outbound(msg, content, Some(&thinking));
                if let Some(path) = &outcome.artifact_path {
                    message.media.push(path.clone());
                }
                message
            }
            Err(err) => {
                warn!(error = %err, "dispatch work failed, sending short error message");
                self.outbound(
                    msg,
                    "Sorry, something went wrong handling that request.".to_string(),
                    Some(&thinking),
                )
            }
        };

        self.channel
            .send(&final_message)
            .await
            .map_err(|e| super::error::DispatchError::Unavailable(e.to_string()))?;

        if let Some(path) = artifact_path {
            let _ = std::fs::remove_file(&path);
        }

        Ok(())
    }

    fn spawn_progress_task(
        &self,
        msg: &InboundMessage,
        thinking: &MessageId,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let channel = self.channel.clone();
        let outbound_template = self.outbound(msg, String::new(), Some(thinking));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PROGRESS_INTERVAL);
            interval.tick().await; // first tick fires immediately; skip it
            for i in 0..MAX_PROGRESS_EDITS {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = interval.tick() => {}
                }
                let phrase = PROGRESS_PHRASES[i as usize % PROGRESS_PHRASES.len()];
                let mut edit = outbound_template.clone();
                edit.content = phrase.to_string();
                if channel.send(&edit).await.is_err() {
                    return;
                }
            }
        })
    }
}

fn render_final(outcome: &AdapterOutcome) -> String {
    let mut content = outcome.content.clone();
    if let Some(metrics) = &outcome.metrics {
        if metrics.total_tokens() > 0 {
            content.push_str(&format!(
                "\n\n_{} tokens, {:.1}s_",
                metrics.total_tokens(),
                metrics.gen_time
            ));
        }
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clawft_types::error::ChannelError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct RecordingChannel {
        sent: Mutex<Vec<OutboundMessage>>,
        counter: AtomicUsize,
    }

    impl RecordingChannel {
        fn new() -> Self {
            Self { sent: Mutex::new(Vec::new()), counter: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl Channel for RecordingChannel {
        fn name(&self) -> &str {
            "test"
        }
        fn metadata(&self) -> clawft_channels::traits::ChannelMetadata {
            clawft_channels::traits::ChannelMetadata {
                name: "test".into(),
                display_name: "Test".into(),
                supports_threads: true,
                supports_media: false,
            }
        }
        fn status(&self) -> clawft_channels::traits::ChannelStatus {
            clawft_channels::traits::ChannelStatus::Running
        }
        fn is_allowed(&self, _sender_id: &str) -> bool {
            true
        }
        async fn start(
            &self,
            _host: Arc<dyn clawft_channels::traits::ChannelHost>,
            _cancel: CancellationToken,
        ) -> std::result::Result<(), ChannelError> {
            Ok(())
        }
        async fn send(&self, msg: &OutboundMessage) -> std::result::Result<MessageId, ChannelError> {
            self.sent.lock().unwrap().push(msg.clone());
            let id = self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(MessageId(format!("m{id}")))
        }
    }

    fn sample_message() -> InboundMessage {
        InboundMessage {
            channel: "test".into(),
            sender_id: "u1".into(),
            chat_id: "room1".into(),
            content: "investigate 8.8.8.8".into(),
            timestamp: chrono::Utc::now(),
            media: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn bot_authored_messages_are_filtered() {
        let channel = Arc::new(RecordingChannel::new());
        let adapter = ChatAdapter::new(channel, Vec::new(), Vec::new());
        let mut msg = sample_message();
        msg.metadata.insert("is_bot".into(), serde_json::Value::Bool(true));
        assert!(!adapter.should_handle(&msg));
    }

    #[test]
    fn non_person_actors_are_filtered() {
        let channel = Arc::new(RecordingChannel::new());
        let adapter = ChatAdapter::new(channel, Vec::new(), Vec::new());
        let mut msg = sample_message();
        msg.metadata.insert("is_person".into(), serde_json::Value::Bool(false));
        assert!(!adapter.should_handle(&msg));
    }

    #[test]
    fn non_post_verbs_are_filtered() {
        let channel = Arc::new(RecordingChannel::new());
        let adapter = ChatAdapter::new(channel, Vec::new(), Vec::new());
        let mut msg = sample_message();
        msg.metadata.insert("verb".into(), serde_json::Value::String("edit".into()));
        assert!(!adapter.should_handle(&msg));
    }

    #[test]
    fn domain_allowlist_restricts_handling() {
        let channel = Arc::new(RecordingChannel::new());
        let adapter = ChatAdapter::new(channel, Vec::new(), vec!["allowed.example.com".to_string()]);
        let mut msg = sample_message();
        msg.metadata.insert("sender_domain".into(), serde_json::Value::String("other.example.com".into()));
        assert!(!adapter.should_handle(&msg));
    }

    #[test]
    fn room_allowlist_restricts_handling() {
        let channel = Arc::new(RecordingChannel::new());
        let adapter = ChatAdapter::new(channel, vec!["allowed-room".to_string()], Vec::new());
        assert!(!adapter.should_handle(&sample_message()));
    }

    #[tokio::test]
    async fn run_posts_thinking_then_final_content() {
        let channel = Arc::new(RecordingChannel::new());
        let adapter = ChatAdapter::new(channel.clone(), Vec::new(), Vec::new());
        let msg = sample_message();
        adapter
            .run(&msg, || async {
                Ok(AdapterOutcome {
                    content: "done".to_string(),
                    metrics: Some(Metrics { input_tokens: 10, output_tokens: 5, prompt_time: 0.0, gen_time: 1.0 }),
                    artifact_path: None,
                })
            })
            .await
            .unwrap();
        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].content, "Thinking...");
        assert!(sent[1].content.contains("done"));
        assert!(sent[1].content.contains("15 tokens"));
    }

    #[tokio::test]
    async fn run_replaces_thinking_with_error_text_on_failure() {
        let channel = Arc::new(RecordingChannel::new());
        let adapter = ChatAdapter::new(channel.clone(), Vec::new(), Vec::new());
        let msg = sample_message();
        adapter
            .run(&msg, || async {
                Err(super::super::error::DispatchError::Internal("boom".into()))
            })
            .await
            .unwrap();
        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].content.contains("something went wrong"));
    }

    #[tokio::test]
    async fn run_attaches_and_deletes_artifact() {
        let channel = Arc::new(RecordingChannel::new());
        let adapter = ChatAdapter::new(channel.clone(), Vec::new(), Vec::new());
        let msg = sample_message();
        let artifact = std::env::temp_dir().join("chat_adapter_test_artifact.txt");
        std::fs::write(&artifact, b"report body").unwrap();
        let artifact_path = artifact.to_string_lossy().to_string();
        adapter
            .run(&msg, || async {
                Ok(AdapterOutcome {
                    content: "done".to_string(),
                    metrics: None,
                    artifact_path: Some(artifact_path.clone()),
                })
            })
            .await
            .unwrap();
        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent[1].media, vec![artifact_path]);
        assert!(!artifact.exists());
    }

    #[tokio::test]
    async fn run_truncates_overlong_final_content() {
        let channel = Arc::new(RecordingChannel::new());
        let adapter = ChatAdapter::new(channel.clone(), Vec::new(), Vec::new());
        let msg = sample_message();
        let long_content = "x".repeat(MAX_MESSAGE_CHARS + 500);
        adapter
            .run(&msg, || async move {
                Ok(AdapterOutcome { content: long_content, metrics: None, artifact_path: None })
            })
            .await
            .unwrap();
        let sent = channel.sent.lock().unwrap();
        assert!(sent[1].content.chars().count() <= MAX_MESSAGE_CHARS);
        assert!(sent[1].content.contains("truncated"));
    }
}
