//! Plugin trait definitions.
//!
//! Defines the 6 core plugin traits plus supporting traits:
//! - [`Tool`] -- tool execution interface
//! - [`ChannelAdapter`] -- channel message handling
//! - [`PipelineStage`] -- pipeline processing stage
//! - [`Skill`] -- skill definition with tool list
//! - [`MemoryBackend`] -- memory storage interface
//! - [`VoiceHandler`] -- placeholder for voice forward-compat
//! - [`KeyValueStore`] -- key-value storage for plugins
//! - [`ToolContext`] -- execution context for tools
//! - [`ChannelAdapterHost`] -- host services for channel adapters
//!
//! All traits are `Send + Sync`. Async methods use `#[async_trait]`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

#[cfg(feature = "native")]
pub use tokio_util::sync::CancellationToken;

#[cfg(not(feature = "native"))]
mod cancellation {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// A lightweight cancellation token for non-native (WASM) targets.
    ///
    /// On native targets, this is re-exported from `tokio_util`.
    /// On WASM, we provide a minimal `Arc<AtomicBool>` implementation
    /// that supports `cancel()` and `is_cancelled()`.
    #[derive(Clone)]
    pub struct CancellationToken {
        cancelled: Arc<AtomicBool>,
    }

    impl CancellationToken {
        /// Create a new token that is not yet cancelled.
        pub fn new() -> Self {
            Self {
                cancelled: Arc::new(AtomicBool::new(false)),
            }
        }

        /// Signal cancellation.
        pub fn cancel(&self) {
            self.cancelled.store(true, Ordering::SeqCst);
        }

        /// Check whether the token has been cancelled.
        pub fn is_cancelled(&self) -> bool {
            self.cancelled.load(Ordering::SeqCst)
        }
    }

    impl Default for CancellationToken {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(not(feature = "native"))]
pub use cancellation::CancellationToken;

use crate::error::PluginError;
use crate::message::MessagePayload;

// ---------------------------------------------------------------------------
// Tool
// ---------------------------------------------------------------------------

/// A tool that can be invoked by an agent or exposed via MCP.
///
/// Tools are the primary extension point for adding new capabilities.
/// Each tool declares its name, description, and a JSON Schema for
/// its parameters. The host routes `execute()` calls based on the
/// tool name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name (e.g., `"web_search"`, `"file_read"`).
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// JSON Schema describing the tool's parameters.
    ///
    /// Returns a `serde_json::Value` representing a JSON Schema object.
    /// The host uses this schema for validation and for MCP `tools/list`.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given parameters and context.
    ///
    /// `params` is a JSON object matching `parameters_schema()`.
    /// Returns a JSON value with the tool's result, or a `PluginError`.
    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &dyn ToolContext,
    ) -> Result<serde_json::Value, PluginError>;
}

// ---------------------------------------------------------------------------
// ChannelAdapter
// ---------------------------------------------------------------------------

/// A channel adapter for connecting to external messaging platforms.
///
/// Replaces the existing `Channel` trait with a plugin-oriented design
/// that supports [`MessagePayload`] variants for text, structured, and
/// binary (voice) content.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Unique channel identifier (e.g., `"telegram"`, `"slack"`).
    fn name(&self) -> &str;

    /// Human-readable display name.
    fn display_name(&self) -> &str;

    /// Whether this adapter supports threaded conversations.
    fn supports_threads(&self) -> bool;

    /// Whether this adapter supports media/binary payloads.
    fn supports_media(&self) -> bool;

    /// Start receiving messages. Long-lived -- runs until cancelled.
    async fn start(
        &self,
        host: Arc<dyn ChannelAdapterHost>,
        cancel: CancellationToken,
    ) -> Result<(), PluginError>;

    /// Send a message payload through this channel.
    ///
    /// Returns a message ID on success.
    async fn send(
        &self,
        target: &str,
        payload: &MessagePayload,
    ) -> Result<String, PluginError>;
}

/// Host services exposed to channel adapters.
#[async_trait]
pub trait ChannelAdapterHost: Send + Sync {
    /// Deliver an inbound message payload to the agent pipeline.
    async fn deliver_inbound(
        &self,
        channel: &str,
        sender_id: &str,
        chat_id: &str,
        payload: MessagePayload,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<(), PluginError>;
}

// ---------------------------------------------------------------------------
// PipelineStage
// ---------------------------------------------------------------------------

/// Types of pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStageType {
    /// Pre-processing (input validation, normalization).
    PreProcess,
    /// Core processing (LLM calls, tool routing).
    Process,
    /// Post-processing (response formatting, filtering).
    PostProcess,
    /// Observation / logging (read-only tap on the pipeline).
    Observer,
}

/// A stage in the agent processing pipeline.
///
/// Pipeline stages are composed in order: PreProcess -> Process ->
/// PostProcess, with Observers receiving copies at each step.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Stage name (e.g., `"assembler"`, `"tool_router"`).
    fn name(&self) -> &str;

    /// What type of stage this is.
    fn stage_type(&self) -> PipelineStageType;

    /// Process input and return output.
    ///
    /// `input` is a JSON value representing the current pipeline state.
    /// Returns the transformed pipeline state.
    async fn process(
        &self,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, PluginError>;
}

// ---------------------------------------------------------------------------
// Skill
// ---------------------------------------------------------------------------

/// A skill is a high-level agent capability composed of tools,
/// instructions, and configuration.
///
/// Skills are the primary unit of agent customization. They can be
/// loaded from SKILL.md files, bundled with plugins, or
/// auto-generated. Skills can contribute tools that appear in MCP
/// `tools/list` and can be invoked via slash commands.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Skill name (e.g., `"code-review"`, `"git-commit"`).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Semantic version string.
    fn version(&self) -> &str;

    /// Template variables the skill accepts (name -> description).
    fn variables(&self) -> HashMap<String, String>;

    /// Tool names this skill is allowed to invoke.
    fn allowed_tools(&self) -> Vec<String>;

    /// System instructions injected when the skill is active.
    fn instructions(&self) -> &str;

    /// Whether this skill can be invoked directly by users (e.g., via /command).
    fn is_user_invocable(&self) -> bool;

    /// Execute a tool provided by this skill.
    ///
    /// `tool_name` is the specific tool within this skill to call.
    /// `params` is a JSON object of tool parameters.
    /// `ctx` is the execution context providing key-value store access.
    async fn execute_tool(
        &self,
        tool_name: &str,
        params: serde_json::Value,
        ctx: &dyn ToolContext,
    ) -> Result<serde_json::Value, PluginError>;
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// A pluggable memory storage backend.
///
/// Supports key-value storage with optional namespace isolation,
/// TTL, tags, and semantic search. Implementations may use
/// in-memory stores, SQLite, HNSW indices, or external services.
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// Store a value with optional metadata.
    async fn store(
        &self,
        key: &str,
        value: &str,
        namespace: Option<&str>,
        ttl_seconds: Option<u64>,
        tags: Option<Vec<String>>,
    ) -> Result<(), PluginError>;

    /// Retrieve a value by key.
    async fn retrieve(
        &self,
        key: &str,
        namespace: Option<&str>,
    ) -> Result<Option<String>, PluginError>;

    /// Search for values matching a query string.
    ///
    /// Returns a list of `(key, value, relevance_score)` tuples.
    async fn search(
        &self,
        query: &str,
        namespace: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<(String, String, f64)>, PluginError>;

    /// Delete a value by key. Returns `true` if the key existed.
    async fn delete(
        &self,
        key: &str,
        namespace: Option<&str>,
    ) -> Result<bool, PluginError>;
}

// ---------------------------------------------------------------------------
// VoiceHandler (placeholder for Workstream G)
// ---------------------------------------------------------------------------

/// Placeholder trait for voice/audio processing (Workstream G).
///
/// This trait is defined now to reserve the capability type and
/// ensure forward-compatibility. Implementations will be added
/// when Workstream G begins. The `voice` feature flag gates
/// any voice-specific dependencies.
#[async_trait]
pub trait VoiceHandler: Send + Sync {
    /// Process raw audio input and return a transcription or response.
    ///
    /// `audio_data` is raw audio bytes. `mime_type` indicates the format
    /// (e.g., `"audio/wav"`, `"audio/opus"`).
    async fn process_audio(
        &self,
        audio_data: &[u8],
        mime_type: &str,
    ) -> Result<String, PluginError>;

    /// Synthesize text into audio output.
    ///
    /// Returns audio bytes and the MIME type of the output format.
    async fn synthesize(
        &self,
        text: &str,
    ) -> Result<(Vec<u8>, String), PluginError>;
}

// ---------------------------------------------------------------------------
// KeyValueStore
// ---------------------------------------------------------------------------

/// Key-value store interface exposed to plugins via [`ToolContext`].
///
/// This is the cross-element contract defined in the integration spec.
/// Implementations may be backed by in-memory maps, SQLite, or the
/// agent's memory system.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key. Returns `None` if not found.
    async fn get(&self, key: &str) -> Result<Option<String>, PluginError>;

    /// Set a value for a key.
    async fn set(&self, key: &str, value: &str) -> Result<(), PluginError>;

    /// Delete a key. Returns `true` if the key existed.
    async fn delete(&self, key: &str) -> Result<bool, PluginError>;

    /// List all keys with an optional prefix filter.
    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, PluginError>;
}

// ---------------------------------------------------------------------------
// ToolContext
// ---------------------------------------------------------------------------

/// Execution context passed to [`Tool::execute()`] and [`Skill::execute_tool()`].
///
/// Provides access to the key-value store, plugin identity, and
/// agent identity. This is the plugin's window into the host.
pub trait ToolContext: Send + Sync {
    /// Access the key-value store for plugin state.
    fn key_value_store(&self) -> &dyn KeyValueStore;

    /// The ID of the plugin that owns this tool.
    fn plugin_id(&self) -> &str;

    /// The ID of the agent invoking this tool.
    fn agent_id(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
