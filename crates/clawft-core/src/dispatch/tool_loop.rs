//! One bounded LLM-plus-tools round.
//!
//! Grounded on `agent/loop_core.rs::run_tool_loop`'s message assembly and
//! tool-call extraction, narrowed to the spec's single-round contract: at
//! most one dispatch of tool calls, with any tool calls in the follow-up
//! response ignored. This is a deliberately smaller, distinct type from
//! [`crate::agent::loop_core::AgentLoop`] rather than a mode flag on it --
//! the two have different termination contracts.

use std::sync::Arc;

use tracing::error;

use clawft_llm::types::ChatMessage;

use crate::tools::registry::{extract_artifact_path, ToolRegistry};

use super::error::Result;
use super::llm_client::{LlmClient, Metrics};
use super::recovery::ErrorRecovery;

/// Maximum size in bytes for a single tool result before truncation.
const MAX_TOOL_RESULT_BYTES: usize = 65_536;

/// Final outcome of a `ToolLoop::run` call.
#[derive(Debug, Clone)]
pub struct ToolLoopResult {
    pub content: String,
    pub metrics: Metrics,
}

pub struct ToolLoop {
    llm: Arc<LlmClient>,
    tools: Arc<ToolRegistry>,
    recovery: Arc<ErrorRecovery>,
}

impl ToolLoop {
    pub fn new(llm: Arc<LlmClient>, tools: Arc<ToolRegistry>, recovery: Arc<ErrorRecovery>) -> Self {
        Self { llm, tools, recovery }
    }

    /// Run the loop: one LLM call, at most one round of sequential tool
    /// execution, one follow-up LLM call. Tool calls are executed in
    /// order (not concurrently) to keep message order deterministic.
    pub async fn run(&self, messages: Vec<ChatMessage>) -> Result<ToolLoopResult> {
        let schemas = self.tools.schemas();
        let first = self.llm.invoke(messages.clone(), schemas, None).await?;

        if first.tool_calls.is_empty() {
            return Ok(ToolLoopResult { content: first.content, metrics: first.metrics });
        }

        let mut conversation = messages;
        conversation.push(assistant_tool_call_message(&first.content, &first.tool_calls));

        for call in &first.tool_calls {
            let tool_message = self.execute_one(call).await;
            conversation.push(tool_message);
        }

        let second = self.llm.invoke(conversation, Vec::new(), None).await?;
        Ok(ToolLoopResult {
            content: second.content,
            metrics: first.metrics.merge(second.metrics),
        })
    }

    /// Execute a single tool call through `ErrorRecovery`, returning the
    /// `tool`-role message to append to the conversation. Never returns an
    /// error: lookup failures and recovery exhaustion both become text.
    async fn execute_one(
        &self,
        call: &clawft_types::provider::ToolCallRequest,
    ) -> ChatMessage {
        let Some(tool) = self.tools.get(&call.name) else {
            return tool_result_message(&call.id, format!("Tool {} not found", call.name));
        };

        let class = tool.class().to_string();
        let args = call.input.clone();
        let result = self
            .recovery
            .run(&class, || {
                let tool = tool.clone();
                let args = args.clone();
                async move { tool.execute(args).await }
            })
            .await;

        match result {
            Ok(value) => {
                let truncated = crate::security::truncate_result(value, MAX_TOOL_RESULT_BYTES);
                let _artifact = extract_artifact_path(&truncated);
                tool_result_message(&call.id, truncated.to_string())
            }
            Err(err) => {
                error!(tool = %call.name, class = %class, error = %err, "tool failed after retries");
                tool_result_message(&call.id, self.recovery.fallback(&class, None))
            }
        }
    }
}

fn assistant_tool_call_message(
    content: &str,
    tool_calls: &[clawft_types::provider::ToolCallRequest],
) -> ChatMessage {
    let calls = tool_calls
        .iter()
        .map(|c| clawft_llm::types::ToolCall {
            id: c.id.clone(),
            call_type: "function".into(),
            function: clawft_llm::types::FunctionCall {
                name: c.name.clone(),
                arguments: serde_json::to_string(&c.input).unwrap_or_default(),
            },
        })
        .collect();
    let mut msg = ChatMessage::assistant(content);
    msg.tool_calls = Some(calls);
    msg
}

fn tool_result_message(call_id: &str, content: String) -> ChatMessage {
    let mut msg = ChatMessage::new("tool", content);
    msg.tool_call_id = Some(call_id.to_string());
    msg
}
