//! Single-invocation LLM client: bind tools, invoke, report metrics.
//!
//! Grounded on `clawft_llm::provider::Provider` (the low-level per-provider
//! contract) and its OpenAI-wire `ChatRequest`/`ChatResponse` types, not the
//! heavier `pipeline::PipelineRegistry` -- the dispatch engine only needs a
//! single bounded invoke, not the full classifier/router/assembler/scorer
//! pipeline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clawft_llm::provider::Provider;
use clawft_llm::types::{ChatMessage, ChatRequest};
use clawft_types::provider::ToolCallRequest;

use super::error::{DispatchError, Result};

/// Token and timing metrics for one or more LLM invocations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub prompt_time: f64,
    pub gen_time: f64,
}

impl Metrics {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    pub fn tokens_per_sec(&self) -> f64 {
        if self.gen_time > 0.0 {
            self.output_tokens as f64 / self.gen_time
        } else {
            0.0
        }
    }

    /// Combine two invocations' metrics by summing every field, as the
    /// tool loop does across its two LLM calls.
    pub fn merge(mut self, other: Metrics) -> Metrics {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.prompt_time += other.prompt_time;
        self.gen_time += other.gen_time;
        self
    }
}

/// Result of one `LlmClient::invoke` call.
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub metrics: Metrics,
}

/// Invokes a chat model with optional bound tools.
pub struct LlmClient {
    provider: Arc<dyn Provider>,
    model: String,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, timeout: Duration) -> Self {
        Self { provider, model: model.into(), timeout }
    }

    /// Invoke the model once. Completes within `timeout` or returns
    /// `DispatchError::Timeout`; never returns an error for an empty
    /// response -- that surfaces as empty `content` with zeroed metrics.
    pub async fn invoke(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<serde_json::Value>,
        temperature: Option<f64>,
    ) -> Result<LlmInvocation> {
        let mut request = ChatRequest::new(&self.model, messages);
        request.tools = tools;
        request.temperature = temperature;

        let started = Instant::now();
        let response = tokio::time::timeout(self.timeout, self.provider.complete(&request))
            .await
            .map_err(|_| DispatchError::Timeout(format!("LLM call exceeded {:?}", self.timeout)))?
            .map_err(DispatchError::from)?;
        let elapsed = started.elapsed().as_secs_f64();

        let Some(choice) = response.choices.into_iter().next() else {
            return Ok(LlmInvocation {
                content: String::new(),
                tool_calls: Vec::new(),
                metrics: Metrics::default(),
            });
        };

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCallRequest {
                id: tc.id,
                name: tc.function.name,
                input: serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::Null),
            })
            .collect();

        let metrics = match response.usage {
            Some(usage) => Metrics {
                input_tokens: usage.prompt_tokens.max(0) as u32,
                output_tokens: usage.completion_tokens.max(0) as u32,
                prompt_time: 0.0,
                gen_time: elapsed,
            },
            None => Metrics { gen_time: elapsed, ..Metrics::default() },
        };

        Ok(LlmInvocation { content: choice.message.content, tool_calls, metrics })
    }
}
