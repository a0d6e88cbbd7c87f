//! SSE (Server-Sent Events) line parser for OpenAI-compatible streaming.
//!
//! Parses the `data:` lines from an SSE stream into [`StreamChunk`] values.
//! The OpenAI streaming format sends lines like:
//!
//! ```text
//! data: {"id":"...","choices":[{"delta":{"content":"Hello"},...}],...}
//!
//! data: {"id":"...","choices":[{"delta":{"content":" world"},...}],...}
//!
//! data: [DONE]
//! ```
//!
//! Each non-empty `data:` line is either:
//! - A JSON object containing a streaming delta
//! - The literal `[DONE]` sentinel marking end of stream

use crate::error::{ProviderError, Result};
use crate::types::{StreamChunk, StreamDelta, StreamDeltaUsage, Usage};

/// The sentinel value that marks the end of an SSE stream.
const DONE_SENTINEL: &str = "[DONE]";

/// Parse a single SSE `data:` line into zero or more [`StreamChunk`] values.
///
/// Returns `Ok(vec![])` for:
/// - Empty lines (SSE event boundaries)
/// - Lines that are not `data:` prefixed (comments, event types)
/// - `data:` lines with empty payloads
///
/// Returns `Ok(vec![chunk])` for normal delta lines, or `Ok(vec![Done])`
/// for the `[DONE]` sentinel.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidResponse`] if a `data:` line contains
/// JSON that cannot be parsed as a streaming delta.
pub fn parse_sse_line(line: &str) -> Result<Vec<StreamChunk>> {
    let line = line.trim_end();

    // Skip empty lines (SSE event boundaries) and non-data lines
    if line.is_empty() || line.starts_with(':') {
        return Ok(vec![]);
    }

    // Must be a data: line
    let payload = if let Some(rest) = line.strip_prefix("data:") {
        rest.trim_start()
    } else {
        // event:, id:, retry: lines -- skip
        return Ok(vec![]);
    };

    // Empty data payload
    if payload.is_empty() {
        return Ok(vec![]);
    }

    // [DONE] sentinel
    if payload == DONE_SENTINEL {
        return Ok(vec![StreamChunk::Done {
            finish_reason: None,
            usage: None,
        }]);
    }

    // Parse JSON delta
    let delta: StreamDelta = serde_json::from_str(payload)
        .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse SSE delta: {e}")))?;

    Ok(convert_delta_to_chunks(&delta))
}

/// Convert a parsed [`StreamDelta`] into a list of [`StreamChunk`] values.
///
/// A single delta can produce:
/// - A `TextDelta` if the delta has text content
/// - One or more `ToolCallDelta` chunks if the delta has tool calls
/// - A `Done` chunk if a finish_reason is present
fn convert_delta_to_chunks(delta: &StreamDelta) -> Vec<StreamChunk> {
    let mut chunks = Vec::new();

    if let Some(choice) = delta.choices.first() {
        // Text content delta
        if let Some(ref text) = choice.delta.content
            && !text.is_empty()
        {
            chunks.push(StreamChunk::TextDelta { text: text.clone() });
        }

        // Tool call deltas
        if let Some(ref tool_calls) = choice.delta.tool_calls {
            for tc in tool_calls {
                let (name, arguments) = match &tc.function {
                    Some(f) => (f.name.clone(), f.arguments.clone()),
                    None => (None, None),
                };
                chunks.push(StreamChunk::ToolCallDelta {
                    index: tc.index,
                    id: tc.id.clone(),
                    name,
                    arguments,
                });
            }
        }

        // Finish reason signals end of stream
        if choice.finish_reason.is_some() {
            let usage = delta.usage.as_ref().map(convert_usage);
            chunks.push(StreamChunk::Done {
                finish_reason: choice.finish_reason.clone(),
                usage,
            });
        }
    }

    chunks
}

/// Convert streaming usage stats to the public [`Usage`] type.
fn convert_usage(u: &StreamDeltaUsage) -> Usage {
    Usage {
        input_tokens: u.prompt_tokens.unwrap_or(0) as u32,
        output_tokens: u.completion_tokens.unwrap_or(0) as u32,
        total_tokens: u.total_tokens.unwrap_or(0) as u32,
    }
}
