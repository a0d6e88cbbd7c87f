//! Schema conversion utilities for tool delegation.
//!
//! Converts between OpenAI function-calling format and Anthropic tool format,
//! enabling tools defined in one schema to be used with the other provider.

use serde_json::{Value, json};

/// Convert an array of OpenAI function-calling tool schemas to Anthropic
/// tool format.
///
/// # OpenAI format (input)
/// ```json
/// {
///   "type": "function",
///   "function": {
///     "name": "get_weather",
///     "description": "Get the current weather",
///     "parameters": { "type": "object", "properties": { ... } }
///   }
/// }
/// ```
///
/// # Anthropic format (output)
/// ```json
/// {
///   "name": "get_weather",
///   "description": "Get the current weather",
///   "input_schema": { "type": "object", "properties": { ... } }
/// }
/// ```
///
/// Tools that cannot be converted (missing `function` field, etc.) are
/// silently skipped.
pub fn openai_to_anthropic(schemas: &[Value]) -> Vec<Value> {
    schemas
        .iter()
        .filter_map(|tool| {
            let func = tool.get("function")?;
            let name = func.get("name")?.as_str()?;
            let description = func
                .get("description")
                .and_then(|d| d.as_str())
                .unwrap_or("");

            let input_schema = func
                .get("parameters")
                .cloned()
                .unwrap_or_else(|| json!({"type": "object", "properties": {}}));

            Some(json!({
                "name": name,
                "description": description,
                "input_schema": input_schema,
            }))
        })
        .collect()
}

/// Build an Anthropic `tool_result` content block.
///
/// # Anthropic tool_result format
/// ```json
/// {
///   "type": "tool_result",
///   "tool_use_id": "toolu_abc123",
///   "content": "The weather in SF is 72F and sunny."
/// }
/// ```
pub fn tool_result_block(tool_use_id: &str, result: &str) -> Value {
    json!({
        "type": "tool_result",
        "tool_use_id": tool_use_id,
        "content": result,
    })
}
