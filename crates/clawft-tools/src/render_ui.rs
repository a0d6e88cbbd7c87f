//! Render UI tool for pushing canvas elements to the Live Canvas.
//!
//! Agents call this tool to render, update, or remove UI elements
//! on the canvas. The tool parses the input as a [`CanvasCommand`]
//! and logs it. Real message bus integration will come in a later
//! milestone; for now this is a functional stub that validates
//! input and returns success.

use async_trait::async_trait;
use clawft_core::tools::registry::{Tool, ToolError};
use clawft_types::canvas::CanvasCommand;
use serde_json::json;
use tracing::{debug, info};

/// Tool that agents invoke to push UI elements to the canvas.
///
/// Accepts a JSON payload conforming to the [`CanvasCommand`] protocol
/// and (in the future) publishes it to the message bus for WebSocket
/// delivery to connected clients.
pub struct RenderUiTool;

impl RenderUiTool {
    /// Create a new `RenderUiTool`.
    pub fn new() -> Self {
        Self
    }
}

impl Default for RenderUiTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for RenderUiTool {
    fn name(&self) -> &str {
        "render_ui"
    }

    fn description(&self) -> &str {
        "Render a UI element on the Live Canvas. Supports text, buttons, inputs, images, code blocks, tables, and forms."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The canvas command: render, update, remove, reset, or batch",
                    "enum": ["render", "update", "remove", "reset", "batch"]
                },
                "id": {
                    "type": "string",
                    "description": "Element ID (required for render, update, remove)"
                },
                "element": {
                    "type": "object",
                    "description": "The canvas element to render or update",
                    "properties": {
                        "type": {
                            "type": "string",
                            "description": "Element type: text, button, input, image, code, table, form",
                            "enum": ["text", "button", "input", "image", "code", "table", "form"]
                        }
                    }
                },
                "position": {
                    "type": "integer",
                    "description": "Optional position index for render command"
                },
                "commands": {
                    "type": "array",
                    "description": "Array of sub-commands for batch command",
                    "items": { "type": "object" }
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        // Parse the input as a CanvasCommand.
        let command: CanvasCommand = serde_json::from_value(args.clone()).map_err(|e| {
            ToolError::InvalidArgs(format!("invalid canvas command: {e}"))
        })?;

        // Extract the element ID for the response (if applicable).
        let element_id = match &command {
            CanvasCommand::Render { id, .. } => Some(id.clone()),
            CanvasCommand::Update { id, .. } => Some(id.clone()),
            CanvasCommand::Remove { id } => Some(id.clone()),
            CanvasCommand::Reset => None,
            CanvasCommand::Batch { commands } => {
                info!(count = commands.len(), "processing batch canvas command");
                None
            }
        };

        debug!(?command, "render_ui tool invoked");

        // In the future, this will publish to the message bus.
        // For now, return success with the element ID.
        Ok(json!({
            "status": "rendered",
            "element_id": element_id,
        }))
    }
}
