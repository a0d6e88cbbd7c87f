//! MCP IDE integration -- VS Code extension backend.
//!
//! Provides a [`ToolProvider`] implementation that exposes IDE-specific
//! tools through the MCP server. These tools allow agents to interact
//! with a connected IDE (VS Code or compatible editor) via tool calls.
//!
//! # Architecture
//!
//! `IdeToolProvider` implements [`ToolProvider`] and is registered with
//! [`CompositeToolProvider`] alongside builtin and skill providers.
//! This makes IDE tools appear in `tools/list` and callable via
//! `tools/call`.
//!
//! # Tools
//!
//! | Tool | Description |
//! |------|-------------|
//! | `ide_open_file` | Open a file in the editor |
//! | `ide_edit` | Apply a text edit to an open document |
//! | `ide_diagnostics` | Get current diagnostics (errors, warnings) |
//! | `ide_symbols` | Search workspace symbols |
//! | `ide_hover` | Get hover information for a position |

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ToolDefinition;
use super::provider::{CallToolResult, ToolError, ToolProvider};

// ---------------------------------------------------------------------------
// IDE tool definitions
// ---------------------------------------------------------------------------

/// All IDE tool definitions.
fn ide_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "ide_open_file".into(),
            description: "Open a file in the IDE editor at an optional line number".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Absolute or workspace-relative path to the file"
                    },
                    "line": {
                        "type": "integer",
                        "description": "Line number to reveal (1-based, optional)"
                    },
                    "column": {
                        "type": "integer",
                        "description": "Column number (1-based, optional)"
                    }
                },
                "required": ["path"]
            }),
        },
        ToolDefinition {
            name: "ide_edit".into(),
            description: "Apply a text edit to an open document in the IDE".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the file to edit"
                    },
                    "range": {
                        "type": "object",
                        "description": "Range to replace (startLine, startCol, endLine, endCol), 0-based",
                        "properties": {
                            "startLine": { "type": "integer" },
                            "startCol": { "type": "integer" },
                            "endLine": { "type": "integer" },
                            "endCol": { "type": "integer" }
                        },
                        "required": ["startLine", "startCol", "endLine", "endCol"]
                    },
                    "text": {
                        "type": "string",
                        "description": "Replacement text"
                    }
                },
                "required": ["path", "range", "text"]
            }),
        },
        ToolDefinition {
            name: "ide_diagnostics".into(),
            description: "Get current diagnostics (errors, warnings) from the IDE".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Optional file path to filter diagnostics"
                    },
                    "severity": {
                        "type": "string",
                        "description": "Minimum severity to include",
                        "enum": ["error", "warning", "info", "hint"]
                    }
                }
            }),
        },
        ToolDefinition {
            name: "ide_symbols".into(),
            description: "Search workspace symbols in the IDE".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Symbol search query"
                    },
                    "kind": {
                        "type": "string",
                        "description": "Filter by symbol kind (function, class, interface, etc.)"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results",
                        "default": 25
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "ide_hover".into(),
            description: "Get hover information for a position in a file".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "File path"
                    },
                    "line": {
                        "type": "integer",
                        "description": "Line number (0-based)"
                    },
                    "column": {
                        "type": "integer",
                        "description": "Column number (0-based)"
                    }
                },
                "required": ["path", "line", "column"]
            }),
        },
    ]
}

// ---------------------------------------------------------------------------
// IdeDispatcher trait
// ---------------------------------------------------------------------------

/// Callback for IDE tool execution.
///
/// The IDE extension provides an implementation that forwards tool
/// calls to the actual editor. For testing, a mock can be provided.
pub type IdeDispatchFn =
    dyn Fn(&str, Value) -> Pin<Box<dyn Future<Output = Result<String, String>> + Send>>
        + Send
        + Sync;

// ---------------------------------------------------------------------------
// IdeToolProvider
// ---------------------------------------------------------------------------

/// A [`ToolProvider`] that exposes IDE-specific tools via MCP.
///
/// Created by the integration layer when a VS Code extension connects.
/// The dispatcher is provided by the extension backend and routes
/// tool calls to the actual IDE.
pub struct IdeToolProvider {
    tools: Vec<ToolDefinition>,
    dispatcher: Arc<IdeDispatchFn>,
}

impl IdeToolProvider {
    /// Create a new IDE tool provider with a custom dispatcher.
    pub fn new<F>(dispatcher: F) -> Self
    where
        F: Fn(&str, Value) -> Pin<Box<dyn Future<Output = Result<String, String>> + Send>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            tools: ide_tool_definitions(),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Create a provider with a no-op dispatcher (useful for listing tools
    /// without an actual IDE connection).
    pub fn stub() -> Self {
        Self::new(|name, _args| {
            let name = name.to_string();
            Box::pin(async move {
                Err(format!("IDE not connected: cannot execute '{name}'"))
            })
        })
    }
}

impl std::fmt::Debug for IdeToolProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdeToolProvider")
            .field("tool_count", &self.tools.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ToolProvider for IdeToolProvider {
    fn namespace(&self) -> &str {
        "ide"
    }

    fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.clone()
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<CallToolResult, ToolError> {
        // Verify the tool exists.
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(ToolError::NotFound(name.to_string()));
        }

        let fut = (self.dispatcher)(name, args);
        match fut.await {
            Ok(output) => Ok(CallToolResult::text(output)),
            Err(msg) => Ok(CallToolResult::error(msg)),
        }
    }
}

// ---------------------------------------------------------------------------
// IDE types (for structured communication with the extension)
// ---------------------------------------------------------------------------

/// A diagnostic entry from the IDE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeDiagnostic {
    /// File path.
    pub path: String,
    /// Diagnostic severity.
    pub severity: DiagnosticSeverity,
    /// Diagnostic message.
    pub message: String,
    /// Start line (0-based).
    pub line: usize,
    /// Start column (0-based).
    pub column: usize,
    /// Source (e.g., "typescript", "rust-analyzer").
    #[serde(default)]
    pub source: String,
}

/// Diagnostic severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
    Hint,
}

/// A workspace symbol from the IDE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeSymbol {
    /// Symbol name.
    pub name: String,
    /// Symbol kind (function, class, etc.).
    pub kind: String,
    /// File path containing the symbol.
    pub path: String,
    /// Line number (0-based).
    pub line: usize,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
