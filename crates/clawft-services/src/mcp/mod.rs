//! MCP (Model Context Protocol) client.
//!
//! Provides a client for communicating with MCP servers using
//! JSON-RPC 2.0 over pluggable transports (stdio or HTTP).

pub mod bridge;
pub mod composite;
pub mod discovery;
pub mod middleware;
pub mod provider;
pub mod server;
pub mod transport;
pub mod types;

pub use provider::{
    BuiltinToolProvider, CallToolResult, ContentBlock, SkillToolProvider, ToolError, ToolProvider,
    skill_to_tool_definition, skills_to_tool_definitions,
};

/// The MCP protocol version negotiated during initialize.
///
/// This constant is the single source of truth for protocol version
/// strings used in both client and server code.
pub const MCP_PROTOCOL_VERSION: &str = "2025-06-18";

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};
use transport::McpTransport;
use types::JsonRpcRequest;

/// Server capabilities returned from the MCP initialize handshake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities, if the server supports tools.
    #[serde(default)]
    pub tools: Option<serde_json::Value>,
    // Other capability fields can be added as needed.
}

/// Server information returned from the MCP initialize handshake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name.
    #[serde(default)]
    pub name: String,
    /// Server version.
    #[serde(default)]
    pub version: String,
}

/// Definition of an MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    #[serde(rename = "inputSchema", alias = "input_schema")]
    pub input_schema: serde_json::Value,
}

/// Client for communicating with an MCP server.
pub struct McpClient {
    transport: Box<dyn McpTransport>,
    request_id: AtomicU64,
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("request_id", &self.request_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl McpClient {
    /// Create a new MCP client with the given transport.
    pub fn new(transport: Box<dyn McpTransport>) -> Self {
        Self {
            transport,
            request_id: AtomicU64::new(1),
        }
    }

    /// List all tools available on the MCP server.
    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        let id = self.next_id();
        let request = JsonRpcRequest::new(id, "tools/list", serde_json::json!({}));

        let response = self.transport.send_request(request).await?;

        if let Some(err) = response.error {
            return Err(ServiceError::McpProtocol(format!(
                "code={}, message={}",
                err.code, err.message
            )));
        }

        let result = response
            .result
            .ok_or_else(|| ServiceError::McpProtocol("empty result".into()))?;

        // MCP returns tools in a `tools` array.
        let tools_value = result
            .get("tools")
            .cloned()
            .unwrap_or_else(|| serde_json::Value::Array(vec![]));

        let tools: Vec<ToolDefinition> = serde_json::from_value(tools_value)?;
        Ok(tools)
    }

    /// Call a tool on the MCP server.
    pub async fn call_tool(
        &self,
        name: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let id = self.next_id();
        let request = JsonRpcRequest::new(
            id,
            "tools/call",
            serde_json::json!({
                "name": name,
                "arguments": params,
            }),
        );

        let response = self.transport.send_request(request).await?;

        if let Some(err) = response.error {
            return Err(ServiceError::McpProtocol(format!(
                "code={}, message={}",
                err.code, err.message
            )));
        }

        response
            .result
            .ok_or_else(|| ServiceError::McpProtocol("empty result".into()))
    }

    /// Send a raw JSON-RPC request and return the result value.
    ///
    /// Unlike `list_tools` and `call_tool`, this method does not interpret
    /// the response -- it simply returns the raw `serde_json::Value` from
    /// the `result` field, or an error if the response contains one.
    pub async fn send_raw(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let id = self.next_id();
        let request = JsonRpcRequest::new(id, method, params);
        let response = self.transport.send_request(request).await?;

        if let Some(err) = response.error {
            return Err(ServiceError::McpProtocol(format!(
                "code={}, message={}",
                err.code, err.message
            )));
        }

        response
            .result
            .ok_or_else(|| ServiceError::McpProtocol("empty result".into()))
    }

    /// Access the underlying transport.
    pub fn transport(&self) -> &dyn McpTransport {
        &*self.transport
    }

    /// Generate the next request ID.
    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// An MCP session that has completed the initialize handshake.
///
/// Wraps an [`McpClient`] and holds the server capabilities, server info,
/// and negotiated protocol version obtained during the handshake.
///
/// Use [`McpSession::connect`] to create a session -- it will:
/// 1. Send an `initialize` request with client capabilities.
/// 2. Parse the server's response (capabilities, info, protocol version).
/// 3. Send the `notifications/initialized` notification.
pub struct McpSession {
    client: McpClient,
    /// Capabilities reported by the server.
    pub server_capabilities: ServerCapabilities,
    /// Server identification (name + version).
    pub server_info: ServerInfo,
    /// Protocol version negotiated with the server.
    pub protocol_version: String,
}

impl McpSession {
    /// Connect to an MCP server by performing the initialize handshake.
    pub async fn connect(transport: Box<dyn McpTransport>) -> Result<Self> {
        let client = McpClient::new(transport);

        // Step 1: Send initialize request.
        let init_result = client
            .send_raw(
                "initialize",
                serde_json::json!({
                    "protocolVersion": MCP_PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "clientInfo": {
                        "name": "clawft",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            )
            .await?;

        // Step 2: Parse server response.
        let server_capabilities: ServerCapabilities =
            serde_json::from_value(init_result.get("capabilities").cloned().unwrap_or_default())
                .unwrap_or_default();

        let server_info: ServerInfo =
            serde_json::from_value(init_result.get("serverInfo").cloned().unwrap_or_default())
                .unwrap_or_default();

        let protocol_version = init_result
            .get("protocolVersion")
            .and_then(|v| v.as_str())
            .unwrap_or(MCP_PROTOCOL_VERSION)
            .to_string();

        // Step 3: Send initialized notification.
        client
            .transport()
            .send_notification("notifications/initialized", serde_json::json!({}))
            .await?;

        Ok(Self {
            client,
            server_capabilities,
            server_info,
            protocol_version,
        })
    }

    /// List tools available on the connected server.
    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        self.client.list_tools().await
    }

    /// Call a tool on the connected server.
    pub async fn call_tool(
        &self,
        name: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.client.call_tool(name, params).await
    }

    /// Access the underlying client.
    pub fn client(&self) -> &McpClient {
        &self.client
    }
}

impl std::fmt::Debug for McpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpSession")
            .field("server_info", &self.server_info)
            .field("protocol_version", &self.protocol_version)
            .finish_non_exhaustive()
    }
}
