//! Service error types.

use thiserror::Error;

/// Errors produced by services in this crate.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A cron expression could not be parsed.
    #[error("invalid cron expression: {0}")]
    InvalidCronExpression(String),

    /// The requested job was not found.
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// A job with the given name already exists.
    #[error("duplicate job name: {0}")]
    DuplicateJobName(String),

    /// MCP transport-layer failure.
    #[error("mcp transport error: {0}")]
    McpTransport(String),

    /// MCP protocol-layer failure (JSON-RPC error).
    #[error("mcp protocol error: {0}")]
    McpProtocol(String),

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,
}

/// Convenience alias for results in this crate.
pub type Result<T> = std::result::Result<T, ServiceError>;
