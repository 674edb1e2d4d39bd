//! MCP server clients.
//!
//! Discovery reads the tool catalog from the server's SSE stream; execution
//! POSTs tool calls to the message endpoint. Each call is independent and
//! every error is terminal for the call that produced it.

pub mod discovery;
pub mod execution;
pub mod operation;
pub mod sse_transport;

use thiserror::Error;

/// Errors surfaced by discovery and invocation.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("SSE connection to {url} failed: {reason}")]
    Connection { url: String, reason: String },

    #[error("SSE connection to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Malformed tools payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Tool call to {endpoint} failed: {message}")]
    ToolCallFailed { endpoint: String, message: String },
}
