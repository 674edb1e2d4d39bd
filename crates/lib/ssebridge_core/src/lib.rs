//! # ssebridge_core
//!
//! Discovery and invocation clients for a remote MCP tool server.
//!
//! Discovery subscribes to the server's SSE stream and waits for a single
//! `tools` event carrying the tool catalog. Invocation POSTs a `toolCall`
//! envelope to the server's message endpoint.

pub mod config;
pub mod mcp;
pub mod models;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
