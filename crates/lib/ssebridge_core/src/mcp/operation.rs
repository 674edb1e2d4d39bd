//! Host-facing operation modes.
//!
//! The host picks exactly one mode per run: `discover` reads the tool
//! catalog, `execute` calls one tool. The two never call each other.

use serde_json::Value;
use tracing::info;

use crate::config::ConnectionConfig;
use crate::models::tool::ToolFilter;

use super::McpError;
use super::discovery::ToolDiscovery;
use super::execution::ToolInvoker;
use super::sse_transport::{ReqwestSseConnector, SseConnector};

/// One unit of work requested by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Discover { filter: ToolFilter },
    Execute { tool_name: String, parameters: Value },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Discover { .. } => "discover",
            Self::Execute { .. } => "execute",
        }
    }

    /// Build an execute operation from parameters supplied as JSON text.
    ///
    /// Absent or blank text means no parameters (`{}`).
    pub fn execute_from_json(
        tool_name: impl Into<String>,
        parameters: Option<&str>,
    ) -> Result<Self, McpError> {
        let tool_name = tool_name.into();
        let parameters = match parameters.map(str::trim).filter(|p| !p.is_empty()) {
            Some(text) => serde_json::from_str(text).map_err(|e| {
                McpError::InvalidArgument(format!("parameters for '{tool_name}' are not valid JSON: {e}"))
            })?,
            None => Value::Object(Default::default()),
        };
        Ok(Self::Execute {
            tool_name,
            parameters,
        })
    }
}

/// Discovery and invocation clients behind a single entry point.
#[derive(Debug, Clone, Default)]
pub struct Connector<C = ReqwestSseConnector> {
    discovery: ToolDiscovery<C>,
    invoker: ToolInvoker,
}

impl Connector<ReqwestSseConnector> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: SseConnector> Connector<C> {
    pub fn with_parts(discovery: ToolDiscovery<C>, invoker: ToolInvoker) -> Self {
        Self { discovery, invoker }
    }

    /// Run one operation and return its JSON result.
    ///
    /// Discovery yields `{"tools": [...]}`; execution yields the server's
    /// response body unchanged.
    pub async fn run(
        &self,
        config: &ConnectionConfig,
        operation: Operation,
    ) -> Result<Value, McpError> {
        info!(operation = operation.name(), "running operation");
        match operation {
            Operation::Discover { filter } => {
                let catalog = self.discovery.discover(config, &filter).await?;
                serde_json::to_value(catalog).map_err(|e| {
                    McpError::MalformedPayload(format!("failed to encode catalog: {e}"))
                })
            }
            Operation::Execute {
                tool_name,
                parameters,
            } => self.invoker.invoke(config, &tool_name, parameters).await,
        }
    }
}
