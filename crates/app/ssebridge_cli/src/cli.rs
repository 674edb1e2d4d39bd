use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use ssebridge_core::config::{ConnectionConfig, HeaderSource, RawConnectionConfig};
use ssebridge_core::mcp::operation::Operation;
use ssebridge_core::models::tool::{ToolFilter, ToolType};

use crate::Result;

/// Connection timeout applied when neither a flag nor the config file sets one.
pub const DEFAULT_SSE_TIMEOUT_MS: u64 = 60_000;

/// Discover and invoke tools on a remote MCP server.
#[derive(Parser, Debug)]
#[command(name = "ssebridge", about = "Discover and invoke tools on a remote MCP server")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Log discovery and invocation details to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection settings. Flags override values read from `--config`.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// JSON file with `sseUrl`, `sseTimeout`, `messageEndpoint` and `headers`.
    #[arg(long, global = true, env = "SSEBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// SSE endpoint used for tool discovery.
    #[arg(long, global = true, env = "SSEBRIDGE_SSE_URL")]
    pub sse_url: Option<String>,

    /// Connection-open timeout in milliseconds (0 = wait indefinitely).
    #[arg(long, global = true, env = "SSEBRIDGE_SSE_TIMEOUT")]
    pub sse_timeout: Option<u64>,

    /// HTTP endpoint that receives tool calls.
    #[arg(long, global = true, env = "SSEBRIDGE_MESSAGE_ENDPOINT")]
    pub message_endpoint: Option<String>,

    /// Extra request headers as a JSON object, e.g. '{"Authorization":"Bearer x"}'.
    #[arg(long, global = true, env = "SSEBRIDGE_HEADERS")]
    pub headers: Option<String>,
}

impl ConnectionArgs {
    /// Combine the config file (if any) with flag values.
    pub fn to_raw(&self) -> Result<RawConnectionConfig> {
        let base = match &self.config {
            Some(path) => RawConnectionConfig::from_file(path)?,
            None => RawConnectionConfig::default(),
        };
        let overlay = RawConnectionConfig {
            sse_url: self.sse_url.clone(),
            sse_timeout: self.sse_timeout,
            message_endpoint: self.message_endpoint.clone(),
            headers: self.headers.clone().map(HeaderSource::Raw),
        };
        let mut raw = base.merge(overlay);
        raw.sse_timeout = raw.sse_timeout.or(Some(DEFAULT_SSE_TIMEOUT_MS));
        Ok(raw)
    }

    pub fn resolve(&self) -> Result<ConnectionConfig> {
        Ok(ConnectionConfig::resolve(self.to_raw()?)?)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the version.
    Version,

    /// Read the tool catalog from the SSE stream.
    Discover {
        /// Tool type to keep.
        #[arg(long, default_value = "all")]
        tool_type: ToolType,

        /// Keep tools whose name contains this text (overrides --tool-type).
        #[arg(long)]
        filter: Option<String>,
    },

    /// Call one tool on the message endpoint.
    Execute {
        /// Name of the tool to call.
        #[arg(long)]
        tool: String,

        /// Tool parameters as a JSON object (default: {}).
        #[arg(long)]
        params: Option<String>,
    },
}

impl Commands {
    /// The operation this command runs, or `None` for local commands.
    pub fn operation(&self) -> Result<Option<Operation>> {
        let operation = match self {
            Self::Version => return Ok(None),
            Self::Discover { tool_type, filter } => Operation::Discover {
                filter: match filter {
                    Some(needle) => ToolFilter::from_value(Some(needle.as_str())),
                    None => tool_type.filter(),
                },
            },
            Self::Execute { tool, params } => {
                Operation::execute_from_json(tool.as_str(), params.as_deref())?
            }
        };
        Ok(Some(operation))
    }
}
