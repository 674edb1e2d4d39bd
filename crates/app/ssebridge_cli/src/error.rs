use thiserror::Error;

use ssebridge_core::config::ConfigError;
use ssebridge_core::mcp::McpError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("{}", .0)]
    Config(#[from] ConfigError),

    #[error("{}", .0)]
    Mcp(#[from] McpError),

    #[error("Json::{:?}: {}", .0, .0)]
    Json(#[from] serde_json::Error),

    #[error("Filter::{:?}: {}", .0, .0)]
    Filter(#[from] tracing_subscriber::filter::ParseError),
}
