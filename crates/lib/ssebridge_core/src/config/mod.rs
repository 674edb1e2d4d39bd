// @zen-component: CFG-ConnectionConfig
//
//! Connection configuration: the settings the host supplies for one
//! discovery or invocation call.
//!
//! Settings arrive as a [`RawConnectionConfig`] (JSON, camelCase keys) and are
//! resolved once into an immutable [`ConnectionConfig`]. Header parsing
//! happens during resolution, never per call.

pub mod headers;

use std::path::Path;
use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    MissingField(&'static str),

    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The `headers` setting, either as a JSON object or as a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderSource {
    /// Already a mapping of header name to value.
    Map(serde_json::Map<String, serde_json::Value>),
    /// A string that should contain a JSON object.
    Raw(String),
}

/// Connection settings as supplied by the host, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConnectionConfig {
    /// SSE endpoint used for tool discovery.
    pub sse_url: Option<String>,
    /// Connection-open timeout in milliseconds. Zero or absent disables it.
    pub sse_timeout: Option<u64>,
    /// HTTP endpoint that receives tool invocations.
    pub message_endpoint: Option<String>,
    /// Extra request headers.
    pub headers: Option<HeaderSource>,
}

impl RawConnectionConfig {
    /// Parse settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse settings from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: RawConnectionConfig) -> Self {
        Self {
            sse_url: other.sse_url.or(self.sse_url),
            sse_timeout: other.sse_timeout.or(self.sse_timeout),
            message_endpoint: other.message_endpoint.or(self.message_endpoint),
            headers: other.headers.or(self.headers),
        }
    }
}

/// Resolved, immutable connection settings.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub sse_url: Url,
    /// `None` means wait for the connection indefinitely.
    pub sse_timeout: Option<Duration>,
    pub message_endpoint: Url,
    pub headers: HeaderMap,
}

impl ConnectionConfig {
    /// Validate raw settings and resolve headers.
    pub fn resolve(raw: RawConnectionConfig) -> Result<Self, ConfigError> {
        let sse_url = parse_required_url("sseUrl", raw.sse_url.as_deref())?;
        let message_endpoint =
            parse_required_url("messageEndpoint", raw.message_endpoint.as_deref())?;
        let sse_timeout = raw
            .sse_timeout
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        let headers = headers::resolve_headers(raw.headers.as_ref());

        Ok(Self {
            sse_url,
            sse_timeout,
            message_endpoint,
            headers,
        })
    }

    /// Configured timeout in milliseconds, zero when disabled.
    pub fn sse_timeout_ms(&self) -> u64 {
        self.sse_timeout
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

fn parse_required_url(field: &'static str, value: Option<&str>) -> Result<Url, ConfigError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingField(field))?;
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: format!("{value}: {e}"),
    })
}
