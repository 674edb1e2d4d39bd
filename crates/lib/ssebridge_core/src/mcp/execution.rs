// @zen-component: BRIDGE-ToolInvoker
//
//! Tool invocation. POSTs a `toolCall` envelope to the message endpoint.
//!
//! 1. Validates the tool name and parameters (no request on failure).
//! 2. Merges `Content-Type: application/json` with the configured headers.
//! 3. Sends one POST and returns the parsed response body.

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;

use super::McpError;

/// A validated tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    tool_name: String,
    parameters: Map<String, Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    tool_call: ToolCall<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolCall<'a> {
    tool_name: &'a str,
    parameters: &'a Map<String, Value>,
}

impl InvocationRequest {
    /// Validate a tool name and its parameters.
    ///
    /// The name must be non-empty and the parameters must be a JSON object.
    pub fn new(tool_name: impl Into<String>, parameters: Value) -> Result<Self, McpError> {
        let tool_name = tool_name.into();
        if tool_name.is_empty() {
            return Err(McpError::InvalidArgument(
                "tool name must be a non-empty string".into(),
            ));
        }
        let Value::Object(parameters) = parameters else {
            return Err(McpError::InvalidArgument(format!(
                "parameters for '{tool_name}' must be a JSON object, got {}",
                describe(&parameters)
            )));
        };
        Ok(Self {
            tool_name,
            parameters,
        })
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    /// The request body: `{"toolCall": {"toolName": ..., "parameters": {...}}}`.
    pub fn to_body(&self) -> Result<Vec<u8>, McpError> {
        let envelope = Envelope {
            tool_call: ToolCall {
                tool_name: &self.tool_name,
                parameters: &self.parameters,
            },
        };
        serde_json::to_vec(&envelope)
            .map_err(|e| McpError::InvalidArgument(format!("failed to encode tool call: {e}")))
    }
}

/// Sends tool calls to the configured message endpoint.
#[derive(Debug, Clone, Default)]
pub struct ToolInvoker {
    client: reqwest::Client,
}

impl ToolInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Validate, then POST one tool call and return the response body.
    pub async fn invoke(
        &self,
        config: &ConnectionConfig,
        tool_name: &str,
        parameters: Value,
    ) -> Result<Value, McpError> {
        let request = InvocationRequest::new(tool_name, parameters)?;
        self.send(config, &request).await
    }

    /// POST an already validated tool call.
    pub async fn send(
        &self,
        config: &ConnectionConfig,
        request: &InvocationRequest,
    ) -> Result<Value, McpError> {
        let endpoint = config.message_endpoint.as_str();
        let body = request.to_body()?;
        debug!(
            endpoint,
            tool = request.tool_name(),
            parameters = request.parameters().len(),
            "sending tool call"
        );

        let response = self
            .client
            .post(config.message_endpoint.clone())
            .headers(merge_headers(&config.headers))
            .body(body)
            .send()
            .await
            .map_err(|e| tool_call_failed(endpoint, failure_message(None, None, &e.to_string())))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            tool_call_failed(endpoint, failure_message(Some(status), None, &e.to_string()))
        })?;
        let body = parse_body(&text);

        if !status.is_success() {
            let message = failure_message(
                Some(status),
                Some(&body),
                &format!("request failed with status code {}", status.as_u16()),
            );
            return Err(tool_call_failed(endpoint, message));
        }

        info!(
            endpoint,
            tool = request.tool_name(),
            status = status.as_u16(),
            bytes = text.len(),
            "tool call succeeded"
        );
        Ok(body)
    }
}

/// `Content-Type: application/json` first, configured headers on top.
pub fn merge_headers(extra: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in extra {
        headers.insert(name.clone(), value.clone());
    }
    headers
}

/// Describe a failed call: non-blank body `message`, else
/// `"{status} {reason}"`, else the transport error.
pub fn failure_message(
    status: Option<StatusCode>,
    body: Option<&Value>,
    transport_message: &str,
) -> String {
    match body.and_then(|b| b.get("message")) {
        Some(Value::String(message)) if !message.trim().is_empty() => return message.clone(),
        Some(Value::String(_)) | Some(Value::Null) | None => {}
        Some(other) => return other.to_string(),
    }
    if let Some(status) = status {
        return format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        )
        .trim_end()
        .to_string();
    }
    transport_message.to_string()
}

fn tool_call_failed(endpoint: &str, message: String) -> McpError {
    warn!(endpoint, error = %message, "tool call failed");
    McpError::ToolCallFailed {
        endpoint: endpoint.to_string(),
        message,
    }
}

/// JSON when the body parses, the raw text otherwise, `null` when empty.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
