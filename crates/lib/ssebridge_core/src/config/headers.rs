//! Resolution of the `headers` setting into a request [`HeaderMap`].
//!
//! Header problems are never fatal: anything that cannot be used is logged
//! and dropped, and the call proceeds with the remaining headers.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use tracing::warn;

use super::HeaderSource;

/// Resolve the configured headers once, skipping anything unusable.
pub fn resolve_headers(source: Option<&HeaderSource>) -> HeaderMap {
    let mut header_map = HeaderMap::new();
    match source {
        None => {}
        Some(HeaderSource::Map(map)) => add_custom_headers(&mut header_map, map),
        Some(HeaderSource::Raw(raw)) => {
            if raw.trim().is_empty() {
                return header_map;
            }
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => add_custom_headers(&mut header_map, &map),
                Ok(other) => {
                    warn!(kind = json_kind(&other), "headers setting is not a JSON object, ignoring it");
                }
                Err(e) => {
                    warn!(error = %e, "failed to parse headers setting, ignoring it");
                }
            }
        }
    }
    header_map
}

/// Add custom headers from a JSON object to a reqwest HeaderMap.
fn add_custom_headers(header_map: &mut HeaderMap, headers: &Map<String, Value>) {
    for (k, v) in headers {
        let Some(val) = v.as_str() else {
            warn!(header = %k, "header value is not a string, skipping");
            continue;
        };
        match (
            HeaderName::from_bytes(k.as_bytes()),
            HeaderValue::from_str(val),
        ) {
            (Ok(name), Ok(value)) => {
                header_map.insert(name, value);
            }
            (Err(e), _) => warn!(header = %k, error = %e, "invalid header name, skipping"),
            (_, Err(e)) => warn!(header = %k, error = %e, "invalid header value, skipping"),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
