// @zen-component: BRIDGE-ToolDiscovery
//
//! Tool discovery over SSE.
//!
//! 1. Open the SSE connection, racing it against the configured timeout
//! 2. Wait for the first `tools` event, ignoring every other event
//! 3. Parse the catalog (all or nothing) and close the connection
//! 4. Apply the name filter

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::models::tool::{ToolCatalog, ToolFilter};

use super::McpError;
use super::sse_transport::{ReqwestSseConnector, SseConnection, SseConnector};

/// Name of the SSE event that carries the tool catalog.
pub const TOOLS_EVENT: &str = "tools";

/// Discovers the tool catalog published on an SSE stream.
#[derive(Debug, Clone, Default)]
pub struct ToolDiscovery<C = ReqwestSseConnector> {
    connector: C,
}

impl ToolDiscovery<ReqwestSseConnector> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: SseConnector> ToolDiscovery<C> {
    pub fn with_connector(connector: C) -> Self {
        Self { connector }
    }

    /// Fetch the catalog once and return the tools the filter retains.
    ///
    /// The timeout, when configured, covers connection establishment only.
    /// Waiting for the `tools` event afterwards is unbounded.
    pub async fn discover(
        &self,
        config: &ConnectionConfig,
        filter: &ToolFilter,
    ) -> Result<ToolCatalog, McpError> {
        let mut connection = self.open(config).await?;

        let result = wait_for_tools(&mut connection).await;
        connection.close();

        let catalog = result.inspect_err(|e| warn!(url = %config.sse_url, error = %e, "tool discovery failed"))?;
        let total = catalog.len();
        let catalog = filter.apply(catalog);
        info!(
            url = %config.sse_url,
            filter = %filter,
            total,
            retained = catalog.len(),
            "tool catalog discovered"
        );
        Ok(catalog)
    }

    /// Open the connection; whichever of open and timeout finishes first wins
    /// and the other is dropped.
    async fn open(&self, config: &ConnectionConfig) -> Result<SseConnection, McpError> {
        debug!(url = %config.sse_url, timeout_ms = config.sse_timeout_ms(), "opening SSE connection");
        let connect = self.connector.connect(&config.sse_url, &config.headers);

        let result = match config.sse_timeout {
            Some(limit) => match tokio::time::timeout(limit, connect).await {
                Ok(result) => result,
                Err(_) => Err(McpError::Timeout {
                    url: config.sse_url.to_string(),
                    timeout_ms: config.sse_timeout_ms(),
                }),
            },
            None => connect.await,
        };

        result.inspect_err(|e| warn!(url = %config.sse_url, error = %e, "SSE connection not opened"))
    }
}

/// Read events until the first `tools` event and parse its payload.
///
/// Unnamed, `message` and any other named events are skipped. A stream error
/// or the stream ending first fails with a connection error.
pub async fn wait_for_tools(connection: &mut SseConnection) -> Result<ToolCatalog, McpError> {
    loop {
        match connection.next_event().await {
            Some(Ok(sse)) => {
                if sse.event.as_deref() == Some(TOOLS_EVENT) {
                    let data = sse.data.as_deref().unwrap_or_default();
                    debug!(url = %connection.url(), bytes = data.len(), "tools event received");
                    return parse_catalog(data);
                }
                debug!(url = %connection.url(), event = ?sse.event, "ignoring SSE event");
            }
            Some(Err(e)) => {
                return Err(McpError::Connection {
                    url: connection.url().to_string(),
                    reason: format!("SSE stream error: {e}"),
                });
            }
            None => {
                return Err(McpError::Connection {
                    url: connection.url().to_string(),
                    reason: "SSE stream ended before tools event".into(),
                });
            }
        }
    }
}

/// Parse a `tools` event payload into a catalog.
///
/// The payload must be a JSON object with a `tools` array whose every element
/// has a string `name`; otherwise nothing is returned. Fields beyond the known
/// ones are carried through unchanged.
pub fn parse_catalog(data: &str) -> Result<ToolCatalog, McpError> {
    let value: Value = serde_json::from_str(data)
        .map_err(|e| McpError::MalformedPayload(format!("invalid JSON: {e}")))?;

    match value.get("tools") {
        Some(Value::Array(_)) => {}
        Some(_) => {
            return Err(McpError::MalformedPayload("`tools` is not an array".into()));
        }
        None => {
            return Err(McpError::MalformedPayload(
                "expected an object with a `tools` array".into(),
            ));
        }
    }

    serde_json::from_value(value)
        .map_err(|e| McpError::MalformedPayload(format!("invalid tool definition: {e}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use futures_util::StreamExt;
    use reqwest::header::HeaderMap;
    use sse_stream::Sse;
    use url::Url;

    use super::*;
    use crate::config::{ConnectionConfig, RawConnectionConfig};

    const SEARCH_CATALOG: &str = r#"{"tools":[{"name":"search_tool_A","description":"d","parameters":{"q":{"type":"string","description":"query"}}}]}"#;

    struct DropProbe(Arc<AtomicUsize>);

    impl DropProbe {
        fn touch(&self) {}
    }

    impl Drop for DropProbe {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Connector that opens after `delay` and replays canned events.
    #[derive(Default)]
    struct FakeConnector {
        delay: Duration,
        events: Vec<(Option<&'static str>, String)>,
        /// Delay before the first event is delivered.
        event_delay: Duration,
        /// Keep the stream open after the canned events.
        hold_open: bool,
        refuse: Option<&'static str>,
        opened: Arc<AtomicUsize>,
        attempts_dropped: Arc<AtomicUsize>,
        streams_dropped: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SseConnector for FakeConnector {
        async fn connect(&self, url: &Url, _headers: &HeaderMap) -> Result<SseConnection, McpError> {
            let _attempt = DropProbe(Arc::clone(&self.attempts_dropped));
            tokio::time::sleep(self.delay).await;

            if let Some(reason) = self.refuse {
                return Err(McpError::Connection {
                    url: url.to_string(),
                    reason: reason.into(),
                });
            }
            self.opened.fetch_add(1, Ordering::SeqCst);

            let events: Vec<Result<Sse, sse_stream::Error>> = self
                .events
                .iter()
                .map(|(name, data)| {
                    Ok(Sse {
                        event: name.map(str::to_string),
                        data: Some(data.clone()),
                        id: None,
                        retry: None,
                    })
                })
                .collect();
            let event_delay = self.event_delay;
            let head = futures_util::stream::once(tokio::time::sleep(event_delay))
                .filter_map(|_| async { None::<Result<Sse, sse_stream::Error>> });
            let tail = if self.hold_open {
                futures_util::stream::pending().boxed()
            } else {
                futures_util::stream::empty().boxed()
            };
            let probe = DropProbe(Arc::clone(&self.streams_dropped));
            let stream = head
                .chain(futures_util::stream::iter(events))
                .chain(tail)
                .map(move |e| {
                    probe.touch();
                    e
                });
            Ok(SseConnection::new(url.as_str(), stream))
        }
    }

    fn config(timeout_ms: u64) -> ConnectionConfig {
        ConnectionConfig::resolve(RawConnectionConfig {
            sse_url: Some("http://localhost:3000/sse".into()),
            sse_timeout: Some(timeout_ms),
            message_endpoint: Some("http://localhost:3000/message".into()),
            headers: None,
        })
        .unwrap()
    }

    fn tools_event(data: &str) -> (Option<&'static str>, String) {
        (Some(TOOLS_EVENT), data.to_string())
    }

    #[tokio::test]
    async fn filtered_discovery_returns_matching_tool() {
        let connector = FakeConnector {
            events: vec![tools_event(SEARCH_CATALOG)],
            ..Default::default()
        };
        let discovery = ToolDiscovery::with_connector(connector);

        let catalog = discovery
            .discover(&config(0), &ToolFilter::from_value(Some("search_tool")))
            .await
            .unwrap();

        assert_eq!(catalog.names(), vec!["search_tool_A"]);
        assert_eq!(
            catalog.tools[0].parameters["q"].param_type.as_deref(),
            Some("string")
        );
    }

    #[tokio::test]
    async fn unfiltered_discovery_preserves_server_order() {
        let payload = r#"{"tools":[
            {"name":"z","description":"1"},
            {"name":"a","description":"2"},
            {"name":"z","description":"3"}
        ]}"#;
        let connector = FakeConnector {
            events: vec![tools_event(payload)],
            ..Default::default()
        };
        let catalog = ToolDiscovery::with_connector(connector)
            .discover(&config(0), &ToolFilter::All)
            .await
            .unwrap();

        let descriptions: Vec<&str> = catalog
            .tools
            .iter()
            .filter_map(|t| t.description.as_deref())
            .collect();
        assert_eq!(catalog.names(), vec!["z", "a", "z"]);
        assert_eq!(descriptions, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn other_events_are_ignored() {
        let connector = FakeConnector {
            events: vec![
                (Some("endpoint"), "/message?sessionId=abc".into()),
                (None, r#"{"jsonrpc":"2.0"}"#.into()),
                (Some("message"), "not json".into()),
                tools_event(SEARCH_CATALOG),
            ],
            ..Default::default()
        };
        let catalog = ToolDiscovery::with_connector(connector)
            .discover(&config(0), &ToolFilter::All)
            .await
            .unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test]
    async fn only_first_tools_event_is_consumed() {
        let opened = Arc::new(AtomicUsize::new(0));
        let connector = FakeConnector {
            events: vec![
                tools_event(r#"{"tools":[{"name":"first"}]}"#),
                tools_event(r#"{"tools":[{"name":"second"}]}"#),
            ],
            hold_open: true,
            opened: Arc::clone(&opened),
            ..Default::default()
        };
        let catalog = ToolDiscovery::with_connector(connector)
            .discover(&config(0), &ToolFilter::All)
            .await
            .unwrap();
        assert_eq!(catalog.names(), vec!["first"]);
        assert_eq!(opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_payload_fails_and_closes_once() {
        let streams_dropped = Arc::new(AtomicUsize::new(0));
        let connector = FakeConnector {
            events: vec![tools_event(r#"{"foo":1}"#)],
            hold_open: true,
            streams_dropped: Arc::clone(&streams_dropped),
            ..Default::default()
        };
        let discovery = ToolDiscovery::with_connector(connector);

        let err = discovery
            .discover(&config(0), &ToolFilter::All)
            .await
            .unwrap_err();

        assert!(matches!(err, McpError::MalformedPayload(_)), "got {err:?}");
        assert_eq!(streams_dropped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stream_end_before_tools_is_connection_error() {
        let streams_dropped = Arc::new(AtomicUsize::new(0));
        let connector = FakeConnector {
            events: vec![(Some("endpoint"), "/message".into())],
            streams_dropped: Arc::clone(&streams_dropped),
            ..Default::default()
        };
        let err = ToolDiscovery::with_connector(connector)
            .discover(&config(0), &ToolFilter::All)
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::Connection { .. }), "got {err:?}");
        assert_eq!(streams_dropped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refused_connection_is_connection_error() {
        let connector = FakeConnector {
            refuse: Some("connection refused"),
            ..Default::default()
        };
        let err = ToolDiscovery::with_connector(connector)
            .discover(&config(1000), &ToolFilter::All)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_open_times_out_and_aborts_attempt() {
        let opened = Arc::new(AtomicUsize::new(0));
        let attempts_dropped = Arc::new(AtomicUsize::new(0));
        let connector = FakeConnector {
            delay: Duration::from_secs(5),
            events: vec![tools_event(SEARCH_CATALOG)],
            opened: Arc::clone(&opened),
            attempts_dropped: Arc::clone(&attempts_dropped),
            ..Default::default()
        };
        let started = tokio::time::Instant::now();

        let err = ToolDiscovery::with_connector(connector)
            .discover(&config(1000), &ToolFilter::All)
            .await
            .unwrap_err();

        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert!(started.elapsed() < Duration::from_secs(5));
        match err {
            McpError::Timeout { url, timeout_ms } => {
                assert_eq!(url, "http://localhost:3000/sse");
                assert_eq!(timeout_ms, 1000);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(opened.load(Ordering::SeqCst), 0);
        assert_eq!(attempts_dropped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn open_before_deadline_disarms_timer() {
        let connector = FakeConnector {
            delay: Duration::from_millis(999),
            events: vec![tools_event(SEARCH_CATALOG)],
            // The event arrives long after the connection timeout would fire.
            event_delay: Duration::from_secs(30),
            ..Default::default()
        };
        let catalog = ToolDiscovery::with_connector(connector)
            .discover(&config(1000), &ToolFilter::All)
            .await
            .unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_waits_for_slow_open() {
        let connector = FakeConnector {
            delay: Duration::from_secs(120),
            events: vec![tools_event(SEARCH_CATALOG)],
            ..Default::default()
        };
        let catalog = ToolDiscovery::with_connector(connector)
            .discover(&config(0), &ToolFilter::All)
            .await
            .unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn parse_catalog_rejects_invalid_json() {
        let err = parse_catalog("{not json").unwrap_err();
        assert!(matches!(err, McpError::MalformedPayload(_)));
    }

    #[test]
    fn parse_catalog_rejects_non_array_tools() {
        let err = parse_catalog(r#"{"tools": {"name": "x"}}"#).unwrap_err();
        assert!(err.to_string().contains("not an array"));
    }

    #[test]
    fn parse_catalog_rejects_top_level_array() {
        assert!(parse_catalog(r#"[{"name": "x"}]"#).is_err());
    }

    #[test]
    fn parse_catalog_rejects_partially_valid_list() {
        let err = parse_catalog(r#"{"tools": [{"name": "ok"}, {"description": "no name"}]}"#)
            .unwrap_err();
        assert!(matches!(err, McpError::MalformedPayload(_)));
    }

    #[test]
    fn parse_catalog_accepts_empty_list() {
        assert!(parse_catalog(r#"{"tools": []}"#).unwrap().is_empty());
    }

    #[test]
    fn parse_catalog_keeps_unknown_parameter_fields() {
        let payload = r#"{"tools":[{"name":"search_tool_A","description":"d","inputSchema":{"type":"object"},"parameters":{"q":{"type":"string","description":"query","enum":["a","b"]}}}]}"#;
        let catalog = parse_catalog(payload).unwrap();

        let reserialized = serde_json::to_value(&catalog).unwrap();
        let original: Value = serde_json::from_str(payload).unwrap();
        assert_eq!(reserialized, original);
        assert_eq!(
            catalog.tools[0].parameters["q"].extra["enum"],
            serde_json::json!(["a", "b"])
        );
    }

    #[test]
    fn parse_catalog_accepts_parameter_without_type() {
        let catalog =
            parse_catalog(r#"{"tools":[{"name":"a","parameters":{"q":{"description":"query"}}}]}"#)
                .unwrap();
        let q = &catalog.tools[0].parameters["q"];
        assert_eq!(q.param_type, None);
        assert_eq!(q.description.as_deref(), Some("query"));
    }

    #[test]
    fn parse_catalog_accepts_null_description() {
        let catalog =
            parse_catalog(r#"{"tools":[{"name":"a","description":null},{"name":"b","description":"ok"}]}"#)
                .unwrap();
        assert_eq!(catalog.names(), vec!["a", "b"]);
        assert_eq!(catalog.tools[0].description, None);
        assert_eq!(catalog.tools[1].description.as_deref(), Some("ok"));
    }
}
