// @zen-component: BRIDGE-SseTransport
//
//! SSE client transport used by tool discovery.
//!
//! 1. Client sends GET to the SSE endpoint with the configured headers
//! 2. A successful response means the connection is open
//! 3. The response body is decoded as an SSE event stream
//! 4. The caller reads events until it has what it needs, then closes

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use sse_stream::{Sse, SseStream};
use tracing::{debug, info};
use url::Url;

use super::McpError;

/// Boxed stream of decoded SSE events.
pub type SseEventStream = Pin<Box<dyn Stream<Item = Result<Sse, sse_stream::Error>> + Send>>;

/// Opens SSE connections.
///
/// Returning from [`SseConnector::connect`] is the "open" signal: the server
/// has accepted the subscription and events may follow.
#[async_trait]
pub trait SseConnector: Send + Sync {
    async fn connect(&self, url: &Url, headers: &HeaderMap) -> Result<SseConnection, McpError>;
}

/// An open SSE subscription.
///
/// Closing drops the underlying stream, which tears down the HTTP
/// connection. Closing twice is a no-op, and dropping an open connection
/// closes it.
pub struct SseConnection {
    url: String,
    events: Option<SseEventStream>,
}

impl SseConnection {
    pub fn new<S>(url: impl Into<String>, events: S) -> Self
    where
        S: Stream<Item = Result<Sse, sse_stream::Error>> + Send + 'static,
    {
        Self {
            url: url.into(),
            events: Some(Box::pin(events)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_closed(&self) -> bool {
        self.events.is_none()
    }

    /// Next event, or `None` once the stream has ended or been closed.
    pub async fn next_event(&mut self) -> Option<Result<Sse, sse_stream::Error>> {
        match self.events.as_mut() {
            Some(events) => events.next().await,
            None => None,
        }
    }

    pub fn close(&mut self) {
        if let Some(events) = self.events.take() {
            drop(events);
            debug!(url = %self.url, "SSE connection closed");
        }
    }
}

impl Drop for SseConnection {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseConnection")
            .field("url", &self.url)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// SSE connector backed by a reqwest client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestSseConnector {
    client: reqwest::Client,
}

impl ReqwestSseConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom reqwest client (proxies, TLS settings).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SseConnector for ReqwestSseConnector {
    async fn connect(&self, url: &Url, headers: &HeaderMap) -> Result<SseConnection, McpError> {
        let response = self
            .client
            .get(url.clone())
            .headers(headers.clone())
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .send()
            .await
            .map_err(|e| McpError::Connection {
                url: url.to_string(),
                reason: format!("SSE GET failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(McpError::Connection {
                url: url.to_string(),
                reason: format!("SSE GET returned status {}", response.status()),
            });
        }

        info!(url = %url, status = %response.status(), "SSE connection open");

        let events = SseStream::from_byte_stream(response.bytes_stream());
        Ok(SseConnection::new(url.as_str(), events))
    }
}
