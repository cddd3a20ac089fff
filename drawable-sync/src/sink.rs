//! Outbound "set value" capability.
//!
//! The debouncer hands every settled payload to a [`HostSink`]. Three sinks
//! ship with the crate: JSON lines on stdout, an HTTP endpoint, and an
//! in-process channel.

use async_trait::async_trait;
use drawable_core::DrawingSnapshot;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};
use url::Url;

use crate::error::{SyncError, SyncResult};

/// Value delivered to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    /// Rendered canvas as a PNG data URL.
    pub data: String,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Structured scene description.
    pub raw: DrawingSnapshot,
}

/// Receives payloads from the debouncer.
#[async_trait]
pub trait HostSink: Send + Sync {
    /// Deliver one payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be reached. The debouncer logs it
    /// and does not retry.
    async fn set_value(&self, payload: SyncPayload) -> SyncResult<()>;
}

/// Writes each payload as one JSON line to stdout.
#[derive(Debug, Default)]
pub struct StdoutSink {
    // Held for the duration of one line.
    lock: Mutex<()>,
}

impl StdoutSink {
    /// Create a stdout sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HostSink for StdoutSink {
    async fn set_value(&self, payload: SyncPayload) -> SyncResult<()> {
        let mut line = serde_json::to_vec(&payload)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&line).await?;
        stdout.flush().await?;
        Ok(())
    }
}

/// POSTs each payload as JSON to a host endpoint.
#[derive(Debug, Clone)]
pub struct HttpHostSink {
    client: Client,
    endpoint: Url,
}

impl HttpHostSink {
    /// Create a sink for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if the endpoint is not an http(s) URL.
    pub fn new(endpoint: &str) -> SyncResult<Self> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| SyncError::Config(format!("sink URL: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(SyncError::Config(format!(
                "sink URL must be http(s), got {}",
                endpoint.scheme()
            )));
        }
        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }

    /// Target endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl HostSink for HttpHostSink {
    async fn set_value(&self, payload: SyncPayload) -> SyncResult<()> {
        self.client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Forwards payloads into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SyncPayload>,
}

impl ChannelSink {
    /// Create a sink and the receiver its payloads arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SyncPayload>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl HostSink for ChannelSink {
    async fn set_value(&self, payload: SyncPayload) -> SyncResult<()> {
        self.tx.send(payload).map_err(|_| SyncError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> SyncPayload {
        SyncPayload {
            data: "data:image/png;base64,AAAA".to_string(),
            width: 600,
            height: 400,
            raw: DrawingSnapshot::empty(Some("#fff".to_string())),
        }
    }

    #[test]
    fn test_payload_wire_shape() {
        let value = serde_json::to_value(payload()).expect("serialize");
        assert_eq!(value["width"], 600);
        assert_eq!(value["height"], 400);
        assert_eq!(value["raw"]["background"], "#fff");
        assert!(value["raw"]["objects"].as_array().is_some_and(Vec::is_empty));
    }

    #[test]
    fn test_http_sink_rejects_bad_urls() {
        assert!(matches!(
            HttpHostSink::new("not a url"),
            Err(SyncError::Config(_))
        ));
        assert!(matches!(
            HttpHostSink::new("ftp://host/value"),
            Err(SyncError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_http_sink_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/component/value"))
            .and(body_partial_json(serde_json::json!({"width": 600, "height": 400})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let sink = HttpHostSink::new(&format!("{}/component/value", server.uri())).expect("url");
        sink.set_value(payload()).await.expect("delivered");
    }

    #[tokio::test]
    async fn test_http_sink_reports_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let sink = HttpHostSink::new(&server.uri()).expect("url");
        let err = sink.set_value(payload()).await.expect_err("500");
        assert!(matches!(err, SyncError::Http(_)));
    }

    #[tokio::test]
    async fn test_channel_sink() {
        let (sink, mut rx) = ChannelSink::new();
        sink.set_value(payload()).await.expect("send");
        assert_eq!(rx.recv().await, Some(payload()));

        drop(rx);
        assert!(matches!(
            sink.set_value(payload()).await,
            Err(SyncError::Closed)
        ));
    }
}
