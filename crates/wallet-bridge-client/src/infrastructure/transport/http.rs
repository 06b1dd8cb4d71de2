//! Transport to a backend serving HTTP on a local port.
//!
//! Requests are plain HTTP calls to `/api/{endpoint}`; each one runs in its
//! own task and reports its answer through the sink, so answers complete in
//! whatever order the backend finishes them.  Push events arrive on the
//! `/api/events` WebSocket.  Losing that socket ends the push stream but
//! leaves requests working.
//!
//! Request tasks are owned by the transport: `close` aborts the ones still
//! running, and each request is bounded by the configured request timeout.
//!
//! # Authentication
//!
//! When a token is configured every HTTP request carries
//! `Authorization: Basic {token}`.  The WebSocket cannot carry custom headers
//! from every client, so the backend instead expects the first text frame to
//! be `Authorization: Basic {token}` and only then starts forwarding events.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::task::{JoinHandle, JoinSet};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use wallet_bridge_core::{Method, Query, RequestId};

use crate::application::transport::{InboundSink, Transport, TransportError};
use crate::domain::ClientConfig;

type EventSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Default)]
struct Channel {
    sink: Option<InboundSink>,
    events: Option<JoinHandle<()>>,
    requests: JoinSet<()>,
}

/// [`Transport`] over HTTP requests plus the events WebSocket.
pub struct HttpTransport {
    config: ClientConfig,
    http: reqwest::Client,
    channel: Mutex<Channel>,
}

impl HttpTransport {
    /// Builds the HTTP client.  No connection is made until `open`.
    ///
    /// # Errors
    ///
    /// [`TransportError::Unavailable`] if the TLS backend cannot be
    /// initialised.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        Ok(Self {
            config,
            http,
            channel: Mutex::new(Channel::default()),
        })
    }

    fn channel(&self) -> MutexGuard<'_, Channel> {
        self.channel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn build_request(&self, query: &Query) -> reqwest::RequestBuilder {
        let url = self.config.api_url(&query.endpoint);
        let request = match query.method {
            Method::Get => self.http.get(url),
            Method::Post => match &query.body {
                Some(body) => self.http.post(url).json(body),
                None => self.http.post(url),
            },
        };
        match self.config.authorization() {
            Some(value) => request.header(reqwest::header::AUTHORIZATION, value),
            None => request,
        }
    }

    #[cfg(test)]
    fn running_requests(&self) -> usize {
        self.channel().requests.len()
    }
}

async fn send_request(request: reqwest::RequestBuilder) -> Result<String, String> {
    let response = request.send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(format!("HTTP {status}: {}", text.trim()));
    }
    response.text().await.map_err(|e| e.to_string())
}

async fn forward_events(
    mut read: futures_util::stream::SplitStream<EventSocket>,
    // Held so the socket stays open for as long as events are read.
    _write: SplitSink<EventSocket, Message>,
    sink: InboundSink,
) {
    while let Some(message) = read.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    warn!(transport = "http", "dropping non-UTF-8 binary event frame");
                    continue;
                }
            },
            Ok(Message::Close(frame)) => {
                debug!(transport = "http", ?frame, "events socket closed by backend");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(transport = "http", "events socket failed: {e}");
                break;
            }
        };
        if !sink.push(text) {
            break;
        }
    }
    sink.push_closed();
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn open(&self, sink: InboundSink) -> Result<(), TransportError> {
        let url = self.config.events_url();
        let (socket, _) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect(format!("{url}: {e}")))?;
        let (mut write, read) = socket.split();
        if let Some(value) = self.config.authorization() {
            write
                .send(Message::Text(format!("Authorization: {value}")))
                .await
                .map_err(|e| TransportError::Connect(format!("events authorization: {e}")))?;
        }
        info!(transport = "http", %url, "events socket connected");

        let events = tokio::spawn(forward_events(read, write, sink.clone()));
        let mut channel = self.channel();
        if let Some(previous) = channel.events.replace(events) {
            previous.abort();
        }
        channel.sink = Some(sink);
        Ok(())
    }

    async fn call(&self, id: RequestId, query: &Query) -> Result<(), TransportError> {
        let request = self.build_request(query);
        let endpoint = query.endpoint.clone();
        let mut channel = self.channel();
        let sink = channel.sink.clone().ok_or(TransportError::Closed)?;
        while channel.requests.try_join_next().is_some() {}
        channel.requests.spawn(async move {
            match send_request(request).await {
                Ok(body) => {
                    sink.response(id, body);
                }
                Err(reason) => {
                    debug!(request_id = %id, %endpoint, "HTTP request failed: {reason}");
                    sink.failed(id, TransportError::Send(reason));
                }
            }
        });
        Ok(())
    }

    async fn close(&self) {
        let mut channel = self.channel();
        channel.sink = None;
        if let Some(events) = channel.events.take() {
            events.abort();
        }
        let running = std::mem::take(&mut channel.requests);
        if !running.is_empty() {
            debug!(transport = "http", running = running.len(), "aborting in-flight requests");
        }
        // Dropping a JoinSet aborts every task in it.
        drop(running);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transport_with_token(token: Option<&str>) -> HttpTransport {
        HttpTransport::new(ClientConfig {
            token: token.map(str::to_string),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_get_request_targets_api_url() {
        // Arrange
        let transport = transport_with_token(None);

        // Act
        let request = transport.build_request(&Query::get("account/btc-0/status")).build().unwrap();

        // Assert
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().as_str(), "http://127.0.0.1:8082/api/account/btc-0/status");
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_post_request_carries_json_body_and_token() {
        let transport = transport_with_token(Some("abc"));

        let request = transport
            .build_request(&Query::post("notify-user", Some(json!({"text": "hi"}))))
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
            "Basic abc"
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(serde_json::from_slice::<serde_json::Value>(body).unwrap(), json!({"text": "hi"}));
    }

    #[tokio::test]
    async fn test_call_before_open_is_closed() {
        let transport = transport_with_token(None);

        let result = transport.call(RequestId(1), &Query::get("version")).await;

        assert_eq!(result, Err(TransportError::Closed));
    }

    #[tokio::test]
    async fn test_close_aborts_requests_still_running() {
        // Arrange: a listener that accepts and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _accepting = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let transport = HttpTransport::new(ClientConfig {
            port,
            request_timeout: None,
            ..ClientConfig::default()
        })
        .unwrap();
        let (sink, mut rx) = InboundSink::channel();
        transport.channel().sink = Some(sink);
        transport.call(RequestId(1), &Query::get("version")).await.unwrap();
        assert_eq!(transport.running_requests(), 1);

        // Act
        transport.close().await;

        // Assert
        assert_eq!(transport.running_requests(), 0);
        let nothing = tokio::time::timeout(std::time::Duration::from_millis(100), rx.recv()).await;
        assert!(matches!(nothing, Err(_) | Ok(None)));
    }

    #[tokio::test]
    async fn test_request_timeout_bounds_the_http_call() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _accepting = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let transport = HttpTransport::new(ClientConfig {
            port,
            request_timeout: Some(std::time::Duration::from_millis(50)),
            ..ClientConfig::default()
        })
        .unwrap();
        let (sink, mut rx) = InboundSink::channel();
        transport.channel().sink = Some(sink);

        transport.call(RequestId(7), &Query::get("version")).await.unwrap();

        let inbound = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("request gave up within 5s");
        assert!(matches!(
            inbound,
            Some(crate::application::transport::Inbound::Failed { id, reason: TransportError::Send(_) })
                if id == RequestId(7)
        ));
    }

    #[tokio::test]
    async fn test_open_without_backend_fails_to_connect() {
        // Port 1 on loopback is never a wallet backend.
        let transport = HttpTransport::new(ClientConfig {
            port: 1,
            ..ClientConfig::default()
        })
        .unwrap();
        let (sink, _rx) = InboundSink::channel();

        let result = transport.open(sink).await;

        assert!(matches!(result, Err(TransportError::Connect(_))));
    }
}
