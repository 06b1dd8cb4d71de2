//! The seam between the client and a concrete channel to the backend.
//!
//! A transport only moves messages.  Outbound, it delivers one
//! `(RequestId, Query)` per [`Transport::call`] and returns as soon as the
//! message is on its way.  Inbound, everything the backend sends (answers,
//! push events, the channel closing) is handed to the [`InboundSink`] given to
//! [`Transport::open`].  Matching answers to callers is not the transport's
//! business.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use wallet_bridge_core::{Query, RequestId};

/// Errors a transport can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The channel does not exist in this environment (e.g. no native host).
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    /// The channel exists but could not be established.
    #[error("failed to connect: {0}")]
    Connect(String),

    /// A request could not be delivered, or its delivery failed.
    #[error("failed to send request: {0}")]
    Send(String),

    /// The channel has been closed.
    #[error("transport closed")]
    Closed,
}

/// Something the backend sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// The raw JSON answer to request `id`.
    Response { id: RequestId, body: String },
    /// Request `id` failed inside the transport (e.g. an HTTP error).
    Failed { id: RequestId, reason: TransportError },
    /// The raw JSON text of an unsolicited push event.
    Push(String),
    /// No more push events will arrive, but answers still can.  Sent by
    /// transports whose events travel apart from their requests.
    PushClosed,
    /// The channel is gone; nothing more will arrive.
    Closed,
}

/// Where a transport delivers [`Inbound`] messages.
///
/// Cheap to clone and never blocks, so host callbacks running on foreign
/// threads can call it directly.
#[derive(Debug, Clone)]
pub struct InboundSink {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl InboundSink {
    /// Creates a sink and the receiver the client pumps.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Inbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Delivers `message`.  Returns `false` if the client stopped listening.
    pub fn send(&self, message: Inbound) -> bool {
        self.tx.send(message).is_ok()
    }

    pub fn response(&self, id: RequestId, body: impl Into<String>) -> bool {
        self.send(Inbound::Response {
            id,
            body: body.into(),
        })
    }

    pub fn failed(&self, id: RequestId, reason: TransportError) -> bool {
        self.send(Inbound::Failed { id, reason })
    }

    pub fn push(&self, text: impl Into<String>) -> bool {
        self.send(Inbound::Push(text.into()))
    }

    pub fn push_closed(&self) -> bool {
        self.send(Inbound::PushClosed)
    }

    pub fn closed(&self) -> bool {
        self.send(Inbound::Closed)
    }

    /// Returns `true` once the receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A channel to the backend.
///
/// Implementations must be safe to share between tasks; the client holds one
/// behind an `Arc` and may call [`call`](Transport::call) concurrently.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name used in log fields (`"http"`, `"native"`, ...).
    fn name(&self) -> &'static str;

    /// Establishes the channel and starts forwarding inbound messages to
    /// `sink`.  The client calls this at most once per successful connection.
    async fn open(&self, sink: InboundSink) -> Result<(), TransportError>;

    /// Sends request `id`.  Returns once the request has been handed off; the
    /// answer arrives later through the sink.
    async fn call(&self, id: RequestId, query: &Query) -> Result<(), TransportError>;

    /// Tears the channel down.  Must be idempotent.
    async fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sink_delivers_in_order() {
        // Arrange
        let (sink, mut rx) = InboundSink::channel();

        // Act
        sink.response(RequestId(2), "true");
        sink.push("{}");
        sink.closed();

        // Assert
        assert_eq!(
            rx.recv().await,
            Some(Inbound::Response {
                id: RequestId(2),
                body: "true".to_string()
            })
        );
        assert_eq!(rx.recv().await, Some(Inbound::Push("{}".to_string())));
        assert_eq!(rx.recv().await, Some(Inbound::Closed));
    }

    #[test]
    fn test_sink_reports_dropped_receiver() {
        let (sink, rx) = InboundSink::channel();
        drop(rx);

        assert!(sink.is_closed());
        assert!(!sink.push("{}"));
    }
}
