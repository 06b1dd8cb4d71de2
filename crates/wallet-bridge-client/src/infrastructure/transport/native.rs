//! Transport over a host-provided native object channel.
//!
//! A desktop host exposes one object with a method and two signals:
//!
//! - `call(queryID, query)`: `query` is the JSON string map produced by
//!   [`encode_native_query`].
//! - `gotResponse(queryID, response)`: the JSON answer to `queryID`.
//! - `pushNotify(notification)`: an unsolicited JSON event.
//!
//! The method side is the [`NativeChannel`] trait.  The signal side is a
//! [`NativeSignals`] handle the host keeps and calls from whatever thread its
//! signals fire on.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, warn};
use wallet_bridge_core::protocol::encode_native_query;
use wallet_bridge_core::{Query, RequestId};

#[cfg(test)]
use mockall::automock;

use crate::application::transport::{InboundSink, Transport, TransportError};

/// The host's `call` method.
#[cfg_attr(test, automock)]
pub trait NativeChannel: Send + Sync {
    /// Hands request `query_id` to the host.  Must not block.
    fn call(&self, query_id: u64, query: String) -> Result<(), String>;
}

type SinkSlot = Arc<Mutex<Option<InboundSink>>>;

fn lock(slot: &Mutex<Option<InboundSink>>) -> MutexGuard<'_, Option<InboundSink>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The host's `gotResponse` / `pushNotify` signals.
///
/// Signals that fire before the transport is opened, or after it is closed,
/// are logged and dropped.
#[derive(Clone)]
pub struct NativeSignals {
    slot: SinkSlot,
}

impl NativeSignals {
    pub fn got_response(&self, query_id: u64, response: String) {
        match lock(&self.slot).as_ref() {
            Some(sink) => {
                sink.response(RequestId(query_id), response);
            }
            None => warn!(request_id = query_id, "gotResponse before the channel was opened; dropped"),
        }
    }

    pub fn push_notify(&self, notification: String) {
        match lock(&self.slot).as_ref() {
            Some(sink) => {
                sink.push(notification);
            }
            None => warn!("pushNotify before the channel was opened; dropped"),
        }
    }
}

/// [`Transport`] over a [`NativeChannel`].
pub struct NativeChannelTransport {
    channel: Option<Arc<dyn NativeChannel>>,
    slot: SinkSlot,
}

impl NativeChannelTransport {
    /// Wraps `channel` and returns the signal handle to give to the host.
    pub fn new(channel: Arc<dyn NativeChannel>) -> (Self, NativeSignals) {
        let slot: SinkSlot = Arc::new(Mutex::new(None));
        let signals = NativeSignals {
            slot: Arc::clone(&slot),
        };
        (
            Self {
                channel: Some(channel),
                slot,
            },
            signals,
        )
    }

    /// A transport for an environment without a native host.  Opening it
    /// fails with [`TransportError::Unavailable`].
    pub fn unavailable() -> Self {
        Self {
            channel: None,
            slot: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl Transport for NativeChannelTransport {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn open(&self, sink: InboundSink) -> Result<(), TransportError> {
        if self.channel.is_none() {
            return Err(TransportError::Unavailable(
                "no native channel object in this environment".to_string(),
            ));
        }
        *lock(&self.slot) = Some(sink);
        debug!("native channel attached");
        Ok(())
    }

    async fn call(&self, id: RequestId, query: &Query) -> Result<(), TransportError> {
        let channel = self
            .channel
            .as_ref()
            .ok_or_else(|| TransportError::Unavailable("no native channel".to_string()))?;
        if lock(&self.slot).is_none() {
            return Err(TransportError::Closed);
        }
        let encoded = encode_native_query(query).map_err(|e| TransportError::Send(e.to_string()))?;
        channel.call(id.get(), encoded).map_err(TransportError::Send)
    }

    async fn close(&self) {
        lock(&self.slot).take();
    }
}
