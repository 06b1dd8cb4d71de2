//! `BridgeClient`: an explicitly owned handle to one backend channel.
//!
//! # Lifecycle
//!
//! ```text
//!   Idle ──connect()──▶ Connecting ──open ok──▶ Connected ──close()──▶ Closed
//!    ▲                      │
//!    └────── open failed ───┘
//! ```
//!
//! - [`BridgeClient::connect`] runs [`Transport::open`] at most once at a
//!   time.  Callers arriving while an open is in flight await that same open
//!   and receive its outcome.  A failed open returns the client to `Idle`, so
//!   a later `connect()` tries again.
//! - [`BridgeClient::close`] is terminal.  Every pending request fails with
//!   [`TransportError::Closed`] and later calls fail with
//!   [`ClientError::Closed`].
//!
//! # Inbound pump
//!
//! A successful open spawns one task that drains the transport's
//! [`InboundSink`]: answers go to the [`Correlator`], push events are parsed
//! and handed to the [`ListenerRegistry`].

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use wallet_bridge_core::{BackendError, PushEvent, Query, RequestId};

use crate::application::correlator::Correlator;
use crate::application::subscriptions::{ListenerRegistry, Subscription};
use crate::application::transport::{Inbound, InboundSink, Transport, TransportError};
use crate::domain::ClientConfig;

/// Errors returned by [`BridgeClient`] and the layers built on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// `call` before a successful `connect`.
    #[error("client is not connected")]
    NotConnected,

    /// The client has been closed.
    #[error("client is closed")]
    Closed,

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No answer for request `id` within `after`.  The pending entry is gone.
    #[error("request {id} timed out after {after:?}")]
    Timeout { id: RequestId, after: Duration },

    /// The pending entry was removed without an answer.
    #[error("request cancelled")]
    Cancelled,

    /// The answer to request `id` was not valid JSON.
    #[error("malformed response to request {id}: {reason}")]
    MalformedResponse { id: RequestId, reason: String },

    /// The backend reported an error.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The answer was valid JSON but not the expected shape (or a request
    /// body could not be encoded).
    #[error("unexpected payload for {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

type OpenFuture = Shared<BoxFuture<'static, Result<(), TransportError>>>;

enum State {
    Idle,
    Connecting { attempt: u64, open: OpenFuture },
    Connected,
    Closed,
}

struct Inner {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    correlator: Arc<Correlator>,
    listeners: ListenerRegistry,
    state: Mutex<State>,
    attempts: Mutex<u64>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A clonable handle to one backend channel.
///
/// All clones share the same transport, pending-request table and
/// subscribers.
///
/// ```no_run
/// use std::sync::Arc;
/// use wallet_bridge_client::{BridgeClient, ClientConfig};
/// use wallet_bridge_client::infrastructure::transport::HttpTransport;
/// use wallet_bridge_core::Query;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::default();
/// let transport = Arc::new(HttpTransport::new(config.clone())?);
/// let client = BridgeClient::new(transport, config);
/// client.connect().await?;
/// let version = client.call(Query::get("version")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BridgeClient {
    inner: Arc<Inner>,
}

impl BridgeClient {
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                config,
                correlator: Arc::new(Correlator::new()),
                listeners: ListenerRegistry::new(),
                state: Mutex::new(State::Idle),
                attempts: Mutex::new(0),
                pump: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn transport_name(&self) -> &'static str {
        self.inner.transport.name()
    }

    pub fn is_connected(&self) -> bool {
        matches!(*lock(&self.inner.state), State::Connected)
    }

    /// Number of requests still awaiting an answer.
    pub fn pending_requests(&self) -> usize {
        self.inner.correlator.pending_count()
    }

    /// Establishes the channel.
    ///
    /// Returns immediately when already connected.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Closed`] after [`close`](Self::close).
    /// - [`ClientError::Transport`] when the open failed; the client stays
    ///   usable and `connect()` may be retried.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let (attempt, open) = {
            let mut state = lock(&self.inner.state);
            let in_flight = match &*state {
                State::Connected => return Ok(()),
                State::Closed => return Err(ClientError::Closed),
                State::Connecting { attempt, open } => Some((*attempt, open.clone())),
                State::Idle => None,
            };
            match in_flight {
                Some(joined) => joined,
                None => {
                    let attempt = {
                        let mut attempts = lock(&self.inner.attempts);
                        *attempts += 1;
                        *attempts
                    };
                    let open = self.open_future();
                    *state = State::Connecting {
                        attempt,
                        open: open.clone(),
                    };
                    (attempt, open)
                }
            }
        };

        let outcome = open.await;
        self.finish_connect(attempt, outcome).await
    }

    fn open_future(&self) -> OpenFuture {
        let inner = Arc::clone(&self.inner);
        async move {
            let (sink, inbound) = InboundSink::channel();
            info!(transport = inner.transport.name(), "opening transport");
            inner.transport.open(sink).await?;
            let handle = tokio::spawn(pump(
                inbound,
                Arc::clone(&inner.correlator),
                inner.listeners.clone(),
                inner.transport.name(),
            ));
            *lock(&inner.pump) = Some(handle);
            Ok(())
        }
        .boxed()
        .shared()
    }

    // Every awaiter of the shared open runs this; only the first one for the
    // attempt changes the state.
    async fn finish_connect(
        &self,
        attempt: u64,
        outcome: Result<(), TransportError>,
    ) -> Result<(), ClientError> {
        let closed_meanwhile = {
            let mut state = lock(&self.inner.state);
            let current = match &*state {
                State::Connecting { attempt, .. } => Some(*attempt),
                _ => None,
            };
            match current {
                Some(current) if current == attempt => {
                    match &outcome {
                        Ok(()) => {
                            info!(transport = self.transport_name(), "transport connected");
                            *state = State::Connected;
                        }
                        Err(e) => {
                            warn!(transport = self.transport_name(), "transport open failed: {e}");
                            *state = State::Idle;
                        }
                    }
                    false
                }
                _ => matches!(*state, State::Closed),
            }
        };
        if closed_meanwhile {
            // close() ran while the open was in flight.
            if outcome.is_ok() {
                self.shutdown().await;
            }
            return Err(ClientError::Closed);
        }
        outcome.map_err(ClientError::from)
    }

    /// Closes the channel for good.
    ///
    /// Pending requests fail with [`TransportError::Closed`].  Idempotent.
    pub async fn close(&self) {
        let previous = std::mem::replace(&mut *lock(&self.inner.state), State::Closed);
        if matches!(previous, State::Closed) {
            return;
        }
        self.shutdown().await;
        info!(transport = self.transport_name(), "client closed");
    }

    async fn shutdown(&self) {
        self.inner.transport.close().await;
        if let Some(handle) = lock(&self.inner.pump).take() {
            handle.abort();
        }
        let failed = self.inner.correlator.fail_all(TransportError::Closed);
        if failed > 0 {
            debug!(failed, "failed pending requests on close");
        }
    }

    /// Sends `query` and waits for its answer under the configured timeout.
    pub async fn call(&self, query: Query) -> Result<Value, ClientError> {
        self.call_with_timeout(query, self.inner.config.request_timeout)
            .await
    }

    /// Sends `query` and waits at most `timeout` (`None`: forever).
    ///
    /// The timeout covers handing the request to the transport as well as
    /// waiting for the answer.  Dropping the returned future withdraws the pending entry, so a late
    /// answer is discarded.
    ///
    /// # Errors
    ///
    /// [`ClientError::Timeout`] when no answer arrived in time,
    /// [`ClientError::MalformedResponse`] when the answer is not JSON, and the
    /// connection and transport errors described on [`ClientError`].
    pub async fn call_with_timeout(
        &self,
        query: Query,
        timeout: Option<Duration>,
    ) -> Result<Value, ClientError> {
        self.ensure_connected()?;

        let correlator = &self.inner.correlator;
        let (id, answer) = correlator.register(&query);
        let _guard = PendingGuard { correlator, id };
        debug!(
            request_id = %id,
            endpoint = %query.endpoint,
            transport = self.transport_name(),
            "sending {} request",
            query.method
        );

        let deadline = timeout.map(|after| (Instant::now() + after, after));
        let timed_out = |after: Duration| {
            warn!(request_id = %id, endpoint = %query.endpoint, "request timed out after {after:?}");
            ClientError::Timeout { id, after }
        };

        // A transport stuck delivering (e.g. a pipe nobody reads) counts
        // against the same deadline as the answer.
        before(deadline, self.inner.transport.call(id, &query))
            .await
            .map_err(&timed_out)??;
        let completion = before(deadline, answer).await.map_err(&timed_out)?;

        let body = match completion {
            Ok(Ok(body)) => body,
            Ok(Err(reason)) => return Err(ClientError::Transport(reason)),
            Err(_) => return Err(ClientError::Cancelled),
        };
        serde_json::from_str(&body).map_err(|e| ClientError::MalformedResponse {
            id,
            reason: e.to_string(),
        })
    }

    fn ensure_connected(&self) -> Result<(), ClientError> {
        match &*lock(&self.inner.state) {
            State::Connected => Ok(()),
            State::Closed => Err(ClientError::Closed),
            State::Idle | State::Connecting { .. } => Err(ClientError::NotConnected),
        }
    }

    /// Registers `listener` for every push event.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&PushEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(listener)
    }

    /// Registers `listener` for subject events about `subject`.
    pub fn subscribe_subject<F>(&self, subject: impl Into<String>, listener: F) -> Subscription
    where
        F: Fn(&PushEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe_subject(subject, listener)
    }
}

/// Runs `future` until the deadline; on expiry returns the timeout it was
/// derived from.  `None` waits forever.
async fn before<F: Future>(
    deadline: Option<(Instant, Duration)>,
    future: F,
) -> Result<F::Output, Duration> {
    match deadline {
        Some((at, after)) => tokio::time::timeout_at(at, future).await.map_err(|_| after),
        None => Ok(future.await),
    }
}

/// Withdraws a pending entry when the waiting call ends for any reason.
/// After a normal answer the entry is already gone and this is a no-op.
struct PendingGuard<'a> {
    correlator: &'a Correlator,
    id: RequestId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.correlator.cancel(self.id) {
            debug!(request_id = %self.id, "pending request withdrawn");
        }
    }
}

async fn pump(
    mut inbound: mpsc::UnboundedReceiver<Inbound>,
    correlator: Arc<Correlator>,
    listeners: ListenerRegistry,
    transport: &'static str,
) {
    while let Some(message) = inbound.recv().await {
        match message {
            Inbound::Response { id, body } => {
                correlator.complete(id, body);
            }
            Inbound::Failed { id, reason } => {
                debug!(request_id = %id, transport, "request failed in transport: {reason}");
                correlator.fail(id, reason);
            }
            Inbound::Push(text) => match PushEvent::parse(&text) {
                Ok(event) => {
                    listeners.dispatch(&event);
                }
                Err(e) => warn!(transport, "dropping undecodable push event: {e}"),
            },
            Inbound::PushClosed => {
                warn!(transport, "push stream ended; requests are unaffected");
            }
            Inbound::Closed => {
                let failed = correlator.fail_all(TransportError::Closed);
                warn!(transport, failed, "transport reported the channel closed");
            }
        }
    }
    let failed = correlator.fail_all(TransportError::Closed);
    debug!(transport, failed, "inbound pump stopped");
}
