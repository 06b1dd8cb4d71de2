//! In-memory transport for tests and demos.
//!
//! Every query is routed to a handler closure.  `Some(value)` answers at
//! once; `None` leaves the request unanswered until the test calls
//! [`MockTransport::respond`].  With [`hold_responses`](MockTransport::hold_responses)
//! enabled, handler answers are queued instead and released one by one, in
//! whatever order the test chooses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;
use wallet_bridge_core::{Query, RequestId};

use crate::application::transport::{InboundSink, Transport, TransportError};

type Handler = Arc<dyn Fn(&Query) -> Option<Value> + Send + Sync>;

#[derive(Default)]
struct Recorded {
    sink: Option<InboundSink>,
    calls: Vec<(RequestId, Query)>,
    held: HashMap<RequestId, Value>,
    hold: bool,
    opens: usize,
    closes: usize,
    fail_next_open: Option<TransportError>,
}

/// A scripted backend living in the same process.
pub struct MockTransport {
    handler: Handler,
    open_delay: Option<Duration>,
    state: Mutex<Recorded>,
    call_notify: Notify,
}

impl MockTransport {
    /// Creates a mock answering each query with `handler(query)`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Query) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            open_delay: None,
            state: Mutex::new(Recorded::default()),
            call_notify: Notify::new(),
        }
    }

    /// A mock answering POSTs with their body and GETs with `null`.
    pub fn echo() -> Self {
        Self::new(|query| Some(query.body.clone().unwrap_or(Value::Null)))
    }

    /// Makes every `open` take `delay` before succeeding.
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    fn state(&self) -> MutexGuard<'_, Recorded> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn sink(&self) -> Option<InboundSink> {
        self.state().sink.clone()
    }

    /// Makes the next `open` fail with `error`.
    pub fn fail_next_open(&self, error: TransportError) {
        self.state().fail_next_open = Some(error);
    }

    /// Queues handler answers instead of sending them.
    pub fn hold_responses(&self, hold: bool) {
        self.state().hold = hold;
    }

    /// Ids whose queued answers have not been released yet, ascending.
    pub fn held(&self) -> Vec<RequestId> {
        let mut ids: Vec<RequestId> = self.state().held.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Sends the queued answer for `id`.  Returns `false` if none is queued.
    pub fn release(&self, id: RequestId) -> bool {
        let (answer, sink) = {
            let mut state = self.state();
            (state.held.remove(&id), state.sink.clone())
        };
        match (answer, sink) {
            (Some(value), Some(sink)) => sink.response(id, value.to_string()),
            _ => false,
        }
    }

    /// Answers `id` with `value`.
    pub fn respond(&self, id: RequestId, value: Value) -> bool {
        self.respond_raw(id, &value.to_string())
    }

    /// Answers `id` with arbitrary text, valid JSON or not.
    pub fn respond_raw(&self, id: RequestId, body: &str) -> bool {
        self.sink().map_or(false, |sink| sink.response(id, body))
    }

    /// Fails `id` inside the transport.
    pub fn fail(&self, id: RequestId, reason: TransportError) -> bool {
        self.sink().map_or(false, |sink| sink.failed(id, reason))
    }

    /// Emits a push event.
    pub fn push(&self, event: Value) -> bool {
        self.push_raw(&event.to_string())
    }

    pub fn push_raw(&self, text: &str) -> bool {
        self.sink().map_or(false, |sink| sink.push(text))
    }

    /// Reports the channel as closed from the backend side.
    pub fn drop_connection(&self) -> bool {
        self.sink().map_or(false, |sink| sink.closed())
    }

    /// Ends the push stream only; requests keep working.
    pub fn drop_events(&self) -> bool {
        self.sink().map_or(false, |sink| sink.push_closed())
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<(RequestId, Query)> {
        self.state().calls.clone()
    }

    pub fn open_count(&self) -> usize {
        self.state().opens
    }

    pub fn close_count(&self) -> usize {
        self.state().closes
    }

    /// Waits until at least `count` calls have been received.
    pub async fn wait_for_calls(&self, count: usize) {
        loop {
            let notified = self.call_notify.notified();
            if self.state().calls.len() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn open(&self, sink: InboundSink) -> Result<(), TransportError> {
        let failure = {
            let mut state = self.state();
            state.opens += 1;
            state.fail_next_open.take()
        };
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = failure {
            return Err(error);
        }
        self.state().sink = Some(sink);
        Ok(())
    }

    async fn call(&self, id: RequestId, query: &Query) -> Result<(), TransportError> {
        let answer = (self.handler)(query);
        let sink = {
            let mut state = self.state();
            let Some(sink) = state.sink.clone() else {
                return Err(TransportError::Closed);
            };
            state.calls.push((id, query.clone()));
            match answer {
                Some(value) if state.hold => {
                    state.held.insert(id, value);
                    None
                }
                Some(value) => Some((sink, value)),
                None => None,
            }
        };
        self.call_notify.notify_waiters();
        if let Some((sink, value)) = sink {
            sink.response(id, value.to_string());
        }
        Ok(())
    }

    async fn close(&self) {
        let mut state = self.state();
        state.closes += 1;
        state.sink = None;
    }
}
