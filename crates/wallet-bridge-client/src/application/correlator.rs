//! Matches answers to the requests that caused them.
//!
//! # How correlation works (for beginners)
//!
//! Many requests can be in flight on one channel at once, and the backend
//! answers them in whatever order it finishes.  Each request is therefore
//! tagged with a fresh [`RequestId`] and a *pending entry* is stored under
//! that id.  The entry holds the sending half of a tokio `oneshot` channel;
//! the caller awaits the receiving half.  When an answer tagged with the id
//! arrives, the entry is removed and the answer is sent through it.
//!
//! Removing the entry is what makes delivery exactly-once: a second answer
//! with the same id finds nothing and is logged and dropped.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::{debug, warn};
use wallet_bridge_core::{Query, RequestId, RequestIdCounter};

use crate::application::transport::TransportError;

/// What a waiting caller receives: the raw JSON body, or why there is none.
pub type Completion = Result<String, TransportError>;

struct PendingEntry {
    endpoint: String,
    sender: oneshot::Sender<Completion>,
}

/// The table of requests awaiting an answer.
#[derive(Default)]
pub struct Correlator {
    ids: RequestIdCounter,
    pending: Mutex<HashMap<RequestId, PendingEntry>>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the map half-updated: every
    // critical section is a single insert or remove.
    fn pending(&self) -> MutexGuard<'_, HashMap<RequestId, PendingEntry>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Issues the next id for `query` and stores its pending entry.
    pub fn register(&self, query: &Query) -> (RequestId, oneshot::Receiver<Completion>) {
        let (sender, receiver) = oneshot::channel();
        let id = self.ids.next();
        self.pending().insert(
            id,
            PendingEntry {
                endpoint: query.endpoint.clone(),
                sender,
            },
        );
        (id, receiver)
    }

    /// Delivers `body` to the caller waiting on `id`.
    ///
    /// Returns `false` (and logs) when no such request is pending: it was
    /// already answered, timed out, or never issued.
    pub fn complete(&self, id: RequestId, body: String) -> bool {
        self.resolve(id, Ok(body))
    }

    /// Fails the request `id` with `reason`.
    pub fn fail(&self, id: RequestId, reason: TransportError) -> bool {
        self.resolve(id, Err(reason))
    }

    fn resolve(&self, id: RequestId, completion: Completion) -> bool {
        let Some(entry) = self.pending().remove(&id) else {
            warn!(request_id = %id, "answer for unknown or already settled request; dropped");
            return false;
        };
        if entry.sender.send(completion).is_err() {
            debug!(request_id = %id, endpoint = %entry.endpoint, "caller gave up before the answer arrived");
        }
        true
    }

    /// Removes `id` without answering it.  Used on timeout and when the caller
    /// stops waiting.
    pub fn cancel(&self, id: RequestId) -> bool {
        self.pending().remove(&id).is_some()
    }

    /// Fails every pending request with `reason` and returns how many there
    /// were.
    pub fn fail_all(&self, reason: TransportError) -> usize {
        let drained: Vec<(RequestId, PendingEntry)> = self.pending().drain().collect();
        let count = drained.len();
        for (id, entry) in drained {
            debug!(request_id = %id, endpoint = %entry.endpoint, "failing pending request: {reason}");
            let _ = entry.sender.send(Err(reason.clone()));
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    pub fn is_pending(&self, id: RequestId) -> bool {
        self.pending().contains_key(&id)
    }
}
