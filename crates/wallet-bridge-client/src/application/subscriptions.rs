//! Push-event subscribers.
//!
//! Listeners are kept in the order they subscribed and every push event is
//! offered to each of them, synchronously, in that order.  A listener that
//! panics is logged and skipped; the rest still receive the event.
//!
//! Subscribing returns a [`Subscription`].  Calling
//! [`unsubscribe`](Subscription::unsubscribe) (or dropping the handle) removes
//! exactly that listener.  Once it returns, the listener is never invoked
//! again, even by a dispatch that had already taken its snapshot.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{error, warn};
use wallet_bridge_core::PushEvent;

type Listener = Arc<dyn Fn(&PushEvent) + Send + Sync>;

struct Entry {
    key: u64,
    active: Arc<AtomicBool>,
    listener: Listener,
}

#[derive(Default)]
struct Listeners {
    next_key: u64,
    entries: Vec<Entry>,
}

impl Listeners {
    fn remove(&mut self, key: u64) -> bool {
        match self.entries.iter().position(|e| e.key == key) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }
}

fn lock(listeners: &Mutex<Listeners>) -> MutexGuard<'_, Listeners> {
    listeners
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The insertion-ordered set of push-event listeners.
///
/// Cloning yields another handle to the same set.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<Mutex<Listeners>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for every push event.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&PushEvent) + Send + Sync + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let key = {
            let mut listeners = lock(&self.inner);
            let key = listeners.next_key;
            listeners.next_key += 1;
            listeners.entries.push(Entry {
                key,
                active: Arc::clone(&active),
                listener: Arc::new(listener),
            });
            key
        };
        Subscription {
            key,
            active,
            registry: Arc::downgrade(&self.inner),
            removed: AtomicBool::new(false),
            detached: false,
        }
    }

    /// Registers `listener` for subject events about `subject` only.
    ///
    /// This is how a view keeps one endpoint's value fresh: it re-fetches
    /// `subject` on `reload`, or takes the new value from `replace`.
    pub fn subscribe_subject<F>(&self, subject: impl Into<String>, listener: F) -> Subscription
    where
        F: Fn(&PushEvent) + Send + Sync + 'static,
    {
        let subject = subject.into();
        self.subscribe(move |event| {
            if event.is_about(&subject) {
                listener(event);
            }
        })
    }

    /// Offers `event` to every listener in registration order.
    ///
    /// Returns how many listeners ran to completion.
    pub fn dispatch(&self, event: &PushEvent) -> usize {
        let snapshot: Vec<(Arc<AtomicBool>, Listener)> = lock(&self.inner)
            .entries
            .iter()
            .map(|e| (Arc::clone(&e.active), Arc::clone(&e.listener)))
            .collect();

        let mut delivered = 0;
        for (index, (active, listener)) in snapshot.into_iter().enumerate() {
            if !active.load(Ordering::Acquire) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(()) => delivered += 1,
                Err(_) => error!(listener = index, "push listener panicked; continuing with the rest"),
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to one registered listener.
///
/// Dropping the handle unsubscribes.  Use [`detach`](Self::detach) to keep the
/// listener for the lifetime of the registry.
#[must_use = "dropping a Subscription immediately unsubscribes its listener"]
pub struct Subscription {
    key: u64,
    active: Arc<AtomicBool>,
    registry: Weak<Mutex<Listeners>>,
    removed: AtomicBool,
    detached: bool,
}

impl Subscription {
    /// Removes the listener.
    ///
    /// Calling this a second time does nothing except log a warning.
    pub fn unsubscribe(&self) {
        if self.removed.swap(true, Ordering::AcqRel) {
            warn!(listener = self.key, "unsubscribe called on a listener that is already removed");
            return;
        }
        if !self.remove() {
            warn!(listener = self.key, "listener was missing from the registry at unsubscribe");
        }
    }

    /// Returns `true` while the listener is registered.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Gives up the handle without unsubscribing.
    pub fn detach(mut self) {
        self.detached = true;
    }

    fn remove(&self) -> bool {
        self.active.store(false, Ordering::Release);
        match self.registry.upgrade() {
            Some(inner) => lock(&inner).remove(self.key),
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.detached || self.removed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.remove();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("active", &self.is_active())
            .finish()
    }
}
