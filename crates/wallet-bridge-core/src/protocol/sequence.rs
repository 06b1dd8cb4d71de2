//! Thread-safe issuer of request identifiers.
//!
//! # Why ids must never repeat (for beginners)
//!
//! Responses from the backend can arrive in any order.  The only thing that
//! ties an answer back to the code waiting for it is the numeric id sent with
//! the request.  If two outstanding requests ever shared an id, one caller
//! would receive the other's answer.
//!
//! The counter uses an `AtomicU64`, so many tasks can call
//! [`RequestIdCounter::next`] at the same time without a lock and without ever
//! seeing the same value twice.  A `u64` incremented once per request does not
//! wrap in any realistic process lifetime.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::protocol::messages::RequestId;

/// A thread-safe, strictly increasing source of [`RequestId`]s.
///
/// Ids start at 1.  Zero is never issued, so it can safely be used as a
/// placeholder in logs.
///
/// # Examples
///
/// ```rust
/// use wallet_bridge_core::protocol::{RequestId, RequestIdCounter};
///
/// let counter = RequestIdCounter::new();
/// assert_eq!(counter.next(), RequestId(1));
/// assert_eq!(counter.next(), RequestId(2));
/// ```
#[derive(Debug)]
pub struct RequestIdCounter {
    inner: AtomicU64,
}

impl RequestIdCounter {
    /// Creates a new counter whose first id is 1.
    pub fn new() -> Self {
        Self {
            inner: AtomicU64::new(1),
        }
    }

    /// Returns the next id and atomically advances the counter.
    ///
    /// `Relaxed` is enough: the id is only a label, it does not publish any
    /// other memory.
    pub fn next(&self) -> RequestId {
        RequestId(self.inner.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the id the next call to [`next`](Self::next) would issue.
    ///
    /// For diagnostics only; another task may advance the counter before the
    /// caller uses the value.
    pub fn peek(&self) -> RequestId {
        RequestId(self.inner.load(Ordering::Relaxed))
    }
}

impl Default for RequestIdCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_request_id_counter_starts_at_one() {
        // Arrange
        let counter = RequestIdCounter::new();

        // Act
        let first = counter.next();

        // Assert
        assert_eq!(first, RequestId(1));
    }

    #[test]
    fn test_request_id_counter_strictly_increases() {
        let counter = RequestIdCounter::new();

        let a = counter.next();
        let b = counter.next();
        let c = counter.next();

        assert!(a < b && b < c);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let counter = RequestIdCounter::new();
        counter.next();

        assert_eq!(counter.peek(), RequestId(2));
        assert_eq!(counter.peek(), RequestId(2));
        assert_eq!(counter.next(), RequestId(2));
    }

    #[test]
    fn test_request_id_counter_is_unique_across_threads() {
        // Arrange
        let counter = Arc::new(RequestIdCounter::new());
        let threads = 8;
        let per_thread = 500;

        // Act
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let c = Arc::clone(&counter);
                thread::spawn(move || (0..per_thread).map(|_| c.next()).collect::<Vec<_>>())
            })
            .collect();
        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                seen.insert(id);
            }
        }

        // Assert
        assert_eq!(seen.len(), threads * per_thread);
        assert!(!seen.contains(&RequestId(0)));
    }
}
