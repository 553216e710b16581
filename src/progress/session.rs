//! Shared state of one in-flight download

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Byte counter for one download, shared between the reader and the reporter
///
/// Cloning is cheap and every clone observes the same counters.
#[derive(Clone, Debug)]
pub struct TransferSession {
    total: Option<u64>,
    observed: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
    started: Instant,
}

impl TransferSession {
    /// Start a session; `total` is the advertised body length, if any
    #[must_use]
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total,
            observed: Arc::new(AtomicU64::new(0)),
            finished: Arc::new(AtomicBool::new(false)),
            started: Instant::now(),
        }
    }

    /// Advertised total size in bytes
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Bytes delivered to the consumer so far
    pub fn observed(&self) -> u64 {
        self.observed.load(Ordering::Acquire)
    }

    /// Time since the session was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether the underlying stream has reached end-of-input
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub(crate) fn record(&self, n: u64) {
        if n > 0 {
            self.observed.fetch_add(n, Ordering::AcqRel);
        }
    }

    pub(crate) fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let session = TransferSession::new(Some(100));
        let observer = session.clone();

        session.record(40);
        session.record(0);
        session.record(2);

        assert_eq!(observer.observed(), 42);
        assert_eq!(observer.total(), Some(100));
        assert!(!observer.is_finished());

        session.mark_finished();
        assert!(observer.is_finished());
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let session = TransferSession::new(None);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = session.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        s.record(3);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(session.observed(), 8 * 1000 * 3);
    }
}
