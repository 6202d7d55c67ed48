//! Cooperative cancellation for a running crawl

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable, write-once stop signal
///
/// The caller keeps one handle and calls [`cancel`](Self::cancel) from any thread; the
/// crawl engine only reads the flag. Once set the flag stays set, so every crawl needs a
/// fresh token.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the crawl to stop at its next cancellation point
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called on any clone
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
