//! Progress and completion callbacks
//!
//! Observers are invoked on the crawl task. Callers living on another task should use
//! [`ChannelObserver`] and receive the events from its channel.

use crate::crawler::CrawlStatus;
use crate::state::ProgressSample;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Receives progress samples and the final completion signal of a crawl
pub trait CrawlObserver: Send {
    /// Called after every state-changing event, in order
    fn on_progress(&mut self, sample: ProgressSample);

    /// Called exactly once when the crawl ends
    fn on_complete(&mut self, _status: CrawlStatus) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CrawlObserver for NoopObserver {
    fn on_progress(&mut self, _sample: ProgressSample) {}
}

/// An event forwarded by [`ChannelObserver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlEvent {
    Progress(ProgressSample),
    Complete(CrawlStatus),
}

/// Observer that forwards events over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<CrawlEvent>,
}

impl ChannelObserver {
    /// Creates an observer and the receiving end of its channel
    pub fn channel() -> (Self, UnboundedReceiver<CrawlEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CrawlObserver for ChannelObserver {
    fn on_progress(&mut self, sample: ProgressSample) {
        // A dropped receiver only means nobody is listening anymore
        let _ = self.tx.send(CrawlEvent::Progress(sample));
    }

    fn on_complete(&mut self, status: CrawlStatus) {
        let _ = self.tx.send(CrawlEvent::Complete(status));
    }
}

/// Delivers a progress sample, discarding any panic raised by the observer
pub(crate) fn notify_progress(observer: &mut dyn CrawlObserver, sample: ProgressSample) {
    if catch_unwind(AssertUnwindSafe(|| observer.on_progress(sample))).is_err() {
        tracing::error!("Progress observer panicked at {}; ignoring", sample);
    }
}

/// Delivers the completion signal, discarding any panic raised by the observer
pub(crate) fn notify_complete(observer: &mut dyn CrawlObserver, status: CrawlStatus) {
    if catch_unwind(AssertUnwindSafe(|| observer.on_complete(status))).is_err() {
        tracing::error!("Completion observer panicked ({}); ignoring", status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PanickingObserver;

    impl CrawlObserver for PanickingObserver {
        fn on_progress(&mut self, _sample: ProgressSample) {
            panic!("progress");
        }

        fn on_complete(&mut self, _status: CrawlStatus) {
            panic!("complete");
        }
    }

    #[test]
    fn test_panics_are_contained() {
        let mut observer = PanickingObserver;
        notify_progress(&mut observer, ProgressSample::default());
        notify_complete(&mut observer, CrawlStatus::Completed);
    }

    #[test]
    fn test_channel_observer_forwards_in_order() {
        let (mut observer, mut rx) = ChannelObserver::channel();
        let first = ProgressSample {
            visited: 0,
            discovered: 1,
        };
        let second = ProgressSample {
            visited: 1,
            discovered: 1,
        };
        notify_progress(&mut observer, first);
        notify_progress(&mut observer, second);
        notify_complete(&mut observer, CrawlStatus::Cancelled);

        assert_eq!(rx.try_recv().unwrap(), CrawlEvent::Progress(first));
        assert_eq!(rx.try_recv().unwrap(), CrawlEvent::Progress(second));
        assert_eq!(
            rx.try_recv().unwrap(),
            CrawlEvent::Complete(CrawlStatus::Cancelled)
        );
    }

    #[test]
    fn test_channel_observer_survives_dropped_receiver() {
        let (mut observer, rx) = ChannelObserver::channel();
        drop(rx);
        observer.on_progress(ProgressSample::default());
        observer.on_complete(CrawlStatus::Completed);
    }
}
