//! # Events emitted by the worker engine, its consumer thread and timer.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Lifecycle events**: engine start, shutdown request, consumer exit
//! - **Work events**: task and sub-handler message execution
//! - **Sink events**: attach/detach and skipped deliveries
//! - **Timer events**: timer start/cancel, scheduled notices
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! sub-handler name, reasons, delays and counters.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Events published from the consumer thread are observed in
//! the order they were produced.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use handoff::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::NoticeScheduled)
//!     .with_handler("delayed_notice")
//!     .with_delay(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::NoticeScheduled);
//! assert_eq!(ev.handler.as_deref(), Some("delayed_notice"));
//! assert_eq!(ev.delay_ms, Some(5000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of engine events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Lifecycle ===
    /// Consumer thread is up and draining its inboxes.
    WorkerStarted,

    /// `shutdown()` was called; no further posts are accepted.
    ShutdownRequested,

    /// Consumer thread exited.
    ///
    /// Sets:
    /// - `count`: number of queued items abandoned without running
    WorkerStopped,

    // === Work ===
    /// A posted or scheduled task is about to run.
    TaskStarting,

    /// A task returned.
    TaskFinished,

    /// A task panicked; the consumer keeps running.
    ///
    /// Sets:
    /// - `reason`: panic payload (best effort)
    TaskPanicked,

    /// A task was queued to run after a delay.
    ///
    /// Sets:
    /// - `delay_ms`: delay before the task becomes runnable
    TaskScheduled,

    /// A sub-handler finished processing one message.
    ///
    /// Sets:
    /// - `handler`: sub-handler name
    MessageHandled,

    // === Sink ===
    /// A sink was attached (replacing any previous one).
    SinkAttached,

    /// The sink was cleared.
    SinkDetached,

    /// A delivery found no sink attached and was skipped.
    ///
    /// Sets:
    /// - `reason`: capability that was skipped (e.g. `"deliver_text"`)
    DeliverySkipped,

    // === Timer / notices ===
    /// A countdown was started.
    ///
    /// Sets:
    /// - `generation`: timer generation
    TimerStarted,

    /// A countdown was cancelled (replaced or shut down).
    ///
    /// Sets:
    /// - `generation`: timer generation
    TimerCancelled,

    /// A transient notice was scheduled.
    ///
    /// Sets:
    /// - `delay_ms`: delay before delivery
    NoticeScheduled,

    /// A scheduled transient notice was handed to the courier.
    NoticeDelivered,
}

/// Engine event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Sub-handler name, if applicable.
    pub handler: Option<Arc<str>>,
    /// Human-readable reason (panics, skipped capability, etc.).
    pub reason: Option<Arc<str>>,
    /// Delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Timer generation.
    pub generation: Option<u64>,
    /// Generic counter (e.g. abandoned items).
    pub count: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            handler: None,
            reason: None,
            delay_ms: None,
            generation: None,
            count: None,
        }
    }

    /// Attaches a sub-handler name.
    #[inline]
    pub fn with_handler(mut self, handler: impl Into<Arc<str>>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a timer generation.
    #[inline]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Attaches a counter.
    #[inline]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::TaskStarting);
        let b = Event::new(EventKind::TaskFinished);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn delay_is_saturated_to_u32() {
        let ev = Event::new(EventKind::TaskScheduled).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }
}
