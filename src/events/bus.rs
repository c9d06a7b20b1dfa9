//! # Event bus for broadcasting engine events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from every thread involved (the supervisor
//! thread posting work, the consumer thread executing it, the timer thread).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                     Receivers (any number):
//!   WorkerEngine (caller thread) ──┐
//!   consumer loop                ──┼──────► Bus ───────► engine.subscribe()
//!   Courier (skipped deliveries) ──┘  (broadcast chan)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time.
//! - **Waiting on a kind**: [`recv_kind`] rides over lag gaps, so a watcher that
//!   fell behind still sees later events of the kind it waits for.

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use super::event::{Event, EventKind};

/// Broadcast channel for engine events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    ///
    /// A receiver only gets events **sent after** it subscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

/// Waits for the next event of `kind`, skipping every other kind.
///
/// A lagged receiver resumes at the oldest event still buffered instead of
/// failing. Returns `None` once the bus is gone and the buffer is drained.
pub async fn recv_kind(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Option<Event> {
    loop {
        match rx.recv().await {
            Ok(ev) if ev.kind == kind => return Some(ev),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => debug!(skipped, ?kind, "event receiver lagged"),
            Err(RecvError::Closed) => return None,
        }
    }
}
