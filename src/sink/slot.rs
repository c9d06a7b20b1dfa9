//! # SinkSlot: the replaceable, nullable sink reference.
//!
//! Written from the supervisor thread (attach/detach), read from the consumer
//! thread on every delivery. Backed by [`ArcSwapOption`] so neither side ever
//! blocks the other.
//!
//! ## Rules
//! - Readers must call [`SinkSlot::current`] immediately before each delivery
//!   and never cache the result across deliveries.
//! - A sink loaded just before a concurrent `detach()` may still receive that
//!   one delivery; the next load observes the empty slot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;

use super::ResultSink;

/// Attached sink together with the attach generation it was installed under.
struct Attached {
    sink: Arc<dyn ResultSink>,
    generation: u64,
}

/// Atomic, nullable holder of the current [`ResultSink`].
pub struct SinkSlot {
    current: ArcSwapOption<Attached>,
    generations: AtomicU64,
}

impl SinkSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::new(None),
            generations: AtomicU64::new(0),
        }
    }

    /// Installs `sink`, replacing any previous one. Returns the new attach generation.
    pub fn attach(&self, sink: Arc<dyn ResultSink>) -> u64 {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        self.current
            .store(Some(Arc::new(Attached { sink, generation })));
        generation
    }

    /// Clears the slot. Returns `true` if a sink was attached.
    pub fn detach(&self) -> bool {
        self.current.swap(None).is_some()
    }

    /// Loads the sink attached right now, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<dyn ResultSink>> {
        self.current
            .load_full()
            .map(|attached| Arc::clone(&attached.sink))
    }

    /// Generation of the attached sink (`None` when empty).
    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        self.current.load().as_ref().map(|a| a.generation)
    }

    /// True if a sink is attached right now.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.current.load().is_some()
    }
}

impl Default for SinkSlot {
    fn default() -> Self {
        Self::new()
    }
}
