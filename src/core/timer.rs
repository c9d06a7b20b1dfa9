//! # TimerEngine: one repeating countdown on its own thread.
//!
//! A timer owns a countdown of `total` split into `interval`-sized ticks and
//! reports progress to a recipient inbox (normally the worker's `counter`
//! sub-handler).
//!
//! ## State machine
//! ```text
//!   Idle ──start()──► Running ──(elapsed ≥ total)──► Done
//!    │                   │
//!    └──cancel()──┐      └──cancel()──► Cancelled
//!                 ▼
//!             Cancelled
//! ```
//! `Done` and `Cancelled` are terminal. `start()` from anything but `Idle` is
//! a programmer error (see [`TimerEngine::start`]).
//!
//! ## Emission schedule
//! Tick `k` (k = 0, 1, ...) is emitted at elapsed `k * interval` with
//! `remaining = total - k * interval`, for as long as `remaining > 0`. One
//! `Done` follows at elapsed `total`. For `total = 10s, interval = 1s` that is
//! ten ticks (10s, 9s, ..., 1s) and one done.
//!
//! ## Rules
//! - Emission and `cancel()` share one lock: once `cancel()` returns, the
//!   timer sends nothing more. Events already in the recipient's inbox stay there.
//! - A closed recipient stops the countdown (nothing left to report to).
//! - Dropping a `TimerEngine` cancels it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::core::runtime::spawn_context;
use crate::error::EngineError;

/// Lifecycle state of a [`TimerEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Created, not started.
    Idle,
    /// Counting down.
    Running,
    /// Emitted its `Done` event.
    Done,
    /// Stopped early; no `Done` was (or will be) emitted.
    Cancelled,
}

/// Event posted by a timer to its recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Interval boundary reached.
    Tick {
        /// Timer generation that produced the event.
        generation: u64,
        /// Time left until `Done`.
        remaining: Duration,
    },
    /// Countdown completed. Always the last event of a timer.
    Done {
        /// Timer generation that produced the event.
        generation: u64,
    },
}

impl TimerEvent {
    /// Generation of the timer that produced this event.
    pub fn generation(&self) -> u64 {
        match self {
            TimerEvent::Tick { generation, .. } | TimerEvent::Done { generation } => *generation,
        }
    }
}

/// State shared between the handle and the countdown thread.
pub(crate) struct Shared {
    state: Mutex<TimerState>,
    recipient: mpsc::UnboundedSender<TimerEvent>,
}

impl Shared {
    pub(crate) fn new(state: TimerState, recipient: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            state: Mutex::new(state),
            recipient,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sends `ev` if still running. Returns `false` once the countdown must stop.
    fn emit(&self, ev: TimerEvent) -> bool {
        let mut state = self.lock();
        if *state != TimerState::Running {
            return false;
        }
        if self.recipient.send(ev).is_err() {
            debug!("timer recipient closed; stopping countdown");
            *state = TimerState::Cancelled;
            return false;
        }
        true
    }

    /// Sends the single `Done` event and enters the terminal state.
    fn finish(&self, generation: u64) {
        let mut state = self.lock();
        if *state != TimerState::Running {
            return;
        }
        if self.recipient.send(TimerEvent::Done { generation }).is_err() {
            debug!(generation, "timer recipient closed; done not delivered");
        }
        *state = TimerState::Done;
    }
}

/// Handle to one countdown.
pub struct TimerEngine {
    total: Duration,
    interval: Duration,
    generation: u64,
    thread_name: String,
    shared: Arc<Shared>,
    token: CancellationToken,
}

impl TimerEngine {
    /// Creates an idle timer reporting to `recipient`.
    ///
    /// A zero `interval` is rejected with [`EngineError::InvalidTimer`].
    pub fn new(
        total: Duration,
        interval: Duration,
        recipient: mpsc::UnboundedSender<TimerEvent>,
        generation: u64,
    ) -> Result<Self, EngineError> {
        if interval.is_zero() {
            return Err(EngineError::InvalidTimer { total, interval });
        }
        Ok(Self {
            total,
            interval,
            generation,
            thread_name: "handoff-timer".to_string(),
            shared: Arc::new(Shared::new(TimerState::Idle, recipient)),
            token: CancellationToken::new(),
        })
    }

    /// Overrides the name of the countdown thread.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Starts the countdown on a new thread.
    ///
    /// Valid only from [`TimerState::Idle`]. Any other state is a programmer
    /// error: debug builds panic, release builds leave the timer untouched and
    /// return [`EngineError::InvalidTimerState`].
    pub fn start(&self) -> Result<(), EngineError> {
        {
            let mut state = self.shared.lock();
            if *state != TimerState::Idle {
                let state = *state;
                error!(generation = self.generation, ?state, "timer start from non-idle state");
                if cfg!(debug_assertions) {
                    panic!("timer cannot start from state {state:?}");
                }
                return Err(EngineError::InvalidTimerState { state });
            }
            *state = TimerState::Running;
        }

        let (total, interval, generation) = (self.total, self.interval, self.generation);
        let shared = Arc::clone(&self.shared);
        let token = self.token.clone();
        let spawned = spawn_context(&self.thread_name, move || {
            countdown(total, interval, generation, shared, token)
        });
        if let Err(e) = spawned {
            *self.shared.lock() = TimerState::Cancelled;
            return Err(e);
        }
        debug!(generation, ?total, ?interval, "timer started");
        Ok(())
    }

    /// Stops the countdown. No event is sent after this returns.
    ///
    /// Returns `true` if this call moved the timer out of `Idle`/`Running`.
    pub fn cancel(&self) -> bool {
        let mut state = self.shared.lock();
        let cancelled = matches!(*state, TimerState::Idle | TimerState::Running);
        if cancelled {
            *state = TimerState::Cancelled;
            debug!(generation = self.generation, "timer cancelled");
        }
        drop(state);
        self.token.cancel();
        cancelled
    }

    /// Current state.
    pub fn state(&self) -> TimerState {
        *self.shared.lock()
    }

    /// Generation number this timer reports in its events.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Total countdown duration.
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Countdown body. Runs on the timer's own context.
pub(crate) async fn countdown(
    total: Duration,
    interval: Duration,
    generation: u64,
    shared: Arc<Shared>,
    token: CancellationToken,
) {
    let started = Instant::now();
    let mut ticker = time::interval(interval);
    let mut k: u64 = 0;

    loop {
        let remaining = remaining_after(total, interval, k);
        if remaining.is_zero() {
            break;
        }
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }
        if !shared.emit(TimerEvent::Tick { generation, remaining }) {
            return;
        }
        k = k.saturating_add(1);
    }

    tokio::select! {
        _ = token.cancelled() => return,
        _ = time::sleep_until(started + total) => {}
    }
    shared.finish(generation);
}

/// Time left after `ticks` intervals. Zero once `ticks * interval` no longer fits.
fn remaining_after(total: Duration, interval: Duration, ticks: u64) -> Duration {
    u32::try_from(ticks)
        .ok()
        .and_then(|k| interval.checked_mul(k))
        .map_or(Duration::ZERO, |elapsed| total.saturating_sub(elapsed))
}
