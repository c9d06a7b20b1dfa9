//! # handoff
//!
//! **Handoff** is a long-lived background worker whose results go to a
//! consumer that may be destroyed and replaced at any time.
//!
//! The worker accepts immediate tasks, typed messages and countdown ticks,
//! runs them one at a time on its own thread, and delivers every result
//! through a swappable, nullable [`ResultSink`]. When no sink is attached
//! (consumer mid-recreation) deliveries are skipped and logged; queued work
//! keeps running.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   presentation thread                         ┌──────────────────────────┐
//!  ┌────────────────────┐  attach / detach      │       WorkerEngine       │
//!  │ Supervisor         │──────────────────────►│  SinkSlot (arc-swap)     │
//!  │  on_create/on_stop │  post_task            │  inboxes:                │
//!  │  on_destroy        │  post_message ───────►│   tasks | image_download │
//!  └───────┬────────────┘  start_timer          │   counter | delayed_…    │
//!          │                    │               │   scheduled              │
//!          ▼                    ▼               └────────────┬─────────────┘
//!   RetentionStore        ┌────────────┐                     │ one consumer thread
//!   (engine + UiState)    │TimerEngine │── Tick/Done ──► [counter]
//!                         │(own thread)│                     ▼
//!                         └────────────┘          Consumer ─► Courier ─► ResultSink?
//!                                                    │                     │
//!                                                    ▼                     ▼
//!                                                   Bus            UiEvent ─► UiState
//! ```
//!
//! ### Lifecycle
//! ```text
//! WorkerEngine::new ──► start() ──► post … / attach / detach … ──► shutdown() ──► join()
//!
//! consumer loop {
//!   ├─ token cancelled                 ─► stop
//!   ├─ delayed notice / task due       ─► deliver notice | run task
//!   ├─ counter event                   ─► "Time remaining: n" + busy | "Timer is done!" + idle
//!   ├─ image request                   ─► busy → fetch → image/error → idle → "Message handled"
//!   └─ task                            ─► run (panics caught, TaskPanicked published)
//! }
//! on stop: queued items abandoned, counted, WorkerStopped{count}, ShutdownReport
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Worker**        | Serial execution of tasks and sub-handler messages.      | [`WorkerEngine`], [`WorkerMessage`]         |
//! | **Timer**         | Countdown on its own thread feeding the worker.          | [`TimerEngine`], [`TimerEvent`]             |
//! | **Sinks**         | Capability trait and delivery slot.                      | [`ResultSink`], [`SinkSlot`], [`Courier`]   |
//! | **Presentation**  | Queue-backed sink and folded UI state.                   | [`ChannelSink`], [`UiEvent`], [`UiState`]   |
//! | **Retention**     | Keep the engine alive across consumer recreation.        | [`Supervisor`], [`RetentionStore`]          |
//! | **Fetch**         | Single-attempt image retrieval.                          | [`Fetch`], [`FetchFn`], [`HttpFetcher`]     |
//! | **Events**        | Broadcast of lifecycle events.                           | [`Event`], [`EventKind`], [`Bus`]           |
//! | **Errors**        | Typed engine and fetch errors.                           | [`EngineError`], [`FetchError`]             |
//!
//! ## Optional features
//! - `http` (default): exports [`HttpFetcher`] backed by `reqwest`.
//! - `logging`: exports a [`LogSink`] that only logs deliveries _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use bytes::Bytes;
//! use handoff::{ChannelSink, FetchError, FetchFn, FetchRef, UiEvent, WorkerConfig, WorkerEngine};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher: FetchRef = FetchFn::arc("fixture", |_url: String| async {
//!         Ok::<_, FetchError>(Bytes::from_static(b"\x89PNG\r\n\x1a\n"))
//!     });
//!
//!     let mut config = WorkerConfig::default();
//!     config.pacing_delay = Duration::ZERO;
//!
//!     let engine = Arc::new(WorkerEngine::new(config, fetcher));
//!     let (sink, mut ui) = ChannelSink::new();
//!     engine.attach(Arc::new(sink));
//!     engine.start()?;
//!
//!     engine.download_with_task()?;
//!     assert_eq!(ui.recv().await, Some(UiEvent::Busy(true)));
//!
//!     engine.shutdown();
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod fetch;
pub mod labels;
mod retention;
mod sink;

// ---- Public re-exports ----

pub use config::WorkerConfig;
pub use core::{
    ENGINE_KEY, ImageRequest, ShutdownReport, SubHandler, Supervisor, TimerEngine, TimerEvent,
    TimerState, UI_STATE_KEY, WorkContext, WorkerEngine, WorkerMessage,
};
pub use error::{EngineError, FetchError};
pub use events::{Bus, Event, EventKind, recv_kind};
pub use fetch::{Fetch, FetchFn, FetchRef};
pub use retention::{MemoryStore, RetainedValue, RetentionStore};
pub use sink::{ChannelSink, Courier, ResultSink, SinkSlot, UiEvent, UiState};

// Optional: `reqwest`-backed fetcher.
// Enable with: `--features http` (on by default)
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;

// Optional: expose a sink that only logs deliveries (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use sink::LogSink;
