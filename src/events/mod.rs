//! Engine events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the worker engine, its
//! consumer thread, the sink courier and the timer.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//! - [`recv_kind`] lag-tolerant wait for one kind of event
//!
//! ## Quick reference
//! - **Publishers**: `WorkerEngine` (start/attach/detach/timer/shutdown),
//!   the consumer loop (task and message handling, abandonment), `Courier`
//!   (skipped deliveries).
//! - **Consumers**: anything holding a receiver from
//!   [`WorkerEngine::subscribe`](crate::WorkerEngine::subscribe): tests,
//!   diagnostics, a presentation layer that wants progress hints.

mod bus;
mod event;

pub use bus::{Bus, recv_kind};
pub use event::{Event, EventKind};
