//! Runtime core: the worker, its timer and their lifecycle owner.
//!
//! Public API from this module: [`WorkerEngine`], [`TimerEngine`] and
//! [`Supervisor`], plus the message and context types they exchange.
//!
//! Internal modules:
//! - [`runtime`]: dedicated thread + current-thread runtime per context;
//! - [`message`]: typed messages and the per-sub-handler inboxes;
//! - [`consumer`]: the loop draining the inboxes one item at a time;
//! - [`handlers`]: bodies of the canonical download and each sub-handler;
//! - [`engine`]: the public worker handle;
//! - [`timer`]: the countdown engine;
//! - [`supervisor`]: attach/detach/retain across consumer recreation.

mod consumer;
mod context;
mod engine;
mod handlers;
mod message;
mod runtime;
mod supervisor;
mod timer;

pub use consumer::ShutdownReport;
pub use context::WorkContext;
pub use engine::WorkerEngine;
pub use message::{ImageRequest, SubHandler, WorkerMessage};
pub use supervisor::{ENGINE_KEY, Supervisor, UI_STATE_KEY};
pub use timer::{TimerEngine, TimerEvent, TimerState};
