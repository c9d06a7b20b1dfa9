//! Error types used by the worker engine and its collaborators.
//!
//! This module defines two main error enums:
//!
//! - [`EngineError`] — errors raised by the engine itself (lifecycle misuse,
//!   invalid messages, thread spawn failures).
//! - [`FetchError`] — errors raised by a [`Fetch`](crate::Fetch) collaborator.
//!
//! A [`FetchError`] never leaves the consumer thread: it is converted into a
//! delivered error text. An [`EngineError`] is returned to the caller of a
//! post/start/timer operation.
//!
//! Both types provide `as_label` for logs.

use std::time::Duration;
use thiserror::Error;

use crate::core::TimerState;

/// # Errors produced by the worker engine.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EngineError {
    /// Work was posted before [`WorkerEngine::start`](crate::WorkerEngine::start).
    #[error("engine not started")]
    NotStarted,

    /// Work was posted (or start was requested) after shutdown.
    #[error("engine closed")]
    Closed,

    /// The message payload can never be handled (e.g. an empty url set).
    #[error("invalid message: {reason}")]
    InvalidMessage {
        /// Why the message was rejected.
        reason: String,
    },

    /// Timer parameters are unusable.
    #[error("invalid timer: total={total:?} interval={interval:?}")]
    InvalidTimer {
        /// Requested total duration.
        total: Duration,
        /// Requested tick interval.
        interval: Duration,
    },

    /// `start()` was called on a timer that is not idle.
    #[error("timer cannot start from state {state:?}")]
    InvalidTimerState {
        /// State observed when start was attempted.
        state: TimerState,
    },

    /// The OS refused to spawn an execution context (thread or runtime).
    #[error("failed to spawn execution context: {0}")]
    Spawn(#[from] std::io::Error),
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use handoff::EngineError;
    ///
    /// assert_eq!(EngineError::Closed.as_label(), "engine_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::NotStarted => "engine_not_started",
            EngineError::Closed => "engine_closed",
            EngineError::InvalidMessage { .. } => "engine_invalid_message",
            EngineError::InvalidTimer { .. } => "engine_invalid_timer",
            EngineError::InvalidTimerState { .. } => "engine_invalid_timer_state",
            EngineError::Spawn(_) => "engine_spawn_failed",
        }
    }
}

/// # Errors produced by a fetch attempt.
///
/// Every variant is terminal for the attempt: fetches are single-shot and
/// never retried.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("unexpected status {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested url.
        url: String,
    },

    /// Connection, TLS, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response carried no bytes.
    #[error("empty body for {url}")]
    Empty {
        /// Requested url.
        url: String,
    },

    /// The payload could not be recognized as an image.
    #[error("payload from {url} is not a recognizable image")]
    NotAnImage {
        /// Requested url.
        url: String,
    },

    /// Any other failure reported by a custom fetcher.
    #[error("fetch failed: {0}")]
    Other(String),
}

impl FetchError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use handoff::FetchError;
    ///
    /// let err = FetchError::Other("boom".into());
    /// assert_eq!(err.as_label(), "fetch_other");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchError::Status { .. } => "fetch_status",
            FetchError::Transport(_) => "fetch_transport",
            FetchError::Empty { .. } => "fetch_empty",
            FetchError::NotAnImage { .. } => "fetch_not_an_image",
            FetchError::Other(_) => "fetch_other",
        }
    }
}
