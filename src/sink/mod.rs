//! # Result sinks: the consumer side of every delivery.
//!
//! This module provides the [`ResultSink`] capability trait, the replaceable
//! [`SinkSlot`] the engine reads on every delivery, the [`Courier`] that
//! performs one delivery (or skips it), and a presentation adapter
//! ([`ChannelSink`] + [`UiEvent`] + [`UiState`]).
//!
//! ## Architecture
//! ```text
//! consumer thread                         presentation thread
//!   handler ──► Courier ──► SinkSlot.load() ──► ResultSink (e.g. ChannelSink)
//!                  │             │                       │ send(UiEvent)
//!                  │          (empty)                    ▼
//!                  │             └──► warn + DeliverySkipped   [UI queue] ──► UiState::apply
//!                  ▼
//!                 Bus
//! ```
//!
//! ## Implementing a custom sink
//! ```no_run
//! use bytes::Bytes;
//! use handoff::ResultSink;
//!
//! struct Console;
//!
//! impl ResultSink for Console {
//!     fn deliver_text(&self, text: &str) { println!("feedback: {text}"); }
//!     fn deliver_operation_label(&self, label: &str) { println!("operation: {label}"); }
//!     fn deliver_image(&self, image: Bytes) { println!("image: {} bytes", image.len()); }
//!     fn set_busy(&self, busy: bool) { println!("busy: {busy}"); }
//!     fn deliver_transient_notice(&self, text: &str) { println!("notice: {text}"); }
//! }
//! ```

mod channel;
mod courier;
#[cfg(feature = "logging")]
mod log;
mod result_sink;
mod slot;
mod ui_state;

pub use channel::{ChannelSink, UiEvent};
pub use courier::Courier;
#[cfg(feature = "logging")]
pub use log::LogSink;
pub use result_sink::ResultSink;
pub use slot::SinkSlot;
pub use ui_state::UiState;
