//! # Core sink trait
//!
//! `ResultSink` is the capability set a presentation owner implements to
//! receive results from the worker. The engine depends only on this trait,
//! never on a concrete presentation type.
//!
//! ## Contract
//! - Methods are invoked **from the consumer thread**. An implementation that
//!   owns single-threaded presentation state must not touch it directly; it
//!   should hand the value to its own thread's queue (see
//!   [`ChannelSink`](crate::ChannelSink)).
//! - Methods must return promptly: a slow sink delays the worker's queue.
//! - The engine never owns a sink's lifecycle; it holds it only while attached.

use bytes::Bytes;

/// Capability set receiving worker results.
pub trait ResultSink: Send + Sync + 'static {
    /// Main feedback text ("Executing operation...", "Image downloaded", ...).
    fn deliver_text(&self, text: &str);

    /// Label describing the current/last operation.
    fn deliver_operation_label(&self, label: &str);

    /// Raw bytes of a fetched image.
    fn deliver_image(&self, image: Bytes);

    /// Busy indicator on/off.
    fn set_busy(&self, busy: bool);

    /// Short-lived notice (toast-like).
    fn deliver_transient_notice(&self, text: &str);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
