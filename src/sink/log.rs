//! # LogSink — deliveries written to the log
//!
//! A minimal sink that records every delivery through `tracing`.
//! Use it for demos or as a stand-in while no presentation layer exists.
//!
//! ## Example output
//! ```text
//! INFO handoff::sink::log: busy=true
//! INFO handoff::sink::log: operation="Downloading image with Runnable"
//! INFO handoff::sink::log: feedback="Executing operation..."
//! INFO handoff::sink::log: image bytes=48213
//! INFO handoff::sink::log: notice="Hello from WorkerThread!"
//! ```

use bytes::Bytes;
use tracing::info;

use super::ResultSink;

/// Log-only sink.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    /// Construct a new [`LogSink`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ResultSink for LogSink {
    fn deliver_text(&self, text: &str) {
        info!(feedback = text);
    }

    fn deliver_operation_label(&self, label: &str) {
        info!(operation = label);
    }

    fn deliver_image(&self, image: Bytes) {
        info!(bytes = image.len(), "image");
    }

    fn set_busy(&self, busy: bool) {
        info!(busy);
    }

    fn deliver_transient_notice(&self, text: &str) {
        info!(notice = text);
    }

    fn name(&self) -> &'static str {
        "LogSink"
    }
}
