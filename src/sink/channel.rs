//! # ChannelSink — hand every delivery to the presentation thread's queue.
//!
//! The consumer thread must never touch presentation-owned state. A
//! [`ChannelSink`] converts each capability call into a [`UiEvent`] and posts
//! it onto an unbounded queue that the presentation thread drains on its own
//! schedule (e.g. `UiState::drain`, or `recv().await` in its event loop).
//!
//! When the presentation side drops its receiver, sends fail silently: that
//! consumer is gone and the supervisor is expected to detach it.

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

use super::ResultSink;

/// One delivery, as seen by the presentation thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Main feedback text.
    Text(String),
    /// Operation label.
    Operation(String),
    /// Image bytes.
    Image(Bytes),
    /// Busy indicator.
    Busy(bool),
    /// Transient notice.
    Notice(String),
}

/// [`ResultSink`] that forwards deliveries onto a presentation queue.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiving end the presentation thread drains.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn post(&self, ev: UiEvent) {
        if self.tx.send(ev).is_err() {
            debug!("presentation queue closed; dropping ui event");
        }
    }
}

impl ResultSink for ChannelSink {
    fn deliver_text(&self, text: &str) {
        self.post(UiEvent::Text(text.to_owned()));
    }

    fn deliver_operation_label(&self, label: &str) {
        self.post(UiEvent::Operation(label.to_owned()));
    }

    fn deliver_image(&self, image: Bytes) {
        self.post(UiEvent::Image(image));
    }

    fn set_busy(&self, busy: bool) {
        self.post(UiEvent::Busy(busy));
    }

    fn deliver_transient_notice(&self, text: &str) {
        self.post(UiEvent::Notice(text.to_owned()));
    }

    fn name(&self) -> &'static str {
        "ChannelSink"
    }
}
