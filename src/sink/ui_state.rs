//! # UiState — what the presentation layer shows, folded from [`UiEvent`]s.
//!
//! The presentation thread applies each drained event to its `UiState`. On a
//! recreation cycle the [`Supervisor`](crate::Supervisor) puts the
//! [`retained`](UiState::retained) part into the retention store and hands it
//! back to the next consumer.

use bytes::Bytes;
use tokio::sync::mpsc;

use super::UiEvent;

/// Presentation state driven by worker deliveries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    /// Last feedback text.
    pub feedback: Option<String>,
    /// Last operation label.
    pub operation: Option<String>,
    /// Last delivered image.
    pub image: Option<Bytes>,
    /// Busy indicator.
    pub busy: bool,
    /// Notices shown since the last reset. Not retained across recreation.
    pub notices: Vec<String>,
}

impl UiState {
    /// Applies one delivery.
    pub fn apply(&mut self, ev: UiEvent) {
        match ev {
            UiEvent::Text(text) => self.feedback = Some(text),
            UiEvent::Operation(label) => self.operation = Some(label),
            UiEvent::Image(image) => self.image = Some(image),
            UiEvent::Busy(busy) => self.busy = busy,
            UiEvent::Notice(text) => self.notices.push(text),
        }
    }

    /// Applies every event currently queued on `rx` without waiting.
    ///
    /// Returns the number of events applied.
    pub fn drain(&mut self, rx: &mut mpsc::UnboundedReceiver<UiEvent>) -> usize {
        let mut applied = 0;
        while let Ok(ev) = rx.try_recv() {
            self.apply(ev);
            applied += 1;
        }
        applied
    }

    /// The part of the state that survives a recreation cycle.
    #[must_use]
    pub fn retained(&self) -> UiState {
        UiState {
            notices: Vec::new(),
            ..self.clone()
        }
    }
}
