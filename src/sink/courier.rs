//! # Courier: one delivery, or one logged skip.
//!
//! Every result the consumer thread produces goes through a [`Courier`]. For
//! each call it loads the [`SinkSlot`] afresh and either invokes the sink or,
//! when nothing is attached (consumer mid-recreation), skips the delivery.
//!
//! ## Rules
//! - A missing sink is an expected transient state, not an error: the call
//!   logs a warning, publishes [`EventKind::DeliverySkipped`] and returns.
//! - Never retries, never blocks, never panics on an empty slot.
//! - Skipped deliveries are not replayed when a new sink attaches.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use super::{ResultSink, SinkSlot};
use crate::events::{Bus, Event, EventKind};

/// Delivers results through whatever sink is attached at call time.
#[derive(Clone)]
pub struct Courier {
    slot: Arc<SinkSlot>,
    bus: Bus,
}

impl Courier {
    /// Creates a courier reading `slot` and reporting skips on `bus`.
    pub fn new(slot: Arc<SinkSlot>, bus: Bus) -> Self {
        Self { slot, bus }
    }

    /// Delivers the main feedback text.
    pub fn text(&self, text: &str) -> bool {
        self.with_sink("deliver_text", |sink| sink.deliver_text(text))
    }

    /// Delivers the operation label.
    pub fn operation(&self, label: &str) -> bool {
        self.with_sink("deliver_operation_label", |sink| {
            sink.deliver_operation_label(label)
        })
    }

    /// Delivers image bytes.
    pub fn image(&self, image: Bytes) -> bool {
        self.with_sink("deliver_image", |sink| sink.deliver_image(image))
    }

    /// Toggles the busy indicator.
    pub fn busy(&self, busy: bool) -> bool {
        self.with_sink("set_busy", |sink| sink.set_busy(busy))
    }

    /// Delivers a transient notice.
    pub fn notice(&self, text: &str) -> bool {
        self.with_sink("deliver_transient_notice", |sink| {
            sink.deliver_transient_notice(text)
        })
    }

    /// Loads the slot and runs `deliver` against the sink found there.
    ///
    /// Returns `true` if the sink was invoked.
    fn with_sink(&self, capability: &'static str, deliver: impl FnOnce(&dyn ResultSink)) -> bool {
        match self.slot.current() {
            Some(sink) => {
                debug!(capability, sink = sink.name(), "delivering");
                deliver(sink.as_ref());
                true
            }
            None => {
                warn!(capability, "no sink attached; delivery skipped");
                self.bus
                    .publish(Event::new(EventKind::DeliverySkipped).with_reason(capability));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{ChannelSink, UiEvent};

    #[test]
    fn delivers_to_attached_sink() {
        let slot = Arc::new(SinkSlot::new());
        let (sink, mut rx) = ChannelSink::new();
        slot.attach(Arc::new(sink));
        let courier = Courier::new(slot, Bus::new(8));

        assert!(courier.busy(true));
        assert!(courier.text("hello"));
        assert!(courier.image(Bytes::from_static(b"png")));

        assert_eq!(rx.try_recv().ok(), Some(UiEvent::Busy(true)));
        assert_eq!(rx.try_recv().ok(), Some(UiEvent::Text("hello".into())));
        assert_eq!(
            rx.try_recv().ok(),
            Some(UiEvent::Image(Bytes::from_static(b"png")))
        );
    }

    #[test]
    fn empty_slot_skips_and_publishes() {
        let bus = Bus::new(8);
        let mut events = bus.subscribe();
        let courier = Courier::new(Arc::new(SinkSlot::new()), bus);

        assert!(!courier.notice("nobody home"));

        let ev = events.try_recv().expect("skip event");
        assert_eq!(ev.kind, EventKind::DeliverySkipped);
        assert_eq!(ev.reason.as_deref(), Some("deliver_transient_notice"));
    }
}
