//! # Work bodies run by the consumer thread.
//!
//! One function per kind of work. Each re-reads the sink on every delivery
//! (through the [`Courier`](crate::Courier)), so a detach in the middle of a
//! body only drops the deliveries that happen while nothing is attached.
//!
//! ```text
//! canonical_download: busy(true) → op(TASK_STARTED) → text(EXECUTING) → pacing
//!                     → fetch → image + IMAGE_DOWNLOADED | DOWNLOAD_ERROR
//!                     → busy(false) → op(TASK_ENDED)
//! image_download:     busy(true) → text(EXECUTING | EXECUTING_RANDOM) → fetch
//!                     → image + IMAGE_DOWNLOADED | DOWNLOAD_ERROR
//!                     → busy(false) → op(MESSAGE_HANDLED)
//! counter:            Tick → text(TIME_REMAINING n) → busy(true)
//!                     Done → text(TIMER_DONE) → busy(false)
//! ```

use rand::seq::IndexedRandom;
use tokio::time;
use tracing::{debug, warn};

use crate::core::context::WorkContext;
use crate::core::message::ImageRequest;
use crate::core::timer::TimerEvent;
use crate::labels;

/// Immediate-task download lifecycle for `url`.
pub(crate) async fn canonical_download(ctx: WorkContext, url: String) {
    let courier = ctx.courier();
    courier.busy(true);
    courier.operation(labels::TASK_STARTED);
    courier.text(labels::EXECUTING);

    if let Some(pacing) = ctx.config().pacing() {
        time::sleep(pacing).await;
    }
    ctx.download_image(&url).await;

    courier.busy(false);
    courier.operation(labels::TASK_ENDED);
}

/// `image_download` sub-handler.
pub(crate) async fn image_download(ctx: &WorkContext, req: ImageRequest) {
    let (url, feedback) = match req {
        ImageRequest::Single(url) => (url, labels::EXECUTING),
        ImageRequest::Random(urls) => {
            let Some(url) = urls.choose(&mut rand::rng()).cloned() else {
                warn!("random image request without urls; ignored");
                return;
            };
            debug!(%url, of = urls.len(), "random url picked");
            (url, labels::EXECUTING_RANDOM)
        }
    };

    let courier = ctx.courier();
    courier.busy(true);
    courier.text(feedback);
    ctx.download_image(&url).await;
    courier.busy(false);
    courier.operation(labels::MESSAGE_HANDLED);
}

/// `counter` sub-handler.
pub(crate) fn counter(ctx: &WorkContext, ev: TimerEvent) {
    let courier = ctx.courier();
    match ev {
        TimerEvent::Tick { remaining, .. } => {
            courier.text(&labels::time_remaining(remaining.as_secs()));
            courier.busy(true);
        }
        TimerEvent::Done { .. } => {
            courier.text(labels::TIMER_DONE);
            courier.busy(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use bytes::Bytes;
    use tokio::sync::mpsc;

    use super::*;
    use crate::config::WorkerConfig;
    use crate::error::FetchError;
    use crate::events::Bus;
    use crate::fetch::{FetchFn, FetchRef};
    use crate::sink::{ChannelSink, Courier, SinkSlot, UiEvent};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn ctx_with(fetcher: FetchRef) -> (WorkContext, mpsc::UnboundedReceiver<UiEvent>) {
        let bus = Bus::new(16);
        let slot = Arc::new(SinkSlot::new());
        let (sink, rx) = ChannelSink::new();
        slot.attach(Arc::new(sink));
        let config = WorkerConfig {
            pacing_delay: Duration::ZERO,
            ..WorkerConfig::default()
        };
        let ctx = WorkContext::new(Courier::new(slot, bus.clone()), fetcher, Arc::new(config), bus);
        (ctx, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<UiEvent>) -> Vec<UiEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    fn ok_fetcher() -> FetchRef {
        FetchFn::arc("ok", |_url: String| async { Ok::<_, FetchError>(Bytes::from_static(PNG)) })
    }

    fn down_fetcher() -> FetchRef {
        FetchFn::arc("down", |url: String| async move {
            Err::<Bytes, _>(FetchError::Status { status: 404, url })
        })
    }

    #[tokio::test]
    async fn canonical_download_success_order() {
        let (ctx, mut rx) = ctx_with(ok_fetcher());
        canonical_download(ctx, "u".into()).await;

        assert_eq!(
            drain(&mut rx),
            vec![
                UiEvent::Busy(true),
                UiEvent::Operation(labels::TASK_STARTED.into()),
                UiEvent::Text(labels::EXECUTING.into()),
                UiEvent::Image(Bytes::from_static(PNG)),
                UiEvent::Text(labels::IMAGE_DOWNLOADED.into()),
                UiEvent::Busy(false),
                UiEvent::Operation(labels::TASK_ENDED.into()),
            ]
        );
    }

    #[tokio::test]
    async fn canonical_download_failure_keeps_busy_paired() {
        let (ctx, mut rx) = ctx_with(down_fetcher());
        canonical_download(ctx, "u".into()).await;

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                UiEvent::Busy(true),
                UiEvent::Operation(labels::TASK_STARTED.into()),
                UiEvent::Text(labels::EXECUTING.into()),
                UiEvent::Text(labels::DOWNLOAD_ERROR.into()),
                UiEvent::Busy(false),
                UiEvent::Operation(labels::TASK_ENDED.into()),
            ]
        );
        assert!(!events.iter().any(|ev| matches!(ev, UiEvent::Image(_))));
    }

    #[tokio::test]
    async fn failed_fetch_delivers_one_error_and_no_image() {
        let (ctx, mut rx) = ctx_with(down_fetcher());
        image_download(&ctx, ImageRequest::Single("u".into())).await;

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                UiEvent::Busy(true),
                UiEvent::Text(labels::EXECUTING.into()),
                UiEvent::Text(labels::DOWNLOAD_ERROR.into()),
                UiEvent::Busy(false),
                UiEvent::Operation(labels::MESSAGE_HANDLED.into()),
            ]
        );
        assert!(!events.iter().any(|ev| matches!(ev, UiEvent::Image(_))));
    }

    #[tokio::test]
    async fn random_request_fetches_exactly_one_of_the_set() {
        let urls: Vec<String> = (0..5).map(|i| format!("https://img.test/{i}.png")).collect();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let fetcher: FetchRef = {
            let calls = Arc::clone(&calls);
            let seen = Arc::clone(&seen);
            FetchFn::arc("record", move |url: String| {
                calls.fetch_add(1, Ordering::SeqCst);
                seen.lock().unwrap().push(url);
                async { Ok::<_, FetchError>(Bytes::from_static(PNG)) }
            })
        };
        let (ctx, mut rx) = ctx_with(fetcher);

        for _ in 0..20 {
            calls.store(0, Ordering::SeqCst);
            image_download(&ctx, ImageRequest::Random(urls.clone())).await;
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
        assert!(seen.lock().unwrap().iter().all(|u| urls.contains(u)));
        assert!(drain(&mut rx).contains(&UiEvent::Text(labels::EXECUTING_RANDOM.into())));
    }

    #[tokio::test]
    async fn counter_maps_ticks_and_done() {
        let (ctx, mut rx) = ctx_with(ok_fetcher());
        counter(
            &ctx,
            TimerEvent::Tick {
                generation: 1,
                remaining: Duration::from_millis(3000),
            },
        );
        counter(&ctx, TimerEvent::Done { generation: 1 });

        assert_eq!(
            drain(&mut rx),
            vec![
                UiEvent::Text("Time remaining: 3".into()),
                UiEvent::Busy(true),
                UiEvent::Text(labels::TIMER_DONE.into()),
                UiEvent::Busy(false),
            ]
        );
    }
}
