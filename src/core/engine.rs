//! # WorkerEngine: the long-lived worker.
//!
//! The engine accepts posted closures and typed messages from any thread,
//! executes them one at a time on its own consumer thread and pushes results
//! to whatever [`ResultSink`] is attached at delivery time.
//!
//! ## Architecture
//! ```text
//! caller threads                      worker thread ("handoff-worker")
//!  post_task ─────────► [tasks] ───┐
//!  post_message ──────► [image_download | counter | delayed_notice] ─┼─► Consumer ─► Courier ─► SinkSlot ─► ResultSink
//!  post_task_delayed ─► [scheduled] ┘                                  ▲
//!  start_timer ─► TimerEngine (own thread) ──► [counter] ──────────────┘
//!  attach / detach ─────────────────────────────────────► SinkSlot (arc-swap)
//! ```
//!
//! ## Lifecycle
//! ```text
//! Idle ──start()──► Running ──shutdown()──► Closed
//!   └───────────────shutdown()────────────────┘
//! ```
//! - Posting while `Idle` fails with [`EngineError::NotStarted`].
//! - Posting once `Closed` fails with [`EngineError::Closed`].
//! - A second `start()` is a no-op; a second `shutdown()` too.
//!
//! ## Shutdown
//! The item executing when `shutdown()` is called runs to completion, so
//! every `busy(true)` it delivered is followed by its `busy(false)`. Items
//! still queued (delayed ones included) are abandoned; the count is logged,
//! published in [`EventKind::WorkerStopped`] and returned by [`WorkerEngine::join`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};

use futures::FutureExt;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::WorkerConfig;
use crate::core::consumer::{Consumer, ShutdownReport};
use crate::core::context::WorkContext;
use crate::core::handlers;
use crate::core::message::{
    self, BoxTask, ImageRequest, Inboxes, Notice, Scheduled, WorkerMessage,
};
use crate::core::runtime::spawn_context;
use crate::core::timer::TimerEngine;
use crate::error::EngineError;
use crate::events::{Bus, Event, EventKind};
use crate::fetch::FetchRef;
use crate::labels;
use crate::sink::{Courier, ResultSink, SinkSlot};

enum Lifecycle {
    Idle,
    Running {
        inboxes: Inboxes,
        token: CancellationToken,
        join: Option<JoinHandle<ShutdownReport>>,
    },
    Closed {
        join: Option<JoinHandle<ShutdownReport>>,
    },
}

/// Single-consumer worker with a swappable result sink.
///
/// Share it as `Arc<WorkerEngine>`; every method takes `&self`.
pub struct WorkerEngine {
    config: Arc<WorkerConfig>,
    slot: Arc<SinkSlot>,
    courier: Courier,
    fetcher: FetchRef,
    bus: Bus,
    lifecycle: Mutex<Lifecycle>,
    timer: Mutex<Option<TimerEngine>>,
    timer_generation: AtomicU64,
}

impl WorkerEngine {
    /// Creates an idle engine. Nothing runs until [`start`](Self::start).
    pub fn new(config: WorkerConfig, fetcher: FetchRef) -> Self {
        let bus = Bus::new(config.bus_capacity_clamped());
        let slot = Arc::new(SinkSlot::new());
        Self {
            config: Arc::new(config),
            courier: Courier::new(Arc::clone(&slot), bus.clone()),
            slot,
            fetcher,
            bus,
            lifecycle: Mutex::new(Lifecycle::Idle),
            timer: Mutex::new(None),
            timer_generation: AtomicU64::new(0),
        }
    }

    /// Spawns the consumer thread.
    ///
    /// A second call while running is a no-op. Fails with
    /// [`EngineError::Closed`] after shutdown.
    pub fn start(&self) -> Result<(), EngineError> {
        let mut lifecycle = self.lifecycle();
        match &*lifecycle {
            Lifecycle::Running { .. } => {
                debug!("engine already started");
                return Ok(());
            }
            Lifecycle::Closed { .. } => return Err(EngineError::Closed),
            Lifecycle::Idle => {}
        }

        let (inboxes, mailboxes) = message::channels();
        let token = CancellationToken::new();
        let ctx = WorkContext::new(
            self.courier.clone(),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.config),
            self.bus.clone(),
        );
        let consumer_token = token.clone();
        let join = spawn_context(&self.config.worker_thread_name, move || {
            Consumer::new(ctx, mailboxes, consumer_token).run()
        })?;

        *lifecycle = Lifecycle::Running {
            inboxes,
            token,
            join: Some(join),
        };
        info!(
            thread = %self.config.worker_thread_name,
            fetcher = self.fetcher.name(),
            "engine started"
        );
        Ok(())
    }

    /// Attaches `sink`, replacing any previous one. Returns the attach generation.
    pub fn attach(&self, sink: Arc<dyn ResultSink>) -> u64 {
        let name = sink.name();
        let generation = self.slot.attach(sink);
        debug!(sink = name, generation, "sink attached");
        self.bus
            .publish(Event::new(EventKind::SinkAttached).with_generation(generation));
        generation
    }

    /// Clears the sink. Queued work keeps running; its deliveries are skipped.
    ///
    /// Returns `true` if a sink was attached.
    pub fn detach(&self) -> bool {
        let was = self.slot.detach();
        if was {
            debug!("sink detached");
            self.bus.publish(Event::new(EventKind::SinkDetached));
        }
        was
    }

    /// Returns `true` while a sink is attached.
    pub fn is_attached(&self) -> bool {
        self.slot.is_attached()
    }

    /// Enqueues a task for serial execution on the consumer thread.
    pub fn post_task<F, Fut>(&self, f: F) -> Result<(), EngineError>
    where
        F: FnOnce(WorkContext) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task = boxed(f);
        self.with_inboxes(|inboxes| inboxes.tasks.send(task).map_err(|_| EngineError::Closed))??;
        debug!("task posted");
        Ok(())
    }

    /// Enqueues a task that becomes runnable after `delay`.
    pub fn post_task_delayed<F, Fut>(&self, delay: Duration, f: F) -> Result<(), EngineError>
    where
        F: FnOnce(WorkContext) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let scheduled = Scheduled {
            task: boxed(f),
            deadline: Instant::now() + delay,
        };
        self.with_inboxes(|inboxes| {
            inboxes
                .scheduled
                .send(scheduled)
                .map_err(|_| EngineError::Closed)
        })??;
        debug!(?delay, "task scheduled");
        self.bus
            .publish(Event::new(EventKind::TaskScheduled).with_delay(delay));
        Ok(())
    }

    /// Enqueues a task for a wall-clock moment. Past moments run as soon as possible.
    pub fn post_task_at<F, Fut>(&self, at: SystemTime, f: F) -> Result<(), EngineError>
    where
        F: FnOnce(WorkContext) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.post_task_delayed(until(at), f)
    }

    /// Routes `msg` to its sub-handler inbox.
    ///
    /// A random image request without urls is rejected with
    /// [`EngineError::InvalidMessage`].
    pub fn post_message(&self, msg: WorkerMessage) -> Result<(), EngineError> {
        if let WorkerMessage::ImageDownload(ImageRequest::Random(urls)) = &msg {
            if urls.is_empty() {
                return Err(EngineError::InvalidMessage {
                    reason: "random image request needs at least one url".into(),
                });
            }
        }

        let handler = msg.handler();
        let mut scheduled_delay = None;
        self.with_inboxes(|inboxes| match msg {
            WorkerMessage::ImageDownload(req) => {
                inboxes.images.send(req).map_err(|_| EngineError::Closed)
            }
            WorkerMessage::Counter(ev) => inboxes.counter.send(ev).map_err(|_| EngineError::Closed),
            WorkerMessage::DelayedNotice { text, delay } => {
                scheduled_delay = Some(delay);
                inboxes
                    .notices
                    .send(Notice {
                        text,
                        deadline: Instant::now() + delay,
                    })
                    .map_err(|_| EngineError::Closed)
            }
        })??;

        debug!(%handler, "message posted");
        if let Some(delay) = scheduled_delay {
            self.bus.publish(
                Event::new(EventKind::NoticeScheduled)
                    .with_handler(handler.as_str())
                    .with_delay(delay),
            );
        }
        Ok(())
    }

    /// Canonical immediate-task download of the configured task image.
    pub fn download_with_task(&self) -> Result<(), EngineError> {
        let url = self.config.task_image_url.clone();
        self.post_task(move |ctx| handlers::canonical_download(ctx, url))
    }

    /// Shows the "sending" label and posts a download of the configured message image.
    pub fn download_with_message(&self) -> Result<(), EngineError> {
        self.ensure_running()?;
        self.courier.operation(labels::MESSAGE_SENT);
        self.post_message(WorkerMessage::ImageDownload(ImageRequest::Single(
            self.config.message_image_url.clone(),
        )))
    }

    /// Shows the "sending" label and posts a random download over the configured set.
    pub fn download_random_with_message(&self) -> Result<(), EngineError> {
        self.ensure_running()?;
        self.courier.operation(labels::MESSAGE_SENT);
        self.post_message(WorkerMessage::ImageDownload(ImageRequest::Random(
            self.config.random_image_urls.clone(),
        )))
    }

    /// Posts the configured delayed notice.
    pub fn start_message_delay(&self) -> Result<(), EngineError> {
        self.post_message(WorkerMessage::DelayedNotice {
            text: self.config.notice_text.clone(),
            delay: self.config.notice_delay,
        })
    }

    /// Delivers `text` as a transient notice at the wall-clock moment `at`.
    pub fn notice_at(&self, at: SystemTime, text: impl Into<String>) -> Result<(), EngineError> {
        self.post_message(WorkerMessage::DelayedNotice {
            text: text.into(),
            delay: until(at),
        })
    }

    /// Delivers the configured toast text `toast_offset` from now.
    pub fn toast_at_time(&self) -> Result<(), EngineError> {
        self.notice_at(
            SystemTime::now() + self.config.toast_offset,
            self.config.toast_text.clone(),
        )
    }

    /// Cancels the active countdown (if any) and starts a new one feeding the
    /// `counter` sub-handler. Returns the new timer's generation.
    pub fn start_timer(&self, total: Duration, interval: Duration) -> Result<u64, EngineError> {
        let mut active = self.timer();
        let recipient = self.with_inboxes(|inboxes| inboxes.counter.clone())?;

        let generation = self.timer_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let timer = TimerEngine::new(total, interval, recipient, generation)?
            .with_thread_name(self.config.timer_thread_name.clone());

        if let Some(previous) = active.take() {
            self.cancel_timer(&previous);
        }
        timer.start()?;
        *active = Some(timer);

        debug!(generation, ?total, ?interval, "timer started");
        self.bus
            .publish(Event::new(EventKind::TimerStarted).with_generation(generation));
        Ok(generation)
    }

    /// [`start_timer`](Self::start_timer) with the configured total and interval.
    pub fn start_default_timer(&self) -> Result<u64, EngineError> {
        self.start_timer(self.config.timer_total, self.config.timer_interval)
    }

    /// Stops accepting work, cancels the timer and signals the consumer.
    ///
    /// Irreversible; repeated calls are no-ops. Does not wait: see [`join`](Self::join).
    pub fn shutdown(&self) {
        {
            let mut lifecycle = self.lifecycle();
            match std::mem::replace(&mut *lifecycle, Lifecycle::Closed { join: None }) {
                Lifecycle::Closed { join } => {
                    *lifecycle = Lifecycle::Closed { join };
                    return;
                }
                Lifecycle::Idle => {}
                Lifecycle::Running { inboxes, token, join } => {
                    // Cancel before closing the inboxes: the consumer must not
                    // pick up buffered items from the closed channels.
                    token.cancel();
                    drop(inboxes);
                    *lifecycle = Lifecycle::Closed { join };
                }
            }
        }

        info!("engine shutdown requested");
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        if let Some(timer) = self.timer().take() {
            self.cancel_timer(&timer);
        }
    }

    /// Blocks until the consumer thread exits and returns its report.
    ///
    /// Returns `None` if the engine never started or was already joined.
    /// Must not be called from the consumer thread itself.
    pub fn join(&self) -> Option<ShutdownReport> {
        let handle = match &mut *self.lifecycle() {
            Lifecycle::Idle => None,
            Lifecycle::Running { join, .. } | Lifecycle::Closed { join } => join.take(),
        }?;
        match handle.join() {
            Ok(report) => Some(report),
            Err(_) => {
                error!("consumer thread panicked");
                None
            }
        }
    }

    /// Subscribes to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Engine configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn timer(&self) -> MutexGuard<'_, Option<TimerEngine>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_inboxes<R>(&self, f: impl FnOnce(&Inboxes) -> R) -> Result<R, EngineError> {
        match &*self.lifecycle() {
            Lifecycle::Idle => Err(EngineError::NotStarted),
            Lifecycle::Closed { .. } => Err(EngineError::Closed),
            Lifecycle::Running { inboxes, .. } => Ok(f(inboxes)),
        }
    }

    fn ensure_running(&self) -> Result<(), EngineError> {
        self.with_inboxes(|_| ())
    }

    fn cancel_timer(&self, timer: &TimerEngine) {
        if timer.cancel() {
            self.bus
                .publish(Event::new(EventKind::TimerCancelled).with_generation(timer.generation()));
        }
    }
}

impl Drop for WorkerEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn boxed<F, Fut>(f: F) -> BoxTask
where
    F: FnOnce(WorkContext) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Box::new(move |ctx| f(ctx).boxed())
}

/// Delay from now until `at`; zero for moments in the past.
fn until(at: SystemTime) -> Duration {
    at.duration_since(SystemTime::now()).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use bytes::Bytes;
    use tokio::sync::{mpsc, oneshot};
    use tokio::time::timeout;

    use super::*;
    use crate::error::FetchError;
    use crate::events::recv_kind;
    use crate::fetch::FetchFn;
    use crate::sink::{ChannelSink, UiEvent};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
    const WAIT: Duration = Duration::from_secs(5);

    fn config() -> WorkerConfig {
        WorkerConfig {
            pacing_delay: Duration::ZERO,
            ..WorkerConfig::default()
        }
    }

    fn png_fetcher() -> FetchRef {
        FetchFn::arc("png", |_url: String| async { Ok::<_, FetchError>(Bytes::from_static(PNG)) })
    }

    fn started(fetcher: FetchRef) -> (Arc<WorkerEngine>, mpsc::UnboundedReceiver<UiEvent>) {
        let engine = Arc::new(WorkerEngine::new(config(), fetcher));
        let (sink, rx) = ChannelSink::new();
        engine.attach(Arc::new(sink));
        engine.start().unwrap();
        (engine, rx)
    }

    async fn next_ui(rx: &mut mpsc::UnboundedReceiver<UiEvent>) -> UiEvent {
        timeout(WAIT, rx.recv()).await.expect("ui event in time").expect("sink open")
    }

    async fn wait_for(events: &mut broadcast::Receiver<Event>, kind: EventKind) -> Event {
        timeout(WAIT, recv_kind(events, kind))
            .await
            .expect("event in time")
            .expect("bus open")
    }

    async fn join(engine: &Arc<WorkerEngine>) -> Option<ShutdownReport> {
        let engine = Arc::clone(engine);
        tokio::task::spawn_blocking(move || engine.join()).await.unwrap()
    }

    #[test]
    fn posting_before_start_fails() {
        let engine = WorkerEngine::new(config(), png_fetcher());
        let err = engine.post_task(|_ctx| async {}).unwrap_err();
        assert!(matches!(err, EngineError::NotStarted));
        assert!(matches!(engine.start_default_timer(), Err(EngineError::NotStarted)));
        assert!(engine.join().is_none());
    }

    #[tokio::test]
    async fn posting_after_shutdown_fails_and_start_is_refused() {
        let (engine, _rx) = started(png_fetcher());
        engine.shutdown();
        engine.shutdown();

        assert!(matches!(engine.post_task(|_ctx| async {}), Err(EngineError::Closed)));
        assert!(matches!(engine.download_with_message(), Err(EngineError::Closed)));
        assert!(matches!(engine.start(), Err(EngineError::Closed)));
        assert_eq!(join(&engine).await, Some(ShutdownReport { abandoned: 0 }));
        assert!(join(&engine).await.is_none());
    }

    #[tokio::test]
    async fn second_start_is_a_noop() {
        let (engine, mut rx) = started(png_fetcher());
        engine.start().unwrap();

        engine
            .post_task(|ctx| async move {
                ctx.courier().text("once");
            })
            .unwrap();
        assert_eq!(next_ui(&mut rx).await, UiEvent::Text("once".into()));
        engine.shutdown();
        assert!(join(&engine).await.is_some());
    }

    #[tokio::test]
    async fn tasks_run_in_submission_order() {
        let (engine, mut rx) = started(png_fetcher());
        for i in 0..50 {
            engine
                .post_task(move |ctx| async move {
                    ctx.courier().text(&i.to_string());
                })
                .unwrap();
        }
        for i in 0..50 {
            assert_eq!(next_ui(&mut rx).await, UiEvent::Text(i.to_string()));
        }
    }

    #[tokio::test]
    async fn image_messages_keep_fifo_order() {
        let fetcher: FetchRef = FetchFn::arc("echo", |url: String| async move {
            Ok::<_, FetchError>(Bytes::from(url))
        });
        let (engine, mut rx) = started(fetcher);
        let mut events = engine.subscribe();

        for i in 0..5 {
            engine
                .post_message(WorkerMessage::ImageDownload(ImageRequest::Single(format!("u{i}"))))
                .unwrap();
        }
        for _ in 0..5 {
            wait_for(&mut events, EventKind::MessageHandled).await;
        }

        let mut images = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if let UiEvent::Image(bytes) = ev {
                images.push(bytes);
            }
        }
        let expected: Vec<Bytes> = (0..5).map(|i| Bytes::from(format!("u{i}"))).collect();
        assert_eq!(images, expected);
    }

    #[tokio::test]
    async fn download_with_task_pairs_busy_and_delivers_image() {
        let (engine, mut rx) = started(png_fetcher());
        engine.download_with_task().unwrap();

        let expected = vec![
            UiEvent::Busy(true),
            UiEvent::Operation(labels::TASK_STARTED.into()),
            UiEvent::Text(labels::EXECUTING.into()),
            UiEvent::Image(Bytes::from_static(PNG)),
            UiEvent::Text(labels::IMAGE_DOWNLOADED.into()),
            UiEvent::Busy(false),
            UiEvent::Operation(labels::TASK_ENDED.into()),
        ];
        for want in expected {
            assert_eq!(next_ui(&mut rx).await, want);
        }
    }

    #[tokio::test]
    async fn download_with_message_labels_before_handling() {
        let (engine, mut rx) = started(png_fetcher());
        engine.download_with_message().unwrap();

        assert_eq!(
            next_ui(&mut rx).await,
            UiEvent::Operation(labels::MESSAGE_SENT.into())
        );
        let mut last = None;
        for _ in 0..5 {
            last = Some(next_ui(&mut rx).await);
        }
        assert_eq!(last, Some(UiEvent::Operation(labels::MESSAGE_HANDLED.into())));
    }

    #[test]
    fn empty_random_set_is_rejected_at_post_time() {
        let engine = WorkerEngine::new(config(), png_fetcher());
        let err = engine
            .post_message(WorkerMessage::ImageDownload(ImageRequest::Random(Vec::new())))
            .unwrap_err();
        assert_eq!(err.as_label(), "engine_invalid_message");
    }

    #[tokio::test]
    async fn detach_skips_deliveries_and_reattach_gets_the_rest() {
        let (gate_tx, gate_rx) = oneshot::channel::<()>();
        let gate = Arc::new(Mutex::new(Some(gate_rx)));
        let fetcher: FetchRef = FetchFn::arc("gated", move |_url: String| {
            let gate = gate.lock().unwrap().take();
            async move {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                Ok::<_, FetchError>(Bytes::from_static(PNG))
            }
        });
        let (engine, mut first) = started(fetcher);
        let mut events = engine.subscribe();

        engine.download_with_task().unwrap();
        for _ in 0..3 {
            next_ui(&mut first).await;
        }

        // Fetch is parked on the gate: swap sinks around it.
        engine.detach();
        let (second_sink, mut second) = ChannelSink::new();
        engine.attach(Arc::new(second_sink));
        gate_tx.send(()).unwrap();
        wait_for(&mut events, EventKind::TaskFinished).await;

        assert!(first.try_recv().is_err());
        let mut rest = Vec::new();
        while let Ok(ev) = second.try_recv() {
            rest.push(ev);
        }
        assert_eq!(
            rest,
            vec![
                UiEvent::Image(Bytes::from_static(PNG)),
                UiEvent::Text(labels::IMAGE_DOWNLOADED.into()),
                UiEvent::Busy(false),
                UiEvent::Operation(labels::TASK_ENDED.into()),
            ]
        );
    }

    #[tokio::test]
    async fn detached_completion_never_reaches_a_sink() {
        let (engine, mut rx) = started(png_fetcher());
        let mut events = engine.subscribe();
        engine.detach();

        engine.download_with_task().unwrap();
        wait_for(&mut events, EventKind::TaskFinished).await;

        assert!(rx.try_recv().is_err());
        assert!(!engine.is_attached());
    }

    #[tokio::test]
    async fn panicking_task_does_not_stop_the_consumer() {
        let (engine, mut rx) = started(png_fetcher());
        let mut events = engine.subscribe();

        engine.post_task(|_ctx| async { panic!("boom"); }).unwrap();
        let ev = wait_for(&mut events, EventKind::TaskPanicked).await;
        assert_eq!(ev.reason.as_deref(), Some("boom"));

        engine
            .post_task(|ctx| async move {
                ctx.courier().text("alive");
            })
            .unwrap();
        assert_eq!(next_ui(&mut rx).await, UiEvent::Text("alive".into()));
    }

    #[tokio::test]
    async fn shutdown_finishes_current_item_and_abandons_the_rest() {
        let (engine, mut rx) = started(png_fetcher());
        let (entered_tx, entered_rx) = oneshot::channel::<()>();
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let ran = Arc::new(AtomicUsize::new(0));

        engine
            .post_task(move |ctx| async move {
                ctx.courier().busy(true);
                let _ = entered_tx.send(());
                let _ = release_rx.await;
                ctx.courier().busy(false);
            })
            .unwrap();
        for _ in 0..3 {
            let ran = Arc::clone(&ran);
            engine
                .post_task(move |_ctx| async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
        engine.start_message_delay().unwrap();

        timeout(WAIT, entered_rx).await.unwrap().unwrap();
        engine.shutdown();
        release_tx.send(()).unwrap();

        let report = join(&engine).await.expect("report");
        assert_eq!(report.abandoned, 4);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(next_ui(&mut rx).await, UiEvent::Busy(true));
        assert_eq!(next_ui(&mut rx).await, UiEvent::Busy(false));
    }

    #[tokio::test]
    async fn queued_task_stays_abandoned_while_shutdown_waits_on_the_timer_lock() {
        let (engine, _rx) = started(png_fetcher());
        let mut events = engine.subscribe();
        let (entered_tx, entered_rx) = oneshot::channel::<()>();
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let ran = Arc::new(AtomicUsize::new(0));

        engine
            .post_task(move |_ctx| async move {
                let _ = entered_tx.send(());
                let _ = release_rx.await;
            })
            .unwrap();
        {
            let ran = Arc::clone(&ran);
            engine
                .post_task(move |_ctx| async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
        timeout(WAIT, entered_rx).await.unwrap().unwrap();

        // Stands in for a start_timer() that holds the timer lock.
        let (locked_tx, locked_rx) = std::sync::mpsc::channel::<()>();
        let (unlock_tx, unlock_rx) = std::sync::mpsc::channel::<()>();
        let holder = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                let _active = engine.timer();
                let _ = locked_tx.send(());
                let _ = unlock_rx.recv();
            })
        };
        locked_rx.recv().unwrap();

        let stopping = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || engine.shutdown())
        };
        wait_for(&mut events, EventKind::ShutdownRequested).await;
        assert!(matches!(engine.post_task(|_ctx| async {}), Err(EngineError::Closed)));

        // shutdown() is still blocked on the timer lock; the consumer must stop anyway.
        release_tx.send(()).unwrap();
        let stopped = wait_for(&mut events, EventKind::WorkerStopped).await;
        assert_eq!(stopped.count, Some(1));
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        unlock_tx.send(()).unwrap();
        holder.join().unwrap();
        stopping.join().unwrap();
        let report = join(&engine).await.expect("report");
        assert_eq!(report.abandoned, 1);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn delayed_notice_is_delivered_as_transient_notice() {
        let (engine, mut rx) = started(png_fetcher());
        engine
            .post_message(WorkerMessage::DelayedNotice {
                text: "later".into(),
                delay: Duration::from_millis(30),
            })
            .unwrap();
        engine
            .post_task(|ctx| async move {
                ctx.courier().text("now");
            })
            .unwrap();

        assert_eq!(next_ui(&mut rx).await, UiEvent::Text("now".into()));
        assert_eq!(next_ui(&mut rx).await, UiEvent::Notice("later".into()));
    }

    #[tokio::test]
    async fn scheduled_task_waits_for_its_deadline() {
        let (engine, mut rx) = started(png_fetcher());
        let posted = std::time::Instant::now();
        engine
            .post_task_delayed(Duration::from_millis(40), |ctx| async move {
                ctx.courier().text("late");
            })
            .unwrap();
        engine
            .post_task_at(SystemTime::now() - Duration::from_secs(1), |ctx| async move {
                ctx.courier().text("overdue");
            })
            .unwrap();

        assert_eq!(next_ui(&mut rx).await, UiEvent::Text("overdue".into()));
        assert_eq!(next_ui(&mut rx).await, UiEvent::Text("late".into()));
        assert!(posted.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn restarting_the_timer_runs_only_the_second_to_completion() {
        let (engine, mut rx) = started(png_fetcher());
        let mut events = engine.subscribe();

        let first = engine
            .start_timer(Duration::from_secs(30), Duration::from_millis(10))
            .unwrap();
        let second = engine
            .start_timer(Duration::from_millis(60), Duration::from_millis(20))
            .unwrap();
        assert!(second > first);

        let cancelled = wait_for(&mut events, EventKind::TimerCancelled).await;
        assert_eq!(cancelled.generation, Some(first));

        let mut done = 0;
        loop {
            match next_ui(&mut rx).await {
                UiEvent::Text(t) if t == labels::TIMER_DONE => {
                    done += 1;
                    break;
                }
                _ => {}
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        while let Ok(ev) = rx.try_recv() {
            if ev == UiEvent::Text(labels::TIMER_DONE.into()) {
                done += 1;
            }
        }
        assert_eq!(done, 1);
    }

    #[tokio::test]
    async fn countdown_ends_idle() {
        let (engine, mut rx) = started(png_fetcher());
        engine
            .start_timer(Duration::from_millis(30), Duration::from_millis(10))
            .unwrap();

        let mut seen = Vec::new();
        loop {
            let ev = next_ui(&mut rx).await;
            let done = ev == UiEvent::Busy(false);
            seen.push(ev);
            if done {
                break;
            }
        }
        assert_eq!(seen.first(), Some(&UiEvent::Text(labels::time_remaining(0))));
        assert_eq!(
            &seen[seen.len() - 2..],
            &[UiEvent::Text(labels::TIMER_DONE.into()), UiEvent::Busy(false)]
        );
    }
}
