//! # Consumer loop: one item at a time, on the worker thread.
//!
//! The consumer owns every receiving half and a [`DelayQueue`] of pending
//! notices and scheduled tasks. Each pass picks exactly one ready item and runs
//! it to completion before looking again.
//!
//! ```text
//! loop {
//!   token cancelled?         → stop
//!   select! (biased):
//!     token.cancelled()      → stop
//!     pending deadline due   → deliver notice | run scheduled task
//!     notices/scheduled rx   → park in DelayQueue
//!     counter rx             → handlers::counter
//!     images rx              → handlers::image_download
//!     tasks rx               → run_task (panic-isolated)
//!     all closed, none due   → stop
//! }
//! on stop: close inboxes, count what never ran, publish WorkerStopped
//! ```
//!
//! ## Rules
//! - The item being executed when shutdown is requested finishes; nothing
//!   queued after it starts.
//! - A panicking task is reported and the loop continues.

use std::future::poll_fn;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tokio_util::time::DelayQueue;
use tracing::{debug, error, warn};

use crate::core::context::WorkContext;
use crate::core::handlers;
use crate::core::message::{BoxTask, ImageRequest, Mailboxes, SubHandler};
use crate::core::timer::TimerEvent;
use crate::events::{Event, EventKind};

/// What the consumer thread reports when it exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Queued or scheduled items that never started.
    pub abandoned: usize,
}

/// Item parked until its deadline.
enum Pending {
    Notice(String),
    Task(BoxTask),
}

/// One selected unit of work.
enum Next {
    Stop,
    Due(Pending),
    Park(Pending, tokio::time::Instant),
    Counter(TimerEvent),
    Image(ImageRequest),
    Task(BoxTask),
}

pub(crate) struct Consumer {
    ctx: WorkContext,
    mailboxes: Mailboxes,
    pending: DelayQueue<Pending>,
    token: CancellationToken,
}

impl Consumer {
    pub(crate) fn new(ctx: WorkContext, mailboxes: Mailboxes, token: CancellationToken) -> Self {
        Self {
            ctx,
            mailboxes,
            pending: DelayQueue::new(),
            token,
        }
    }

    /// Drains the inboxes until shutdown and reports what was left behind.
    pub(crate) async fn run(mut self) -> ShutdownReport {
        self.ctx.bus().publish(Event::new(EventKind::WorkerStarted));
        debug!("consumer started");

        loop {
            if self.token.is_cancelled() {
                break;
            }
            match self.next().await {
                Next::Stop => break,
                Next::Due(Pending::Notice(text)) => {
                    self.ctx.courier().notice(&text);
                    self.ctx.bus().publish(
                        Event::new(EventKind::NoticeDelivered)
                            .with_handler(SubHandler::DelayedNotice.as_str()),
                    );
                }
                Next::Due(Pending::Task(task)) => self.run_task(task).await,
                Next::Park(item, deadline) => {
                    self.pending.insert_at(item, deadline);
                }
                Next::Counter(ev) => {
                    handlers::counter(&self.ctx, ev);
                    self.handled(SubHandler::Counter);
                }
                Next::Image(req) => {
                    handlers::image_download(&self.ctx, req).await;
                    self.handled(SubHandler::ImageDownload);
                }
                Next::Task(task) => self.run_task(task).await,
            }
        }

        let abandoned = self.mailboxes.abandon() + self.pending.len();
        self.pending.clear();
        if abandoned > 0 {
            warn!(abandoned, "consumer stopped; queued work abandoned");
        } else {
            debug!("consumer stopped");
        }
        self.ctx
            .bus()
            .publish(Event::new(EventKind::WorkerStopped).with_count(abandoned));
        ShutdownReport { abandoned }
    }

    async fn next(&mut self) -> Next {
        let has_pending = !self.pending.is_empty();
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Next::Stop,
            Some(expired) = poll_fn(|cx| self.pending.poll_expired(cx)), if has_pending => {
                Next::Due(expired.into_inner())
            }
            Some(notice) = self.mailboxes.notices.recv() => {
                Next::Park(Pending::Notice(notice.text), notice.deadline)
            }
            Some(scheduled) = self.mailboxes.scheduled.recv() => {
                Next::Park(Pending::Task(scheduled.task), scheduled.deadline)
            }
            Some(ev) = self.mailboxes.counter.recv() => Next::Counter(ev),
            Some(req) = self.mailboxes.images.recv() => Next::Image(req),
            Some(task) = self.mailboxes.tasks.recv() => Next::Task(task),
            else => Next::Stop,
        }
    }

    fn handled(&self, handler: SubHandler) {
        self.ctx
            .bus()
            .publish(Event::new(EventKind::MessageHandled).with_handler(handler.as_str()));
    }

    /// Runs one task, isolating panics from the loop.
    async fn run_task(&self, task: BoxTask) {
        let bus = self.ctx.bus();
        bus.publish(Event::new(EventKind::TaskStarting));

        let ctx = self.ctx.clone();
        let fut = AssertUnwindSafe(async move { task(ctx).await });
        match fut.catch_unwind().await {
            Ok(()) => bus.publish(Event::new(EventKind::TaskFinished)),
            Err(panic_err) => {
                let info = {
                    let any = &*panic_err;
                    if let Some(msg) = any.downcast_ref::<&'static str>() {
                        (*msg).to_string()
                    } else if let Some(msg) = any.downcast_ref::<String>() {
                        msg.clone()
                    } else {
                        "unknown panic".to_string()
                    }
                };
                error!(reason = %info, "task panicked");
                bus.publish(Event::new(EventKind::TaskPanicked).with_reason(info));
            }
        }
    }
}
