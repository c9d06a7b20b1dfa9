//! # Typed messages and the inboxes that carry them.
//!
//! Every sub-handler owns an independent FIFO inbox; all inboxes are drained
//! by the same consumer thread. Posting never blocks: every inbox is an
//! unbounded `tokio::sync::mpsc` channel, safe to feed from any thread.
//!
//! ```text
//! WorkerEngine (any thread)                     consumer thread
//!   post_task        ──► [tasks]          ──┐
//!   post_message     ──► [image_download] ──┤
//!     ├─ Counter     ──► [counter] ◄── TimerEngine
//!     └─ DelayedNotice► [delayed_notice] ──┼──► select! ──► one item at a time
//!   post_task_delayed──► [scheduled]      ──┘
//! ```

use std::fmt;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::core::context::WorkContext;
use crate::core::timer::TimerEvent;

/// Boxed unit of work executed on the consumer thread.
pub(crate) type BoxTask = Box<dyn FnOnce(WorkContext) -> BoxFuture<'static, ()> + Send>;

/// Payload of an `image_download` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRequest {
    /// Fetch exactly this url.
    Single(String),
    /// Fetch exactly one url picked uniformly at random from the set.
    Random(Vec<String>),
}

/// A typed message addressed to one sub-handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    /// Download an image and deliver it.
    ImageDownload(ImageRequest),
    /// Countdown progress from a [`TimerEngine`](crate::TimerEngine).
    Counter(TimerEvent),
    /// Deliver `text` as a transient notice after `delay`.
    DelayedNotice {
        /// Notice text.
        text: String,
        /// Delay before delivery.
        delay: Duration,
    },
}

impl WorkerMessage {
    /// Sub-handler this message is routed to.
    pub fn handler(&self) -> SubHandler {
        match self {
            WorkerMessage::ImageDownload(_) => SubHandler::ImageDownload,
            WorkerMessage::Counter(_) => SubHandler::Counter,
            WorkerMessage::DelayedNotice { .. } => SubHandler::DelayedNotice,
        }
    }
}

/// Named sub-handler queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubHandler {
    /// Image downloads.
    ImageDownload,
    /// Timer tick/done events.
    Counter,
    /// Delayed transient notices.
    DelayedNotice,
}

impl SubHandler {
    /// Stable snake_case name (for logs and events).
    pub fn as_str(&self) -> &'static str {
        match self {
            SubHandler::ImageDownload => "image_download",
            SubHandler::Counter => "counter",
            SubHandler::DelayedNotice => "delayed_notice",
        }
    }
}

impl fmt::Display for SubHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notice waiting for its deadline.
pub(crate) struct Notice {
    pub text: String,
    pub deadline: Instant,
}

/// A task waiting for its deadline.
pub(crate) struct Scheduled {
    pub task: BoxTask,
    pub deadline: Instant,
}

/// Sending halves, held by the engine while it is running.
pub(crate) struct Inboxes {
    pub tasks: mpsc::UnboundedSender<BoxTask>,
    pub images: mpsc::UnboundedSender<ImageRequest>,
    pub counter: mpsc::UnboundedSender<TimerEvent>,
    pub notices: mpsc::UnboundedSender<Notice>,
    pub scheduled: mpsc::UnboundedSender<Scheduled>,
}

/// Receiving halves, owned by the consumer thread.
pub(crate) struct Mailboxes {
    pub tasks: mpsc::UnboundedReceiver<BoxTask>,
    pub images: mpsc::UnboundedReceiver<ImageRequest>,
    pub counter: mpsc::UnboundedReceiver<TimerEvent>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
    pub scheduled: mpsc::UnboundedReceiver<Scheduled>,
}

impl Mailboxes {
    /// Closes every inbox and counts the items that will never run.
    pub fn abandon(&mut self) -> usize {
        fn drop_all<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> usize {
            rx.close();
            let mut n = 0;
            while rx.try_recv().is_ok() {
                n += 1;
            }
            n
        }
        drop_all(&mut self.tasks)
            + drop_all(&mut self.images)
            + drop_all(&mut self.counter)
            + drop_all(&mut self.notices)
            + drop_all(&mut self.scheduled)
    }
}

/// Creates one connected inbox/mailbox pair per queue.
pub(crate) fn channels() -> (Inboxes, Mailboxes) {
    let (tasks_tx, tasks_rx) = mpsc::unbounded_channel();
    let (images_tx, images_rx) = mpsc::unbounded_channel();
    let (counter_tx, counter_rx) = mpsc::unbounded_channel();
    let (notices_tx, notices_rx) = mpsc::unbounded_channel();
    let (scheduled_tx, scheduled_rx) = mpsc::unbounded_channel();
    (
        Inboxes {
            tasks: tasks_tx,
            images: images_tx,
            counter: counter_tx,
            notices: notices_tx,
            scheduled: scheduled_tx,
        },
        Mailboxes {
            tasks: tasks_rx,
            images: images_rx,
            counter: counter_rx,
            notices: notices_rx,
            scheduled: scheduled_rx,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_route_to_their_handler() {
        let img = WorkerMessage::ImageDownload(ImageRequest::Single("u".into()));
        let tick = WorkerMessage::Counter(TimerEvent::Done { generation: 1 });
        let notice = WorkerMessage::DelayedNotice {
            text: "hi".into(),
            delay: Duration::ZERO,
        };
        assert_eq!(img.handler().as_str(), "image_download");
        assert_eq!(tick.handler(), SubHandler::Counter);
        assert_eq!(notice.handler().to_string(), "delayed_notice");
    }

    #[test]
    fn abandon_counts_everything_left() {
        let (inboxes, mut mailboxes) = channels();
        inboxes.images.send(ImageRequest::Single("a".into())).unwrap();
        inboxes.images.send(ImageRequest::Single("b".into())).unwrap();
        inboxes.counter.send(TimerEvent::Done { generation: 1 }).unwrap();

        assert_eq!(mailboxes.abandon(), 3);
        assert!(inboxes.images.send(ImageRequest::Single("c".into())).is_err());
    }
}
