//! # Worker configuration.
//!
//! [`WorkerConfig`] centralizes every tunable of the engine: pacing of the
//! canonical download task, delayed/scheduled notice defaults, the default
//! countdown, the image urls used by the convenience operations, the event
//! bus capacity and the names of the execution contexts.
//!
//! ## Sentinel values
//! - `pacing_delay = 0s` → no artificial delay before the fetch
//! - `fetch_timeout = 0s` → no client-side timeout (HTTP fetcher only)
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use handoff::WorkerConfig;
//!
//! let mut cfg = WorkerConfig::default();
//! cfg.pacing_delay = Duration::ZERO;
//! cfg.timer_total = Duration::from_secs(3);
//!
//! assert_eq!(cfg.pacing(), None);
//! assert_eq!(cfg.timer_total, Duration::from_secs(3));
//! ```

use std::time::Duration;

const IMAGE_A: &str =
    "https://pixabay.com/static/uploads/photo/2016/08/05/18/28/mobile-phone-1572901_960_720.jpg";
const IMAGE_B: &str =
    "https://pixabay.com/static/uploads/photo/2015/01/20/13/13/ipad-605439_960_720.jpg";
const RANDOM_IMAGES: [&str; 4] = [
    "https://pixabay.com/static/uploads/photo/2015/08/07/00/41/lg-878843_960_720.jpg",
    "https://pixabay.com/static/uploads/photo/2015/11/28/21/47/iphone-1067983_960_720.jpg",
    "https://pixabay.com/static/uploads/photo/2014/09/26/22/53/tablet-462950_960_720.png",
    "https://pixabay.com/static/uploads/photo/2015/08/07/00/41/lg-878845_960_720.jpg",
];

/// Configuration shared by the [`WorkerEngine`](crate::WorkerEngine), its
/// timer and the [`Supervisor`](crate::Supervisor).
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to
/// avoid sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Artificial delay inside the canonical download task, between the
    /// "executing" feedback and the fetch. Step ordering does not depend on it.
    pub pacing_delay: Duration,

    /// Delay used by `start_message_delay()`.
    pub notice_delay: Duration,
    /// Text used by `start_message_delay()`.
    pub notice_text: String,

    /// Offset from "now" used by `toast_at_time()`.
    pub toast_offset: Duration,
    /// Text used by `toast_at_time()`.
    pub toast_text: String,

    /// Total countdown used by `start_default_timer()`.
    pub timer_total: Duration,
    /// Tick interval used by `start_default_timer()`.
    pub timer_interval: Duration,

    /// Image fetched by the canonical immediate task.
    pub task_image_url: String,
    /// Image fetched by `download_with_message()`.
    pub message_image_url: String,
    /// Candidate set for `download_random_with_message()`.
    pub random_image_urls: Vec<String>,

    /// Capacity of the event bus ring buffer (min 1; clamped).
    pub bus_capacity: usize,

    /// Name of the consumer thread.
    pub worker_thread_name: String,
    /// Name of every timer thread.
    pub timer_thread_name: String,

    /// Per-request timeout of the HTTP fetcher.
    pub fetch_timeout: Duration,
}

impl WorkerConfig {
    /// Returns the pacing delay as an `Option`.
    ///
    /// - `None` → fetch immediately
    /// - `Some(d)` → sleep `d` on the consumer thread first
    #[inline]
    pub fn pacing(&self) -> Option<Duration> {
        if self.pacing_delay == Duration::ZERO {
            None
        } else {
            Some(self.pacing_delay)
        }
    }

    /// Returns the HTTP fetch timeout as an `Option`.
    #[inline]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        if self.fetch_timeout == Duration::ZERO {
            None
        } else {
            Some(self.fetch_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for WorkerConfig {
    /// Default configuration:
    ///
    /// - `pacing_delay = 2s`
    /// - `notice_delay = 5s`, `toast_offset = 5s`
    /// - `timer_total = 10s`, `timer_interval = 1s`
    /// - `bus_capacity = 1024`
    /// - `fetch_timeout = 30s`
    fn default() -> Self {
        Self {
            pacing_delay: Duration::from_secs(2),
            notice_delay: Duration::from_secs(5),
            notice_text: "Hello from WorkerThread!".to_string(),
            toast_offset: Duration::from_secs(5),
            toast_text: "Toast called using 'postAtTime()'.".to_string(),
            timer_total: Duration::from_secs(10),
            timer_interval: Duration::from_secs(1),
            task_image_url: IMAGE_A.to_string(),
            message_image_url: IMAGE_B.to_string(),
            random_image_urls: RANDOM_IMAGES.iter().map(|u| u.to_string()).collect(),
            bus_capacity: 1024,
            worker_thread_name: "handoff-worker".to_string(),
            timer_thread_name: "handoff-timer".to_string(),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}
