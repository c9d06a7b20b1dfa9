//! Texts and operation labels delivered to the sink.
//!
//! Kept in one place so presentation code and tests can match on them.

/// Feedback while an image download runs.
pub const EXECUTING: &str = "Executing operation...";
/// Feedback while a randomly picked image download runs.
pub const EXECUTING_RANDOM: &str = "Executing random download";
/// Feedback after a successful fetch.
pub const IMAGE_DOWNLOADED: &str = "Image downloaded";
/// Feedback after a failed fetch.
pub const DOWNLOAD_ERROR: &str = "Error downloading image";

/// Operation label when the canonical download task starts.
pub const TASK_STARTED: &str = "Downloading image with Runnable";
/// Operation label when the canonical download task ends.
pub const TASK_ENDED: &str = "Runnable operation ended";
/// Operation label delivered by the caller when an image message is posted.
pub const MESSAGE_SENT: &str = "Sending Message...";
/// Operation label after an image message was handled.
pub const MESSAGE_HANDLED: &str = "Message handled";

/// Prefix of the countdown feedback; followed by whole seconds.
pub const TIME_REMAINING: &str = "Time remaining: ";
/// Feedback once the countdown completes.
pub const TIMER_DONE: &str = "Timer is done!";

/// Countdown feedback for `secs` whole seconds left.
pub fn time_remaining(secs: u64) -> String {
    format!("{TIME_REMAINING}{secs}")
}
