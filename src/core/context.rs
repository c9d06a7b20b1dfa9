//! # WorkContext: what a unit of work can reach.
//!
//! Every task and sub-handler runs with a [`WorkContext`]. It is cheap to clone
//! and only ever used on the consumer thread.

use std::sync::Arc;

use tracing::warn;

use crate::config::WorkerConfig;
use crate::events::Bus;
use crate::fetch::FetchRef;
use crate::labels;
use crate::sink::Courier;

/// Handles available to posted tasks.
#[derive(Clone)]
pub struct WorkContext {
    courier: Courier,
    fetcher: FetchRef,
    config: Arc<WorkerConfig>,
    bus: Bus,
}

impl WorkContext {
    pub(crate) fn new(
        courier: Courier,
        fetcher: FetchRef,
        config: Arc<WorkerConfig>,
        bus: Bus,
    ) -> Self {
        Self {
            courier,
            fetcher,
            config,
            bus,
        }
    }

    /// Delivers results to whatever sink is attached right now.
    pub fn courier(&self) -> &Courier {
        &self.courier
    }

    /// The engine's fetch collaborator.
    pub fn fetcher(&self) -> &FetchRef {
        &self.fetcher
    }

    /// Engine configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Engine event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Fetches `url` once and delivers the outcome.
    ///
    /// Success delivers the image followed by [`labels::IMAGE_DOWNLOADED`];
    /// failure delivers [`labels::DOWNLOAD_ERROR`] only. Returns whether the
    /// fetch succeeded.
    pub async fn download_image(&self, url: &str) -> bool {
        match self.fetcher.fetch(url).await {
            Ok(image) => {
                self.courier.image(image);
                self.courier.text(labels::IMAGE_DOWNLOADED);
                true
            }
            Err(e) => {
                warn!(
                    url,
                    fetcher = self.fetcher.name(),
                    error = %e,
                    label = e.as_label(),
                    "fetch failed"
                );
                self.courier.text(labels::DOWNLOAD_ERROR);
                false
            }
        }
    }
}
