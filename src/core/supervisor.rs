//! # Supervisor: keeps one engine alive across consumer recreation.
//!
//! A [`Supervisor`] plays the part of the presentation owner's lifecycle. One
//! supervisor lives as long as one consumer; the engine outlives it through a
//! shared [`RetentionStore`].
//!
//! ## Recreation cycle
//! ```text
//! consumer A                                    consumer B
//!   on_create(sink A) ─► engine() ─► post ...
//!   on_stop(&ui)  ─► store.put("worker-engine", engine)
//!                    store.put("ui-state", ui.retained())
//!   on_destroy(true) ─► engine.detach()         (queued work keeps running)
//!                                               on_create(sink B)
//!                                                 ├─► store.get("worker-engine") ─► attach(sink B)
//!                                                 └─► store.get("ui-state")       ─► returned UiState
//!                                               ...
//!                                               on_destroy(false) ─► detach, shutdown, forget
//! ```
//!
//! ## Rules
//! - The engine handed to the store is the one handed back (`Arc` identity).
//! - `on_destroy` always detaches; only a final destroy shuts the engine down.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::config::WorkerConfig;
use crate::core::engine::WorkerEngine;
use crate::error::EngineError;
use crate::fetch::FetchRef;
use crate::retention::RetentionStore;
use crate::sink::{ResultSink, UiState};

/// Store key of the retained engine.
pub const ENGINE_KEY: &str = "worker-engine";
/// Store key of the retained [`UiState`].
pub const UI_STATE_KEY: &str = "ui-state";

/// Lifecycle owner of one consumer instance.
pub struct Supervisor {
    config: WorkerConfig,
    store: Arc<dyn RetentionStore>,
    fetcher: FetchRef,
    engine: Mutex<Option<Arc<WorkerEngine>>>,
    sink: Mutex<Option<Arc<dyn ResultSink>>>,
}

impl Supervisor {
    /// Creates a supervisor backed by `store`.
    pub fn new(config: WorkerConfig, store: Arc<dyn RetentionStore>, fetcher: FetchRef) -> Self {
        Self {
            config,
            store,
            fetcher,
            engine: Mutex::new(None),
            sink: Mutex::new(None),
        }
    }

    /// Binds `sink` to this consumer and recovers retained state.
    ///
    /// A retained engine gets `sink` attached right away.
    pub fn on_create(&self, sink: Arc<dyn ResultSink>) -> UiState {
        if let Some(engine) = self.store.get_as::<WorkerEngine>(ENGINE_KEY) {
            engine.attach(Arc::clone(&sink));
            debug!("retained engine recovered");
            *self.engine_slot() = Some(engine);
        }
        *self.sink_slot() = Some(sink);

        self.store
            .get_as::<UiState>(UI_STATE_KEY)
            .map(|ui| (*ui).clone())
            .unwrap_or_default()
    }

    /// Returns the engine, creating, attaching and starting it on first use.
    pub fn engine(&self) -> Result<Arc<WorkerEngine>, EngineError> {
        let mut slot = self.engine_slot();
        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }

        let engine = Arc::new(WorkerEngine::new(self.config.clone(), Arc::clone(&self.fetcher)));
        if let Some(sink) = self.sink_slot().as_ref() {
            engine.attach(Arc::clone(sink));
        }
        engine.start()?;
        info!("engine created");
        *slot = Some(Arc::clone(&engine));
        Ok(engine)
    }

    /// Retains the engine (if any) and the persistent part of `ui`.
    pub fn on_stop(&self, ui: &UiState) {
        if let Some(engine) = self.engine_slot().clone() {
            self.store.put(ENGINE_KEY, engine);
        }
        self.store.put(UI_STATE_KEY, Arc::new(ui.retained()));
    }

    /// Releases this consumer.
    ///
    /// With `changing_configurations` the engine keeps running for the next
    /// consumer; otherwise it is shut down and dropped from the store.
    pub fn on_destroy(&self, changing_configurations: bool) {
        self.sink_slot().take();
        let Some(engine) = self.engine_slot().take() else {
            return;
        };
        engine.detach();

        if changing_configurations {
            debug!("consumer recreating; engine retained");
            return;
        }
        engine.shutdown();
        self.store.remove(ENGINE_KEY);
        self.store.remove(UI_STATE_KEY);
        info!("engine shut down on final destroy");
    }

    fn engine_slot(&self) -> MutexGuard<'_, Option<Arc<WorkerEngine>>> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sink_slot(&self) -> MutexGuard<'_, Option<Arc<dyn ResultSink>>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
