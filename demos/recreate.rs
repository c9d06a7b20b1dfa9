//! # Example: recreate
//!
//! One engine surviving a consumer recreation cycle.
//!
//! Demonstrates how to:
//! - Own the engine through a [`Supervisor`] backed by a [`MemoryStore`].
//! - Keep queued work running while no sink is attached.
//! - Re-attach a new sink and receive the remaining deliveries.
//!
//! ## Flow
//! ```text
//! Supervisor A ──► on_create(LogSink) ──► engine().start()
//!     ├─► download_with_task()      (2s pacing, then fetch)
//!     ├─► start_timer(4s, 1s)
//!     ├─► start_message_delay()      (notice in 5s)
//!     ├─► on_stop(ui) + on_destroy(true)
//!     │        └─► deliveries now skipped: WARN no sink attached
//! Supervisor B ──► on_create(LogSink) ──► same engine, sink re-attached
//!     └─► on_destroy(false) ──► shutdown ──► join() ──► ShutdownReport
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info,handoff=debug cargo run --example recreate --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use handoff::{
    FetchError, FetchFn, FetchRef, LogSink, MemoryStore, RetentionStore, Supervisor, UiState,
    WorkerConfig,
};
use tracing_subscriber::EnvFilter;

const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 1. Offline fetcher: every url "downloads" after a short wait
    let fetcher: FetchRef = FetchFn::arc("offline", |url: String| async move {
        tracing::info!(%url, "pretend download");
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok::<_, FetchError>(Bytes::from_static(FAKE_PNG))
    });

    let config = WorkerConfig {
        timer_total: Duration::from_secs(4),
        ..WorkerConfig::default()
    };
    let store: Arc<dyn RetentionStore> = Arc::new(MemoryStore::new());

    // 2. First consumer: create the engine and queue some work
    let first = Supervisor::new(config.clone(), Arc::clone(&store), Arc::clone(&fetcher));
    first.on_create(Arc::new(LogSink::new()));
    let engine = first.engine()?;
    engine.download_with_task()?;
    engine.start_default_timer()?;
    engine.start_message_delay()?;

    tokio::time::sleep(Duration::from_millis(1500)).await;

    // 3. Recreation: the consumer goes away, the engine stays
    first.on_stop(&UiState::default());
    first.on_destroy(true);
    drop(first);
    tokio::time::sleep(Duration::from_millis(1200)).await;

    // 4. Second consumer picks up the very same engine
    let second = Supervisor::new(config, Arc::clone(&store), fetcher);
    second.on_create(Arc::new(LogSink::new()));
    assert!(Arc::ptr_eq(&engine, &second.engine()?));
    tokio::time::sleep(Duration::from_secs(4)).await;

    // 5. Final destroy
    second.on_destroy(false);
    let report = tokio::task::spawn_blocking(move || engine.join()).await?;
    println!("worker stopped: {report:?}");
    Ok(())
}
