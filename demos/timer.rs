//! # Example: timer
//!
//! A countdown fed through the worker into a presentation-side [`UiState`].
//!
//! ## Flow
//! ```text
//! start_timer(5s, 1s) ──► TimerEngine thread ──► [counter] ──► consumer
//!                                                     └─► ChannelSink ──► UiEvent ──► UiState
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example timer
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use handoff::{
    ChannelSink, FetchError, FetchFn, FetchRef, UiEvent, UiState, WorkerConfig, WorkerEngine,
    labels,
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let fetcher: FetchRef = FetchFn::arc("unused", |url: String| async move {
        Err::<Bytes, _>(FetchError::Other(format!("no network for {url}")))
    });
    let engine = Arc::new(WorkerEngine::new(WorkerConfig::default(), fetcher));
    let (sink, mut rx) = ChannelSink::new();
    engine.attach(Arc::new(sink));
    engine.start()?;

    engine.start_timer(Duration::from_secs(5), Duration::from_secs(1))?;

    // Presentation loop: fold deliveries into state, print what changed.
    let mut ui = UiState::default();
    while let Some(ev) = rx.recv().await {
        let finished = matches!(&ev, UiEvent::Text(t) if t == labels::TIMER_DONE);
        ui.apply(ev);
        println!(
            "{:<20} busy={}",
            ui.feedback.as_deref().unwrap_or_default(),
            ui.busy
        );
        if finished {
            break;
        }
    }
    // The busy=false that follows "Timer is done!".
    if let Some(ev) = rx.recv().await {
        ui.apply(ev);
    }
    println!("final: {:?}, busy={}", ui.feedback, ui.busy);

    engine.shutdown();
    let report = tokio::task::spawn_blocking(move || engine.join()).await?;
    println!("worker stopped: {report:?}");
    Ok(())
}
