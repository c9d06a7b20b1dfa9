//! # Single-threaded execution contexts.
//!
//! Both the worker consumer and every timer run on a dedicated OS thread that
//! drives a current-thread tokio runtime. Nothing scheduled on such a context
//! ever runs on another thread.
//!
//! ```text
//! spawn_context(name, make)
//!   ├─► Builder::new_current_thread().enable_all().build()   (caller thread; errors surface here)
//!   └─► thread::Builder::new().name(name).spawn(move || rt.block_on(make().await))
//! ```

use std::future::Future;
use std::thread::{self, JoinHandle};

use tokio::runtime::Builder;

use crate::error::EngineError;

/// Spawns a named thread running `make()` to completion on its own runtime.
///
/// The future is created on the new thread, inside the runtime, so it does
/// not need to be `Send`.
pub(crate) fn spawn_context<F, Fut, T>(name: &str, make: F) -> Result<JoinHandle<T>, EngineError>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = T> + 'static,
    T: Send + 'static,
{
    let runtime = Builder::new_current_thread().enable_all().build()?;
    let join = thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || runtime.block_on(async move { make().await }))?;
    Ok(join)
}
