//! # Function-backed fetcher (`FetchFn`)
//!
//! [`FetchFn`] wraps a closure `F: Fn(String) -> Fut`, producing a fresh
//! future per fetch. If the closure needs shared state (counters, fixtures),
//! capture an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use bytes::Bytes;
//! use handoff::{FetchError, FetchFn, FetchRef};
//!
//! let f: FetchRef = FetchFn::arc("fixture", |url: String| async move {
//!     if url.ends_with(".png") {
//!         Ok(Bytes::from_static(b"\x89PNG\r\n\x1a\n"))
//!     } else {
//!         Err(FetchError::NotAnImage { url })
//!     }
//! });
//!
//! assert_eq!(f.name(), "fixture");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;
use crate::fetch::Fetch;

/// Shared handle to a fetcher.
pub type FetchRef = Arc<dyn Fetch>;

/// Function-backed fetcher.
#[derive(Debug)]
pub struct FetchFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> FetchFn<F> {
    /// Creates a new function-backed fetcher.
    ///
    /// Prefer [`FetchFn::arc`] when you immediately need a [`FetchRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the fetcher and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Fetch for FetchFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Bytes, FetchError>> + Send + 'static,
{
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        (self.f)(url.to_owned()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
