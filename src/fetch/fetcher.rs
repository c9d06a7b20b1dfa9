//! # Fetch abstraction.
//!
//! A [`Fetch`] implementation turns a url into bytes in a single attempt. It
//! is awaited from the consumer thread, so a slow fetch delays only this
//! worker's own queue.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;

/// # Single-attempt byte fetcher.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use bytes::Bytes;
/// use handoff::{Fetch, FetchError};
///
/// struct Fixed;
///
/// #[async_trait]
/// impl Fetch for Fixed {
///     async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
///         if url.is_empty() {
///             return Err(FetchError::Other("empty url".into()));
///         }
///         Ok(Bytes::from_static(b"\x89PNG\r\n\x1a\n"))
///     }
/// }
/// ```
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    /// Retrieves the resource at `url`. No retries.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
