//! # Fetch collaborators.
//!
//! The engine treats image retrieval as a black box: `fetch(url) -> bytes | error`,
//! single attempt, awaited on the consumer thread.
//!
//! - [`Fetch`] - trait implemented by any fetcher
//! - [`FetchFn`] - closure-backed fetcher (tests, demos, custom transports)
//! - [`FetchRef`] - shared reference to a fetcher (`Arc<dyn Fetch>`)
//! - [`HttpFetcher`] - `reqwest`-backed fetcher (feature `http`)

mod fetch_fn;
mod fetcher;
#[cfg(feature = "http")]
mod http;

pub use fetch_fn::{FetchFn, FetchRef};
pub use fetcher::Fetch;
#[cfg(feature = "http")]
pub use http::HttpFetcher;
