//! # Retention across consumer recreation.
//!
//! A [`RetentionStore`] carries live objects (the engine, small UI state)
//! from a consumer that is being destroyed to the one replacing it. Values are
//! stored as `Arc`s and handed back as the very same allocation.
//!
//! - [`RetentionStore`] - the store contract.
//! - [`MemoryStore`] - in-process implementation.

mod store;

pub use store::{MemoryStore, RetentionStore, RetainedValue};
