use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Type-erased value held by a store.
pub type RetainedValue = Arc<dyn Any + Send + Sync>;

/// Key/value store that survives consumer recreation.
///
/// Implementations must return the identical `Arc` that was put (no copies),
/// so a retained engine keeps its queued work and threads.
pub trait RetentionStore: Send + Sync + 'static {
    /// Stores `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: RetainedValue);

    /// Returns the value under `key`, if any.
    fn get(&self, key: &str) -> Option<RetainedValue>;

    /// Removes and returns the value under `key`.
    fn remove(&self, key: &str) -> Option<RetainedValue>;
}

impl dyn RetentionStore {
    /// Typed [`get`](RetentionStore::get). `None` if absent or of another type.
    pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get(key)?.downcast::<T>().ok()
    }
}

/// In-memory [`RetentionStore`].
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, RetainedValue>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of retained values.
    pub fn len(&self) -> usize {
        self.values.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RetentionStore for MemoryStore {
    fn put(&self, key: &str, value: RetainedValue) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value);
    }

    fn get(&self, key: &str) -> Option<RetainedValue> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn remove(&self, key: &str) -> Option<RetainedValue> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_the_same_allocation() {
        let store: Arc<dyn RetentionStore> = Arc::new(MemoryStore::new());
        let value = Arc::new(String::from("engine"));
        store.put("k", value.clone());

        let back = store.get_as::<String>("k").unwrap();
        assert!(Arc::ptr_eq(&value, &back));
    }

    #[test]
    fn wrong_type_or_missing_key_is_none() {
        let store: Arc<dyn RetentionStore> = Arc::new(MemoryStore::new());
        store.put("n", Arc::new(7_u32));
        assert!(store.get_as::<String>("n").is_none());
        assert!(store.get_as::<u32>("missing").is_none());
    }

    #[test]
    fn remove_takes_the_value_out() {
        let store = MemoryStore::new();
        store.put("k", Arc::new(1_u8));
        assert_eq!(store.len(), 1);
        assert!(store.remove("k").is_some());
        assert!(store.is_empty());
        assert!(store.get("k").is_none());
    }
}
