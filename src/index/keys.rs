//! Per-index keyed side storage.
//!
//! Values are type-erased and released through their own `Drop` when removed
//! or when the index is dropped.

use std::any::Any;

use ahash::AHashMap;

type Entry = Box<dyn Any + Send + Sync>;

/// Keyed side table owned by an index.
#[derive(Default)]
pub struct KeysDict {
    entries: AHashMap<String, Entry>,
}

impl std::fmt::Debug for KeysDict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeysDict")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl KeysDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, returning whether a previous value was replaced.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: &str, value: T) -> bool {
        self.entries.insert(key.to_string(), Box::new(value)).is_some()
    }

    /// Borrow the value under `key` if it has type `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Release every stored value.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
