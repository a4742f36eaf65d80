use dashmap::DashSet;

/// Set of keys written through the non-persistent tier.
///
/// The cache consults this set on reads to decide which tier to query,
/// so callers never have to restate where a value was written. It lives for
/// the lifetime of the owning cache and is never persisted.
///
/// Backed by a `DashSet`, so it can be shared between threads without an
/// outer lock.
///
/// # Examples
///
/// ```
/// use cachette_core::NonPersistentKeys;
///
/// let keys = NonPersistentKeys::new();
/// keys.insert("request-scoped");
///
/// assert!(keys.contains("request-scoped"));
/// assert!(!keys.contains("something-else"));
/// assert_eq!(keys.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct NonPersistentKeys {
    keys: DashSet<String>,
}

impl NonPersistentKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `key`, returning `true` if it was not already present.
    pub fn insert(&self, key: &str) -> bool {
        self.keys.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn remove(&self, key: &str) -> bool {
        self.keys.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Snapshot of the recorded keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.keys.iter().map(|k| k.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn clear(&self) {
        self.keys.clear();
    }
}
