use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::CacheEntry;

/// The storage tiers a cache routes to.
///
/// * `Persistent` - Durable store with per-entry TTL, survives restarts
/// * `NonPersistent` - Process-lifetime store; a TTL of 0 is stored as 1
/// * `Transient` - Durable store in its own namespace, TTL passed through as given
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    Persistent,
    NonPersistent,
    Transient,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Persistent, Tier::NonPersistent, Tier::Transient];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Persistent => "persistent",
            Tier::NonPersistent => "non-persistent",
            Tier::Transient => "transient",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A keyed store with per-entry TTL, namespaced by group.
///
/// Implementations wrap whatever actually holds the data (an in-process map,
/// a networked key-value service, ...). Failures to reach the store are
/// reported as [`CacheError::StorageUnavailable`](crate::CacheError::StorageUnavailable);
/// a missing key is `Ok(None)`.
///
/// # TTL
///
/// `ttl_secs == 0` means the entry never expires.
pub trait StorageBackend: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Stores `value` under `key`, replacing any previous entry.
    fn put(&self, group: &str, key: &str, value: Value, ttl_secs: u64) -> Result<bool>;

    /// Returns the live value under `key`, or `None` if absent or expired.
    fn fetch(&self, group: &str, key: &str) -> Result<Option<Value>>;

    /// Removes `key`, returning whether an entry was present.
    fn remove(&self, group: &str, key: &str) -> Result<bool>;
}

/// Durable scalar option storage, used for trigger timestamps.
pub trait OptionStore: Send + Sync {
    fn get_option(&self, name: &str) -> Result<Option<Value>>;

    fn set_option(&self, name: &str, value: Value) -> Result<()>;
}

/// In-process [`StorageBackend`] backed by a `RwLock`-protected map.
///
/// Used as the default non-persistent tier, and as a stand-in for durable
/// stores in tests. Expired entries are dropped when fetched, and every group
/// is swept at most once per clock second on the write path. A full sweep can
/// also be forced with [`purge_expired`](Self::purge_expired).
///
/// # Thread Safety
///
/// Reads take a shared `parking_lot::RwLock` guard, so concurrent fetches of
/// live entries never block each other. Writes and expiry removal take the
/// exclusive guard.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cachette_core::{MemoryBackend, MockClock, StorageBackend};
/// use serde_json::json;
///
/// let clock = Arc::new(MockClock::new(0));
/// let backend = MemoryBackend::with_clock(clock.clone());
///
/// backend.put("cache", "answer", json!(42), 10).unwrap();
/// assert_eq!(backend.fetch("cache", "answer").unwrap(), Some(json!(42)));
///
/// clock.advance(10);
/// assert_eq!(backend.fetch("cache", "answer").unwrap(), Some(json!(42)));
///
/// clock.advance(1);
/// assert_eq!(backend.fetch("cache", "answer").unwrap(), None);
/// ```
pub struct MemoryBackend {
    groups: RwLock<Groups>,
    clock: Arc<dyn Clock>,
    last_sweep: AtomicU64,
}

type Groups = HashMap<String, HashMap<String, CacheEntry>>;

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            groups: RwLock::new(HashMap::new()),
            clock,
            last_sweep: AtomicU64::new(now),
        }
    }

    /// Returns the raw entry under `key`, expired or not.
    pub fn entry(&self, group: &str, key: &str) -> Option<CacheEntry> {
        self.groups.read().get(group)?.get(key).cloned()
    }

    /// Number of live entries across all groups.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.groups
            .read()
            .values()
            .flat_map(|entries| entries.values())
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every expired entry, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut groups = self.groups.write();
        self.last_sweep.fetch_max(now, Ordering::Relaxed);
        sweep(&mut groups, now)
    }

    pub fn clear(&self) {
        self.groups.write().clear();
    }
}

fn sweep(groups: &mut Groups, now: u64) -> usize {
    let mut purged = 0;
    for entries in groups.values_mut() {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        purged += before - entries.len();
    }
    groups.retain(|_, entries| !entries.is_empty());

    if purged > 0 {
        tracing::debug!(purged, "purged expired entries");
    }
    purged
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("groups", &self.groups.read().len())
            .finish()
    }
}

impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn put(&self, group: &str, key: &str, value: Value, ttl_secs: u64) -> Result<bool> {
        let now = self.clock.now();
        let mut groups = self.groups.write();

        // Nothing can have expired since the last sweep within the same second
        if self.last_sweep.fetch_max(now, Ordering::Relaxed) < now {
            sweep(&mut groups, now);
        }

        groups
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), CacheEntry::new(value, now, ttl_secs));
        Ok(true)
    }

    fn fetch(&self, group: &str, key: &str) -> Result<Option<Value>> {
        let now = self.clock.now();
        let mut expired = false;

        // Shared guard for the common hit/miss path
        {
            let groups = self.groups.read();
            if let Some(entry) = groups.get(group).and_then(|entries| entries.get(key)) {
                if entry.is_expired(now) {
                    expired = true;
                } else {
                    return Ok(Some(entry.value.clone()));
                }
            }
        }

        if expired {
            let mut groups = self.groups.write();
            if let Some(entries) = groups.get_mut(group) {
                // Re-check: another writer may have refreshed the entry meanwhile
                if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
                    entries.remove(key);
                    tracing::trace!(group, key, "dropped expired entry");
                } else if let Some(entry) = entries.get(key) {
                    return Ok(Some(entry.value.clone()));
                }
            }
        }

        Ok(None)
    }

    fn remove(&self, group: &str, key: &str) -> Result<bool> {
        let mut groups = self.groups.write();
        Ok(groups
            .get_mut(group)
            .and_then(|entries| entries.remove(key))
            .is_some())
    }
}

/// In-process [`OptionStore`].
#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    options: RwLock<HashMap<String, Value>>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionStore for MemoryOptionStore {
    fn get_option(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.options.read().get(name).cloned())
    }

    fn set_option(&self, name: &str, value: Value) -> Result<()> {
        self.options.write().insert(name.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use serde_json::json;
    use std::thread;

    fn backend() -> (MemoryBackend, Arc<MockClock>) {
        let clock = Arc::new(MockClock::new(1_000));
        (MemoryBackend::with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_put_fetch() {
        let (backend, _) = backend();
        backend.put("g", "key1", json!(100), 0).unwrap();
        assert_eq!(backend.fetch("g", "key1").unwrap(), Some(json!(100)));
    }

    #[test]
    fn test_missing_key() {
        let (backend, _) = backend();
        assert_eq!(backend.fetch("g", "nonexistent").unwrap(), None);
    }

    #[test]
    fn test_stored_null_is_not_absent() {
        let (backend, _) = backend();
        backend.put("g", "nothing", Value::Null, 0).unwrap();
        assert_eq!(backend.fetch("g", "nothing").unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_update_existing() {
        let (backend, _) = backend();
        backend.put("g", "key", json!(1), 0).unwrap();
        backend.put("g", "key", json!(2), 0).unwrap();
        assert_eq!(backend.fetch("g", "key").unwrap(), Some(json!(2)));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_groups_are_isolated() {
        let (backend, _) = backend();
        backend.put("a", "key", json!("in a"), 0).unwrap();
        assert_eq!(backend.fetch("b", "key").unwrap(), None);
        assert!(!backend.remove("b", "key").unwrap());
        assert!(backend.remove("a", "key").unwrap());
        assert_eq!(backend.fetch("a", "key").unwrap(), None);
    }

    #[test]
    fn test_ttl_expiration() {
        let (backend, clock) = backend();
        backend.put("g", "temp", json!("data"), 5).unwrap();

        clock.advance(5);
        assert_eq!(backend.fetch("g", "temp").unwrap(), Some(json!("data")));

        clock.advance(1);
        assert_eq!(backend.fetch("g", "temp").unwrap(), None);
        // Expired entry is dropped on fetch
        assert!(backend.entry("g", "temp").is_none());
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let (backend, clock) = backend();
        backend.put("g", "forever", json!(1), 0).unwrap();
        clock.advance(10_000_000);
        assert_eq!(backend.fetch("g", "forever").unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_purge_expired() {
        let (backend, clock) = backend();
        backend.put("g", "short", json!(1), 1).unwrap();
        backend.put("g", "long", json!(2), 100).unwrap();
        backend.put("h", "short", json!(3), 1).unwrap();

        clock.advance(2);
        assert_eq!(backend.len(), 1);
        assert_eq!(backend.purge_expired(), 2);
        assert_eq!(backend.fetch("g", "long").unwrap(), Some(json!(2)));
        assert!(backend.entry("h", "short").is_none());
    }

    #[test]
    fn test_writes_sweep_expired_entries() {
        let (backend, clock) = backend();
        for i in 0..1000 {
            backend.put("scratch", &format!("req-{i}"), json!(i), 1).unwrap();
        }
        backend.put("cache", "durable", json!("kept"), 0).unwrap();

        clock.advance(3600);
        for i in 0..10 {
            backend.put("scratch", &format!("later-{i}"), json!(i), 1).unwrap();
        }

        assert!(backend.entry("scratch", "req-0").is_none());
        assert!(backend.entry("scratch", "req-999").is_none());
        assert!(backend.entry("cache", "durable").is_some());
        assert_eq!(backend.len(), 11);
        // Already swept, nothing left for an explicit purge
        assert_eq!(backend.purge_expired(), 0);
    }

    #[test]
    fn test_writes_within_same_second_keep_unexpired_entries() {
        let (backend, clock) = backend();
        backend.put("g", "a", json!(1), 1).unwrap();
        clock.advance(1);
        backend.put("g", "b", json!(2), 1).unwrap();
        assert!(backend.entry("g", "a").is_some());
    }

    #[test]
    fn test_thread_safety() {
        let backend = Arc::new(MemoryBackend::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let backend = Arc::clone(&backend);
                thread::spawn(move || {
                    for j in 0..50 {
                        let key = format!("k{i}-{j}");
                        backend.put("g", &key, json!(j), 0).unwrap();
                        assert_eq!(backend.fetch("g", &key).unwrap(), Some(json!(j)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(backend.len(), 400);
    }

    #[test]
    fn test_option_store_roundtrip() {
        let options = MemoryOptionStore::new();
        assert_eq!(options.get_option("last_save_post").unwrap(), None);
        options.set_option("last_save_post", json!(1000)).unwrap();
        assert_eq!(
            options.get_option("last_save_post").unwrap(),
            Some(json!(1000))
        );
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(Tier::NonPersistent.to_string(), "non-persistent");
        assert_eq!(Tier::ALL.len(), 3);
    }
}
