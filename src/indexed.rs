use cachette_core::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::Cache;
use crate::expiration::Expiration;

/// Map-like access to a [`Cache`], without triggers.
///
/// Writes always go to the non-persistent tier, so values set through this
/// view live only as long as the process (and their one second TTL).
///
/// | Operation | Equivalent |
/// |-----------|------------|
/// | `get(id)` | `cache.get(id, "")` |
/// | `set(id, v)` | `cache.set(id, v, Expiration::NonPersistent, "")` |
/// | `unset(id)` | `cache.delete(id, "")` |
/// | `exists(id)` | `cache.is_non_persistent(id)` |
///
/// `exists` only consults the non-persistent key registry: it reports `true`
/// for an entry whose TTL already lapsed, and `false` for a value that is
/// present in the persistent tier but was never written through this view.
///
/// # Examples
///
/// ```
/// use cachette::Cache;
///
/// let cache = Cache::builder().in_memory().build().unwrap();
/// let map = cache.indexed();
///
/// map.set("current_user", &7u64).unwrap();
/// assert!(map.exists("current_user"));
/// assert_eq!(map.get::<u64>("current_user").unwrap(), Some(7));
///
/// // Persistent values are readable but not reported by `exists`
/// cache.set("site_name", "Docs", 0, "").unwrap();
/// assert!(!map.exists("site_name"));
/// assert_eq!(map.get::<String>("site_name").unwrap().as_deref(), Some("Docs"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Indexed<'a> {
    cache: &'a Cache,
}

impl<'a> Indexed<'a> {
    pub(crate) fn new(cache: &'a Cache) -> Self {
        Self { cache }
    }

    pub fn get<V: DeserializeOwned>(&self, id: &str) -> Result<Option<V>> {
        self.cache.get(id, "")
    }

    pub fn set<V: Serialize + ?Sized>(&self, id: &str, value: &V) -> Result<bool> {
        self.cache.set(id, value, Expiration::NonPersistent, "")
    }

    /// Deletes `id` from the persistent tier; see [`Cache::delete`].
    pub fn unset(&self, id: &str) -> Result<bool> {
        self.cache.delete(id, "")
    }

    pub fn exists(&self, id: &str) -> bool {
        self.cache.is_non_persistent(id)
    }
}
