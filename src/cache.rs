use std::fmt;
use std::sync::Arc;

use cachette_core::{
    CacheConfig, CacheError, Clock, HashingKeyDeriver, KeyBuilder, KeyDeriver, MemoryBackend,
    MemoryOptionStore, NonPersistentKeys, OptionStore, Result, StorageBackend, SystemClock, Tier,
    TriggerRegistry,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

#[cfg(feature = "stats")]
use cachette_core::{CacheStats, TierStats};

use crate::expiration::Expiration;
use crate::indexed::Indexed;

/// Cache facade over the persistent, non-persistent and transient tiers.
///
/// Every operation takes a raw identifier and an optional trigger name (an
/// empty string meaning "no trigger"). The identifier and the trigger's last
/// occurrence are turned into a storage key by the [`KeyBuilder`], then the
/// request is routed to a tier:
///
/// - [`set`](Self::set) with [`Expiration::NonPersistent`] writes to the
///   non-persistent tier and remembers the derived key; any other expiration
///   writes to the persistent tier.
/// - [`get`](Self::get) reads from the non-persistent tier when the raw
///   identifier was remembered, from the persistent tier otherwise.
/// - [`delete`](Self::delete) always targets the persistent tier.
/// - The `*_transient` operations use the transient tier and never touch the
///   non-persistent bookkeeping.
///
/// Recording a new trigger occurrence changes every key derived with that
/// trigger, so earlier entries are shadowed rather than evicted.
///
/// # Thread Safety
///
/// `Cache` is `Send + Sync`. Backends are shared through `Arc` and must be
/// safe for concurrent use; the non-persistent key set is a concurrent set.
/// The facade itself takes no locks, so concurrent writes to the same key
/// resolve as last-writer-wins in the backend.
///
/// # Examples
///
/// ```
/// use cachette::{Cache, Expiration};
///
/// let cache = Cache::builder().in_memory().build().unwrap();
///
/// cache.set("upcoming", &vec![1, 2, 3], Expiration::After(300), "save_post").unwrap();
/// let ids: Option<Vec<u32>> = cache.get("upcoming", "save_post").unwrap();
/// assert_eq!(ids, Some(vec![1, 2, 3]));
///
/// // The trigger fires: every key derived with it is now stale
/// cache.set_last_occurrence("save_post", Some(u64::MAX / 2)).unwrap();
/// let ids: Option<Vec<u32>> = cache.get("upcoming", "save_post").unwrap();
/// assert_eq!(ids, None);
/// ```
pub struct Cache {
    keys: KeyBuilder,
    persistent: Arc<dyn StorageBackend>,
    non_persistent: Arc<dyn StorageBackend>,
    transient: Arc<dyn StorageBackend>,
    non_persistent_keys: Arc<NonPersistentKeys>,
    config: CacheConfig,
    #[cfg(feature = "stats")]
    stats: TierStats,
}

impl Cache {
    pub fn builder() -> CacheBuilder {
        CacheBuilder::new()
    }

    /// Stores `value` under `id`.
    ///
    /// With [`Expiration::NonPersistent`] the value goes to the
    /// non-persistent tier with a one second TTL and the derived key is
    /// remembered; otherwise it goes to the persistent tier with the given
    /// TTL (`Never` meaning no expiration).
    pub fn set<V>(
        &self,
        id: &str,
        value: &V,
        expiration: impl Into<Expiration>,
        trigger: &str,
    ) -> Result<bool>
    where
        V: Serialize + ?Sized,
    {
        let expiration = expiration.into();
        let key = self.keys.derive_key(id, trigger)?;
        let value = serde_json::to_value(value)?;

        if expiration.is_non_persistent() {
            // Only route reads to the tier once it actually holds the value
            let stored = self.write(Tier::NonPersistent, &key, value, expiration.ttl_secs())?;
            self.non_persistent_keys.insert(&key);
            Ok(stored)
        } else {
            self.write(Tier::Persistent, &key, value, expiration.ttl_secs())
        }
    }

    /// Reads the value stored under `id`.
    ///
    /// The tier is picked by whether the raw `id` was written as
    /// non-persistent. Returns `Ok(None)` when nothing (live) is stored.
    pub fn get<V>(&self, id: &str, trigger: &str) -> Result<Option<V>>
    where
        V: DeserializeOwned,
    {
        let tier = self.tier_for(id);
        let key = self.keys.derive_key(id, trigger)?;
        self.read(tier, &key)
    }

    /// Deletes `id` from the persistent tier.
    ///
    /// The non-persistent tier is not consulted, so a value written with
    /// [`Expiration::NonPersistent`] survives this call until its TTL lapses.
    pub fn delete(&self, id: &str, trigger: &str) -> Result<bool> {
        let key = self.keys.derive_key(id, trigger)?;
        self.remove(Tier::Persistent, &key)
    }

    /// Stores `value` under `id` in the transient tier. `ttl_secs == 0` means
    /// no expiration.
    pub fn set_transient<V>(
        &self,
        id: &str,
        value: &V,
        ttl_secs: u64,
        trigger: &str,
    ) -> Result<bool>
    where
        V: Serialize + ?Sized,
    {
        let key = self.keys.derive_key(id, trigger)?;
        let value = serde_json::to_value(value)?;
        self.write(Tier::Transient, &key, value, ttl_secs)
    }

    pub fn get_transient<V>(&self, id: &str, trigger: &str) -> Result<Option<V>>
    where
        V: DeserializeOwned,
    {
        let key = self.keys.derive_key(id, trigger)?;
        self.read(Tier::Transient, &key)
    }

    pub fn delete_transient(&self, id: &str, trigger: &str) -> Result<bool> {
        let key = self.keys.derive_key(id, trigger)?;
        self.remove(Tier::Transient, &key)
    }

    /// Derives the storage key for `id` and `trigger`.
    pub fn derive_key(&self, id: &str, trigger: &str) -> Result<String> {
        self.keys.derive_key(id, trigger)
    }

    /// Builds a key from components and a prefix, see [`KeyBuilder::make_key`].
    pub fn make_key<C>(&self, components: &C, prefix: &str, sort: bool) -> Result<String>
    where
        C: Serialize + ?Sized,
    {
        self.keys.make_key(components, prefix, sort)
    }

    /// Last occurrence of `trigger`, seeded with the current time if unknown.
    pub fn last_occurrence(&self, trigger: &str) -> Result<u64> {
        self.keys.triggers().last_occurrence(trigger)
    }

    /// Records that `trigger` fired; `None` or `Some(0)` means now.
    pub fn set_last_occurrence(&self, trigger: &str, timestamp: Option<u64>) -> Result<()> {
        self.keys.triggers().record_occurrence(trigger, timestamp)
    }

    /// Map-like view using the non-persistent tier for writes.
    pub fn indexed(&self) -> Indexed<'_> {
        Indexed::new(self)
    }

    /// Whether `key` was written through the non-persistent tier.
    pub fn is_non_persistent(&self, key: &str) -> bool {
        self.non_persistent_keys.contains(key)
    }

    pub fn non_persistent_keys(&self) -> &Arc<NonPersistentKeys> {
        &self.non_persistent_keys
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    #[cfg(feature = "stats")]
    pub fn stats(&self, tier: Tier) -> &CacheStats {
        self.stats.tier(tier)
    }

    #[cfg(feature = "stats")]
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    fn tier_for(&self, id: &str) -> Tier {
        if self.non_persistent_keys.contains(id) {
            Tier::NonPersistent
        } else {
            Tier::Persistent
        }
    }

    fn backend(&self, tier: Tier) -> (&dyn StorageBackend, &str) {
        match tier {
            Tier::Persistent => (
                self.persistent.as_ref(),
                self.config.persistent_group.as_str(),
            ),
            Tier::NonPersistent => (
                self.non_persistent.as_ref(),
                self.config.non_persistent_group.as_str(),
            ),
            Tier::Transient => (
                self.transient.as_ref(),
                self.config.transient_group.as_str(),
            ),
        }
    }

    fn write(&self, tier: Tier, key: &str, value: Value, ttl_secs: u64) -> Result<bool> {
        let (backend, group) = self.backend(tier);
        tracing::trace!(%tier, group, key, ttl_secs, "cache write");

        let stored = backend
            .put(group, key, value, ttl_secs)
            .map_err(|e| log_backend_error(tier, backend, e))?;

        #[cfg(feature = "stats")]
        self.stats.tier(tier).record_write();

        Ok(stored)
    }

    fn read<V: DeserializeOwned>(&self, tier: Tier, key: &str) -> Result<Option<V>> {
        let (backend, group) = self.backend(tier);

        let found = backend
            .fetch(group, key)
            .map_err(|e| log_backend_error(tier, backend, e))?;
        tracing::trace!(%tier, group, key, hit = found.is_some(), "cache read");

        #[cfg(feature = "stats")]
        {
            let stats = self.stats.tier(tier);
            if found.is_some() {
                stats.record_hit();
            } else {
                stats.record_miss();
            }
        }

        found
            .map(serde_json::from_value)
            .transpose()
            .map_err(CacheError::from)
    }

    fn remove(&self, tier: Tier, key: &str) -> Result<bool> {
        let (backend, group) = self.backend(tier);
        tracing::trace!(%tier, group, key, "cache delete");

        let removed = backend
            .remove(group, key)
            .map_err(|e| log_backend_error(tier, backend, e))?;

        #[cfg(feature = "stats")]
        {
            if removed {
                self.stats.tier(tier).record_delete();
            }
        }

        Ok(removed)
    }
}

fn log_backend_error(tier: Tier, backend: &dyn StorageBackend, error: CacheError) -> CacheError {
    tracing::warn!(%tier, backend = backend.name(), %error, "cache backend failed");
    error
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("persistent", &self.persistent.name())
            .field("non_persistent", &self.non_persistent.name())
            .field("transient", &self.transient.name())
            .field("non_persistent_keys", &self.non_persistent_keys.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Assembles a [`Cache`] from its collaborators.
///
/// The persistent backend, transient backend and option store are required;
/// [`build`](Self::build) fails with [`CacheError::MissingBackend`] if any is
/// absent and with [`CacheError::InvalidConfig`] if the configuration is
/// rejected, so misconfiguration surfaces before the first cache call.
///
/// Everything else has a default:
///
/// * non-persistent backend - a fresh [`MemoryBackend`] on the cache's clock
/// * non-persistent key set - a fresh, empty [`NonPersistentKeys`]
/// * key deriver - [`HashingKeyDeriver`] bounded by `max_key_length`
/// * clock - [`SystemClock`]
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cachette::{Cache, CacheConfig, CacheError, MemoryBackend, MemoryOptionStore};
///
/// // Missing collaborators are reported at build time
/// let err = Cache::builder().build().unwrap_err();
/// assert!(matches!(err, CacheError::MissingBackend("persistent")));
///
/// let cache = Cache::builder()
///     .config(CacheConfig { persistent_group: "events".into(), ..CacheConfig::default() })
///     .persistent(Arc::new(MemoryBackend::new()))
///     .transient(Arc::new(MemoryBackend::new()))
///     .options(Arc::new(MemoryOptionStore::new()))
///     .build()
///     .unwrap();
/// assert_eq!(cache.config().persistent_group, "events");
/// ```
#[derive(Default)]
pub struct CacheBuilder {
    config: CacheConfig,
    persistent: Option<Arc<dyn StorageBackend>>,
    non_persistent: Option<Arc<dyn StorageBackend>>,
    transient: Option<Arc<dyn StorageBackend>>,
    options: Option<Arc<dyn OptionStore>>,
    clock: Option<Arc<dyn Clock>>,
    deriver: Option<Arc<dyn KeyDeriver>>,
    non_persistent_keys: Option<Arc<NonPersistentKeys>>,
    in_memory: bool,
}

impl CacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn persistent(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.persistent = Some(backend);
        self
    }

    pub fn non_persistent(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.non_persistent = Some(backend);
        self
    }

    pub fn transient(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.transient = Some(backend);
        self
    }

    /// Store holding trigger timestamps.
    pub fn options(mut self, options: Arc<dyn OptionStore>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn key_deriver(mut self, deriver: Arc<dyn KeyDeriver>) -> Self {
        self.deriver = Some(deriver);
        self
    }

    pub fn non_persistent_keys(mut self, keys: Arc<NonPersistentKeys>) -> Self {
        self.non_persistent_keys = Some(keys);
        self
    }

    /// Fills every tier and the option store left unset at [`build`](Self::build)
    /// time with in-process implementations. Nothing survives the process;
    /// meant for tests and single-process hosts.
    ///
    /// The in-process backends use the builder's final clock, so this can be
    /// called before or after [`clock`](Self::clock).
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    pub fn build(self) -> Result<Cache> {
        self.config.validate()?;

        let clock = self.clock_or_default();
        let mut persistent = self.persistent;
        let mut transient = self.transient;
        let mut options = self.options;
        if self.in_memory {
            if persistent.is_none() {
                persistent = Some(Arc::new(MemoryBackend::with_clock(clock.clone())));
            }
            if transient.is_none() {
                transient = Some(Arc::new(MemoryBackend::with_clock(clock.clone())));
            }
            if options.is_none() {
                options = Some(Arc::new(MemoryOptionStore::new()));
            }
        }

        let persistent = persistent.ok_or(CacheError::MissingBackend("persistent"))?;
        let transient = transient.ok_or(CacheError::MissingBackend("transient"))?;
        let options = options.ok_or(CacheError::MissingBackend("options"))?;
        let non_persistent: Arc<dyn StorageBackend> = match self.non_persistent {
            Some(backend) => backend,
            None => Arc::new(MemoryBackend::with_clock(clock.clone())),
        };
        let deriver: Arc<dyn KeyDeriver> = match self.deriver {
            Some(deriver) => deriver,
            None => Arc::new(HashingKeyDeriver::new(self.config.max_key_length)),
        };

        let triggers =
            TriggerRegistry::new(options, clock, self.config.trigger_option_prefix.clone());

        tracing::debug!(
            persistent = persistent.name(),
            non_persistent = non_persistent.name(),
            transient = transient.name(),
            "cache built"
        );

        Ok(Cache {
            keys: KeyBuilder::new(deriver, triggers),
            persistent,
            non_persistent,
            transient,
            non_persistent_keys: self.non_persistent_keys.unwrap_or_default(),
            config: self.config,
            #[cfg(feature = "stats")]
            stats: TierStats::new(),
        })
    }

    fn clock_or_default(&self) -> Arc<dyn Clock> {
        self.clock
            .clone()
            .unwrap_or_else(|| Arc::new(SystemClock))
    }
}
