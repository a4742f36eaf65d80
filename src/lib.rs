//! # Cachette
//!
//! A small caching layer with trigger-based invalidation and three storage
//! tiers behind one facade.
//!
//! ## Features
//!
//! - **Trigger invalidation**: Keys embed the last occurrence of a named event,
//!   so firing the event shadows every entry derived before it
//! - **Bounded keys**: Derived keys longer than 40 bytes are replaced by a hash
//! - **Composite keys**: Build one key from many components, optionally
//!   insensitive to ordering
//! - **Three tiers**: Persistent (durable, per-entry TTL), non-persistent
//!   (process lifetime) and transient (durable, separate namespace)
//! - **Pluggable storage**: Any [`StorageBackend`] and [`OptionStore`] can back
//!   the tiers; in-memory implementations are included
//! - **Statistics**: Per-tier hit/miss/write counters with the `stats` feature
//!
//! ## Quick Start
//!
//! ```rust
//! use cachette::{Cache, Expiration, NON_PERSISTENT};
//!
//! let cache = Cache::builder().in_memory().build().unwrap();
//!
//! // Persistent, expires in five minutes
//! cache.set("upcoming_events", &["launch", "meetup"], Expiration::After(300), "").unwrap();
//!
//! // Non-persistent, lives only in this process
//! cache.set("request_user", &42u64, NON_PERSISTENT, "").unwrap();
//! assert_eq!(cache.get::<u64>("request_user", "").unwrap(), Some(42));
//! ```
//!
//! ## Expiration Triggers
//!
//! ```rust
//! use cachette::Cache;
//!
//! let cache = Cache::builder().in_memory().build().unwrap();
//!
//! cache.set_last_occurrence("save_post", Some(1_000)).unwrap();
//! cache.set("events", "cached listing", 0, "save_post").unwrap();
//! assert_eq!(cache.derive_key("events", "save_post").unwrap(), "events1000");
//!
//! // A post was saved: the listing is stale without any explicit delete
//! cache.set_last_occurrence("save_post", Some(2_000)).unwrap();
//! assert_eq!(cache.get::<String>("events", "save_post").unwrap(), None);
//! ```
//!
//! ## Composite Keys
//!
//! ```rust
//! use cachette::Cache;
//! use serde_json::json;
//!
//! let cache = Cache::builder().in_memory().build().unwrap();
//!
//! let a = cache.make_key(&json!([{"b": 2, "a": 1}]), "pfx", true).unwrap();
//! let b = cache.make_key(&json!([{"a": 1, "b": 2}]), "pfx", true).unwrap();
//! assert_eq!(a, b);
//! ```
mod cache;
mod expiration;
mod indexed;

pub use cache::{Cache, CacheBuilder};
pub use expiration::{Expiration, NON_PERSISTENT, NO_EXPIRATION};
pub use indexed::Indexed;

pub use cachette_core::{
    keys, BackendError, CacheConfig, CacheEntry, CacheError, Clock, HashingKeyDeriver, KeyBuilder,
    KeyDeriver, MemoryBackend, MemoryOptionStore, MockClock, NonPersistentKeys, OptionStore,
    Result, StorageBackend, SystemClock, Tier, TriggerRegistry,
};

#[cfg(feature = "stats")]
pub use cachette_core::{CacheStats, TierStats};
