//! # Cachette Core
//!
//! Building blocks for the Cachette caching library.
//!
//! This crate provides key derivation, expiration triggers, storage tier
//! abstractions and the bookkeeping the `cachette` facade composes.
//!
//! ## Features
//!
//! - **Key Derivation**: Deterministic, length-bounded keys from identifiers
//! - **Composite Keys**: Order-insensitive keys from arbitrary serializable components
//! - **Expiration Triggers**: Lazy invalidation by folding event timestamps into keys
//! - **Storage Tiers**: One backend trait for persistent, non-persistent and transient data
//! - **TTL Support**: Per-entry time-to-live against an injectable clock
//! - **Statistics**: Per-tier hit/miss/write counters (`stats` feature)
//!
//! ## Module Organization
//!
//! - [`backend`] - Storage and option store traits, in-memory implementations
//! - [`keys`] - Key derivation strategies and composite key normalisation
//! - [`trigger`] - Last-occurrence registry for named triggers
//! - [`config`] - Group names and key-length configuration
//!
mod clock;
mod entry;
mod error;
mod non_persistent;

pub mod backend;
pub mod config;
pub mod keys;
pub mod trigger;

#[cfg(feature = "stats")]
mod stats;

pub use backend::{MemoryBackend, MemoryOptionStore, OptionStore, StorageBackend, Tier};
pub use clock::{Clock, MockClock, SystemClock};
pub use config::CacheConfig;
pub use entry::CacheEntry;
pub use error::{BackendError, CacheError, Result};
pub use keys::{HashingKeyDeriver, KeyBuilder, KeyDeriver};
pub use non_persistent::NonPersistentKeys;
pub use trigger::TriggerRegistry;

#[cfg(feature = "stats")]
pub use stats::{CacheStats, TierStats};
