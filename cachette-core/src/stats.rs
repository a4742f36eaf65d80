use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::Tier;

/// Access counters for one storage tier.
///
/// All counters are atomics updated with `Relaxed` ordering; they are
/// monitoring data, not synchronisation points.
///
/// # Examples
///
/// ```
/// use cachette_core::CacheStats;
///
/// let stats = CacheStats::new();
/// stats.record_write();
/// stats.record_hit();
/// stats.record_miss();
///
/// assert_eq!(stats.writes(), 1);
/// assert_eq!(stats.total_reads(), 2);
/// assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Returns the number of lookups (hits + misses).
    #[inline]
    pub fn total_reads(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Fraction of lookups that found a value, `0.0` when nothing was read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_reads();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
    }
}

impl Clone for CacheStats {
    fn clone(&self) -> Self {
        Self {
            hits: AtomicU64::new(self.hits()),
            misses: AtomicU64::new(self.misses()),
            writes: AtomicU64::new(self.writes()),
            deletes: AtomicU64::new(self.deletes()),
        }
    }
}

/// One [`CacheStats`] per [`Tier`].
#[derive(Debug, Default, Clone)]
pub struct TierStats {
    persistent: CacheStats,
    non_persistent: CacheStats,
    transient: CacheStats,
}

impl TierStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tier(&self, tier: Tier) -> &CacheStats {
        match tier {
            Tier::Persistent => &self.persistent,
            Tier::NonPersistent => &self.non_persistent,
            Tier::Transient => &self.transient,
        }
    }

    pub fn reset(&self) {
        for tier in Tier::ALL {
            self.tier(tier).reset();
        }
    }
}
