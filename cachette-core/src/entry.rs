use serde_json::Value;

/// A value held by a storage backend together with its expiry information.
///
/// Timestamps are unix seconds taken from the backend's [`Clock`](crate::Clock),
/// so expiry can be checked against a mocked time source.
///
/// # Fields
///
/// * `value` - The stored value (a JSON `null` is a real value, not an absence)
/// * `inserted_at` - Unix timestamp of the write that produced this entry
/// * `ttl` - Time-to-live in seconds, `None` meaning the entry never expires
///
/// # Examples
///
/// ```
/// use cachette_core::CacheEntry;
/// use serde_json::json;
///
/// let entry = CacheEntry::new(json!(42), 1_000, 60);
/// assert_eq!(entry.value, json!(42));
///
/// assert!(!entry.is_expired(1_060));
/// assert!(entry.is_expired(1_061));
///
/// // TTL 0 means "no expiration"
/// let forever = CacheEntry::new(json!("data"), 1_000, 0);
/// assert!(!forever.is_expired(u64::MAX));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: Value,
    pub inserted_at: u64,
    pub ttl: Option<u64>,
}

impl CacheEntry {
    /// Creates a new entry written at `now` with a TTL of `ttl_secs`.
    ///
    /// A `ttl_secs` of `0` is the "no expiration" sentinel.
    pub fn new(value: Value, now: u64, ttl_secs: u64) -> Self {
        Self {
            value,
            inserted_at: now,
            ttl: (ttl_secs > 0).then_some(ttl_secs),
        }
    }

    /// Returns true if the entry's age at `now` exceeds its TTL.
    ///
    /// Timestamps have whole-second resolution, so an entry is served for at
    /// least `ttl` full seconds after the second it was written in.
    pub fn is_expired(&self, now: u64) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_sub(self.inserted_at) > ttl,
            None => false,
        }
    }

    /// Last unix timestamp at which the entry is still served, if it expires.
    pub fn expires_at(&self) -> Option<u64> {
        self.ttl.map(|ttl| self.inserted_at.saturating_add(ttl))
    }
}
