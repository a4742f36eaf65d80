//! # Cache Keys
//!
//! Deterministic key derivation for every storage tier.
//!
//! A key is derived from a raw identifier and, optionally, the last
//! occurrence of a named trigger. Appending the trigger timestamp means that
//! once the trigger fires again, the derived key changes and every entry
//! written under the old key is simply never looked up again.
//!
//! Derived keys longer than the configured bound are replaced by a hash so
//! backends with key-size limits can store them.
//!
//! # Examples
//!
//! ```
//! use cachette_core::{HashingKeyDeriver, KeyDeriver};
//!
//! let deriver = HashingKeyDeriver::default();
//!
//! assert_eq!(deriver.derive("events", None), "events");
//! assert_eq!(deriver.derive("events", Some(1000)), "events1000");
//!
//! let long = "x".repeat(64);
//! assert_eq!(deriver.derive(&long, None).len(), 32);
//! ```

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};

use crate::config::DEFAULT_MAX_KEY_LENGTH;
use crate::error::{CacheError, Result};
use crate::trigger::TriggerRegistry;

/// Length, in hex characters, of a hashed key.
pub const HASH_LEN: usize = 32;

/// Hashes `input` into a fixed-length lowercase hex key.
///
/// The digest is SHA-256 truncated to [`HASH_LEN`] characters, which keeps
/// hashed keys as short as the identifiers they replace.
///
/// ```
/// use cachette_core::keys::{hash_key, HASH_LEN};
///
/// let key = hash_key("some very long identifier");
/// assert_eq!(key.len(), HASH_LEN);
/// assert_eq!(key, hash_key("some very long identifier"));
/// ```
pub fn hash_key(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_LEN);
    hex
}

/// Strategy that turns an identifier and an optional trigger occurrence into
/// the key handed to a storage backend.
///
/// Implementations must be pure: the same inputs always produce the same key.
pub trait KeyDeriver: Send + Sync {
    fn derive(&self, identifier: &str, occurrence: Option<u64>) -> String;
}

/// Default [`KeyDeriver`]: concatenates the identifier and the occurrence
/// timestamp, hashing the result when it exceeds `max_len` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingKeyDeriver {
    max_len: usize,
}

impl HashingKeyDeriver {
    /// Creates a deriver with the given bound.
    ///
    /// Bounds below [`HASH_LEN`] are raised to it, since a hashed key can
    /// never be shorter than that.
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(HASH_LEN),
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Default for HashingKeyDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_KEY_LENGTH)
    }
}

impl KeyDeriver for HashingKeyDeriver {
    fn derive(&self, identifier: &str, occurrence: Option<u64>) -> String {
        let key = match occurrence {
            Some(ts) => format!("{identifier}{ts}"),
            None => identifier.to_string(),
        };

        if key.len() > self.max_len {
            hash_key(&key)
        } else {
            key
        }
    }
}

/// Composes a [`KeyDeriver`] with a [`TriggerRegistry`].
///
/// This is the single place where identifiers become storage keys; the cache
/// facade routes every operation through it.
#[derive(Clone)]
pub struct KeyBuilder {
    deriver: Arc<dyn KeyDeriver>,
    triggers: TriggerRegistry,
}

impl KeyBuilder {
    pub fn new(deriver: Arc<dyn KeyDeriver>, triggers: TriggerRegistry) -> Self {
        Self { deriver, triggers }
    }

    pub fn triggers(&self) -> &TriggerRegistry {
        &self.triggers
    }

    /// Derives the storage key for `identifier`.
    ///
    /// An empty `trigger` skips the registry entirely; otherwise the trigger's
    /// last occurrence is looked up (and seeded if it was never recorded).
    pub fn derive_key(&self, identifier: &str, trigger: &str) -> Result<String> {
        let occurrence = if trigger.is_empty() {
            None
        } else {
            Some(self.triggers.last_occurrence(trigger)?)
        };

        Ok(self.deriver.derive(identifier, occurrence))
    }

    /// Builds a key from a list of components and a prefix.
    ///
    /// A top-level sequence is treated as the list of components; anything
    /// else is a single component. With `sort` enabled, composite components
    /// are normalised first so logically equal inputs in a different order
    /// produce the same key (see [`normalize_component`]).
    ///
    /// The serialized components are hashed, prefixed, and passed through
    /// [`derive_key`](Self::derive_key) without a trigger.
    ///
    /// Components are concatenated without a separator, so `["ab"]` and
    /// `["a", "b"]` share a key. Keys stay compatible with stores written by
    /// earlier deployments this way; callers that need the two kept apart
    /// should nest them (`[["a", "b"]]` serializes as `["a","b"]`).
    pub fn make_key<C>(&self, components: &C, prefix: &str, sort: bool) -> Result<String>
    where
        C: Serialize + ?Sized,
    {
        let material = composite_key_material(components, sort)?;
        self.derive_key(&format!("{prefix}{}", hash_key(&material)), "")
    }
}

/// Serializes `components` into the string that [`KeyBuilder::make_key`]
/// hashes.
///
/// Strings contribute their raw text; every other value contributes its
/// compact JSON form.
pub fn composite_key_material<C>(components: &C, sort: bool) -> Result<String>
where
    C: Serialize + ?Sized,
{
    let value =
        serde_json::to_value(components).map_err(|e| CacheError::KeyDerivation(e.to_string()))?;

    let components = match value {
        Value::Array(items) => items,
        single => vec![single],
    };

    let mut material = String::new();
    for component in components {
        let component = if sort {
            normalize_component(component)
        } else {
            component
        };
        match component {
            Value::String(s) => material.push_str(&s),
            other => material.push_str(&other.to_string()),
        }
    }

    Ok(material)
}

/// Normalises one composite component so that ordering does not matter.
///
/// - An associative object (at least one non-integer key) has its entries
///   sorted by key.
/// - An array, or an object whose keys are all integers, is a list: its
///   values are sorted and re-indexed as an array.
/// - Scalars are returned unchanged.
///
/// Normalisation is shallow; nested composites keep their order.
pub fn normalize_component(component: Value) -> Value {
    match component {
        Value::Object(map) if is_associative(&map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().collect())
        }
        Value::Object(map) => sorted_list(map.into_iter().map(|(_, v)| v).collect()),
        Value::Array(items) => sorted_list(items),
        scalar => scalar,
    }
}

fn is_associative(map: &Map<String, Value>) -> bool {
    map.keys().any(|k| k.parse::<i64>().is_err())
}

fn sorted_list(mut items: Vec<Value>) -> Value {
    items.sort_by(compare_values);
    Value::Array(items)
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values used to sort list components.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Integers compare exactly; floats by value. Numbers that are numerically
/// equal but written differently (`1` and `1.0`) fall back to their text so
/// no two distinct numbers tie.
fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    let by_value = if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        a.cmp(&b)
    } else if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        a.cmp(&b)
    } else {
        let (a, b) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
        a.partial_cmp(&b).unwrap_or(Ordering::Equal)
    };
    by_value.then_with(|| x.to_string().cmp(&y.to_string()))
}
