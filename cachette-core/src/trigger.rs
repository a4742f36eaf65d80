//! # Expiration Triggers
//!
//! Named events whose last occurrence is folded into cache keys.
//!
//! Instead of tracking which entries depend on which event and evicting them,
//! a trigger simply records *when* the event last happened. Keys derived with
//! that trigger embed the timestamp, so recording a new occurrence shadows
//! every key derived before it.
//!
//! Timestamps live in an external [`OptionStore`] under
//! `<prefix><trigger name>`, one option per trigger. The registry never
//! expires them.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use cachette_core::{MemoryOptionStore, MockClock, TriggerRegistry};
//!
//! let clock = Arc::new(MockClock::new(500));
//! let triggers = TriggerRegistry::new(Arc::new(MemoryOptionStore::new()), clock.clone(), "last_");
//!
//! // First lookup seeds the trigger with "now"
//! assert_eq!(triggers.last_occurrence("save_post").unwrap(), 500);
//!
//! // The seeded value sticks even as time moves on
//! clock.advance(100);
//! assert_eq!(triggers.last_occurrence("save_post").unwrap(), 500);
//!
//! // Firing the trigger moves it forward
//! triggers.record_occurrence("save_post", None).unwrap();
//! assert_eq!(triggers.last_occurrence("save_post").unwrap(), 600);
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::backend::OptionStore;
use crate::clock::Clock;
use crate::error::{CacheError, Result};

/// Registry of last-occurrence timestamps for named triggers.
#[derive(Clone)]
pub struct TriggerRegistry {
    options: Arc<dyn OptionStore>,
    clock: Arc<dyn Clock>,
    prefix: String,
}

impl TriggerRegistry {
    /// Create a registry storing timestamps in `options` under `prefix`.
    pub fn new(
        options: Arc<dyn OptionStore>,
        clock: Arc<dyn Clock>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            options,
            clock,
            prefix: prefix.into(),
        }
    }

    /// Name of the option holding `trigger`'s timestamp.
    pub fn option_name(&self, trigger: &str) -> String {
        format!("{}{}", self.prefix, trigger)
    }

    /// Returns the last recorded occurrence of `trigger`.
    ///
    /// A trigger that was never recorded is seeded with the current time,
    /// and that value is persisted so later lookups agree with this one.
    pub fn last_occurrence(&self, trigger: &str) -> Result<u64> {
        let name = self.option_name(trigger);

        match self.options.get_option(&name)? {
            Some(value) => parse_timestamp(trigger, value),
            None => {
                let now = self.clock.now();
                tracing::debug!(trigger, timestamp = now, "seeding trigger occurrence");
                self.options.set_option(&name, Value::from(now))?;
                Ok(now)
            }
        }
    }

    /// Records that `trigger` fired at `timestamp`.
    ///
    /// `None` or `Some(0)` records the current time.
    pub fn record_occurrence(&self, trigger: &str, timestamp: Option<u64>) -> Result<()> {
        let timestamp = match timestamp {
            Some(ts) if ts > 0 => ts,
            _ => self.clock.now(),
        };

        tracing::debug!(trigger, timestamp, "recording trigger occurrence");
        self.options
            .set_option(&self.option_name(trigger), Value::from(timestamp))
    }
}

/// Reads a stored option as a unix timestamp, accepting numeric strings.
fn parse_timestamp(trigger: &str, value: Value) -> Result<u64> {
    let parsed = match &value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| CacheError::InvalidTimestamp {
        trigger: trigger.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryOptionStore;
    use crate::clock::MockClock;
    use serde_json::json;

    fn registry(now: u64) -> (TriggerRegistry, Arc<MemoryOptionStore>, Arc<MockClock>) {
        let options = Arc::new(MemoryOptionStore::new());
        let clock = Arc::new(MockClock::new(now));
        let registry = TriggerRegistry::new(options.clone(), clock.clone(), "last_");
        (registry, options, clock)
    }

    #[test]
    fn test_first_lookup_persists_now() {
        let (triggers, options, _) = registry(1234);
        assert_eq!(triggers.last_occurrence("save_post").unwrap(), 1234);
        assert_eq!(
            options.get_option("last_save_post").unwrap(),
            Some(json!(1234))
        );
    }

    #[test]
    fn test_record_explicit_timestamp() {
        let (triggers, _, _) = registry(1);
        triggers.record_occurrence("save_post", Some(1000)).unwrap();
        assert_eq!(triggers.last_occurrence("save_post").unwrap(), 1000);

        triggers.record_occurrence("save_post", Some(2000)).unwrap();
        assert_eq!(triggers.last_occurrence("save_post").unwrap(), 2000);
    }

    #[test]
    fn test_record_zero_means_now() {
        let (triggers, _, clock) = registry(10);
        clock.set(77);
        triggers.record_occurrence("save_post", Some(0)).unwrap();
        assert_eq!(triggers.last_occurrence("save_post").unwrap(), 77);
    }

    #[test]
    fn test_triggers_are_independent() {
        let (triggers, _, _) = registry(5);
        triggers.record_occurrence("a", Some(100)).unwrap();
        triggers.record_occurrence("b", Some(200)).unwrap();
        assert_eq!(triggers.last_occurrence("a").unwrap(), 100);
        assert_eq!(triggers.last_occurrence("b").unwrap(), 200);
    }

    #[test]
    fn test_numeric_string_accepted() {
        let (triggers, options, _) = registry(5);
        options.set_option("last_import", json!(" 4242 ")).unwrap();
        assert_eq!(triggers.last_occurrence("import").unwrap(), 4242);
    }

    #[test]
    fn test_garbage_value_is_an_error() {
        let (triggers, options, _) = registry(5);
        options.set_option("last_import", json!({"oops": true})).unwrap();
        assert!(matches!(
            triggers.last_occurrence("import"),
            Err(CacheError::InvalidTimestamp { .. })
        ));
    }
}
