//! # Cache Configuration
//!
//! Namespacing and key-length settings for a cache instance.
//!
//! Every field has a default, so a host can deserialize a partial section of
//! its own configuration file (TOML, JSON, ...) straight into [`CacheConfig`]:
//!
//! ```
//! use cachette_core::CacheConfig;
//!
//! let config: CacheConfig = serde_json::from_str(r#"{ "persistent_group": "events" }"#).unwrap();
//! assert_eq!(config.persistent_group, "events");
//! assert_eq!(config.max_key_length, 40);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};
use crate::keys::HASH_LEN;

/// Longest derived key stored verbatim; longer keys are replaced by a hash.
pub const DEFAULT_MAX_KEY_LENGTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Namespace of the durable tier.
    pub persistent_group: String,
    /// Namespace of the process-local tier.
    pub non_persistent_group: String,
    /// Namespace of the transient tier.
    pub transient_group: String,
    /// Prefix of the option names holding trigger timestamps.
    pub trigger_option_prefix: String,
    /// Derived keys longer than this (in bytes) are hashed.
    pub max_key_length: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            persistent_group: "cache".to_string(),
            non_persistent_group: "cache-non-persistent".to_string(),
            transient_group: "transient".to_string(),
            trigger_option_prefix: "last_".to_string(),
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
        }
    }
}

impl CacheConfig {
    /// Checks the configuration can uphold the key-length bound and keeps the
    /// tiers in distinct namespaces.
    pub fn validate(&self) -> Result<()> {
        if self.max_key_length < HASH_LEN {
            return Err(CacheError::InvalidConfig(format!(
                "max_key_length {} is shorter than the {HASH_LEN}-character key hash",
                self.max_key_length
            )));
        }

        let groups = [
            ("persistent_group", &self.persistent_group),
            ("non_persistent_group", &self.non_persistent_group),
            ("transient_group", &self.transient_group),
        ];
        for (name, group) in groups {
            if group.is_empty() {
                return Err(CacheError::InvalidConfig(format!("{name} is empty")));
            }
        }
        if self.persistent_group == self.non_persistent_group
            || self.persistent_group == self.transient_group
            || self.non_persistent_group == self.transient_group
        {
            return Err(CacheError::InvalidConfig(
                "storage tiers must use distinct groups".to_string(),
            ));
        }

        Ok(())
    }
}
