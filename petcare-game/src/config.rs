//! Runtime configuration for the pet store.
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::constants::{DECAY_INTERVAL_MS, DECAY_STEP, DEFAULT_STORAGE_KEY, STAT_MAX};

/// Errors raised when store configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("store config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("storage key must not be empty")]
    EmptyStorageKey,
    #[error("decay interval must be at least 1ms")]
    ZeroDecayInterval,
    #[error("decay step must be between 1 and {max} (got {value})")]
    DecayStepRange { value: u8, max: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default = "StoreConfig::default_storage_key")]
    pub storage_key: String,
    #[serde(default = "StoreConfig::default_decay_interval_ms")]
    pub decay_interval_ms: u64,
    #[serde(default = "StoreConfig::default_decay_step")]
    pub decay_step: u8,
    #[serde(default = "StoreConfig::default_decay_enabled")]
    pub decay_enabled: bool,
}

impl StoreConfig {
    fn default_storage_key() -> String {
        DEFAULT_STORAGE_KEY.to_string()
    }

    const fn default_decay_interval_ms() -> u64 {
        DECAY_INTERVAL_MS
    }

    const fn default_decay_step() -> u8 {
        DECAY_STEP
    }

    const fn default_decay_enabled() -> bool {
        true
    }

    /// Parse and validate a JSON config document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        if self.decay_interval_ms == 0 {
            return Err(ConfigError::ZeroDecayInterval);
        }
        if self.decay_step == 0 || self.decay_step > STAT_MAX {
            return Err(ConfigError::DecayStepRange {
                value: self.decay_step,
                max: STAT_MAX,
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn decay_interval(&self) -> Duration {
        Duration::from_millis(self.decay_interval_ms)
    }

    #[must_use]
    pub fn without_decay(mut self) -> Self {
        self.decay_enabled = false;
        self
    }

    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: Self::default_storage_key(),
            decay_interval_ms: Self::default_decay_interval_ms(),
            decay_step: Self::default_decay_step(),
            decay_enabled: Self::default_decay_enabled(),
        }
    }
}
