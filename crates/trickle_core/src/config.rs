//! # Sequence Configuration
//!
//! Settings are plain data, loaded once at startup from TOML or built in code.
//!
//! ```toml
//! label = "search-results"
//! initial_capacity = 4096
//! progress_interval = 1000
//! ```

use crate::error::{SequenceError, SequenceResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest pre-allocation accepted from a config file.
pub const MAX_INITIAL_CAPACITY: usize = 1 << 26;

/// Configuration for a [`LazyVec`](crate::LazyVec).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LazyVecConfig {
    /// Name attached to every log event for this sequence.
    pub label: String,
    /// Elements pre-allocated in the backing store.
    pub initial_capacity: usize,
    /// Emit a progress event every N appends (0 disables).
    pub progress_interval: usize,
}

impl Default for LazyVecConfig {
    fn default() -> Self {
        Self {
            label: "lazy_vec".to_string(),
            initial_capacity: 16,
            progress_interval: 0,
        }
    }
}

impl LazyVecConfig {
    /// Production config: large streams, periodic progress events.
    #[must_use]
    pub fn production() -> Self {
        Self {
            label: "lazy_vec".to_string(),
            initial_capacity: 1024,
            progress_interval: 10_000,
        }
    }

    /// Returns this config with a different log label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns this config with a different initial capacity.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Returns this config with a different progress interval.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::InvalidConfig`] if the label is blank or the
    /// capacity exceeds [`MAX_INITIAL_CAPACITY`].
    pub fn validate(&self) -> SequenceResult<()> {
        if self.label.trim().is_empty() {
            return Err(SequenceError::InvalidConfig("label must not be empty".to_string()));
        }
        if self.initial_capacity > MAX_INITIAL_CAPACITY {
            return Err(SequenceError::InvalidConfig(format!(
                "initial_capacity {} exceeds {MAX_INITIAL_CAPACITY}",
                self.initial_capacity
            )));
        }
        Ok(())
    }

    /// Parses and validates a config from TOML text.
    ///
    /// Missing keys fall back to [`LazyVecConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::InvalidConfig`] on malformed TOML, unknown
    /// keys, or values rejected by [`LazyVecConfig::validate`].
    pub fn from_toml_str(text: &str) -> SequenceResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SequenceError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::InvalidConfig`] if the file cannot be read or
    /// its contents are rejected by [`LazyVecConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> SequenceResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SequenceError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }
}
