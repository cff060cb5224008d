//! Lease configuration for the handle manager
//!
//! This is the complete persisted state of a manager: where the store lives and
//! how its handle is leased. The live handle, lock and maintenance thread are
//! never part of it and are rebuilt whenever a manager is constructed from it.
//!
//! # Usage
//!
//! ```toml
//! [lease]
//! path = "/var/lib/app/db"
//! auto_release_interval_ms = 5000  # Optional, default 5 seconds
//! retry_interval_ms = 100          # Optional, default 100ms
//! default_timeout_ms = 5000        # Optional, default 5 seconds
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Upper bound accepted for any interval or timeout (1 day)
const MAX_DURATION_MS: u64 = 86_400_000;

/// Lease configuration of one store path
///
/// # Examples
///
/// ```rust
/// use leasekv::LeaseConfig;
/// use std::time::Duration;
///
/// let config = LeaseConfig::with_path("/tmp/leasekv-doc");
/// assert_eq!(config.auto_release_interval(), Duration::from_secs(5));
/// assert_eq!(config.retry_interval(), Duration::from_millis(100));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LeaseConfig {
    /// Filesystem location of the engine store
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Idle time after the last access before the handle is closed
    ///
    /// Default: 5000 (5 seconds)
    #[serde(default = "default_auto_release_interval_ms")]
    pub auto_release_interval_ms: u64,

    /// Pause between open attempts while the store is locked by another opener
    ///
    /// Default: 100
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// How long a finite acquisition keeps retrying before giving up
    ///
    /// Default: 5000 (5 seconds)
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
}

fn default_path() -> PathBuf {
    PathBuf::from("./db")
}
fn default_auto_release_interval_ms() -> u64 {
    5000
}
fn default_retry_interval_ms() -> u64 {
    100
}
fn default_timeout_ms() -> u64 {
    5000
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            auto_release_interval_ms: default_auto_release_interval_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            default_timeout_ms: default_timeout_ms(),
        }
    }
}

impl LeaseConfig {
    /// Default timings for the store at `path`
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn auto_release_interval(&self) -> Duration {
        Duration::from_millis(self.auto_release_interval_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Encodes the config into its transmissible form
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decodes a config produced by [`LeaseConfig::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Validates configuration parameters
    ///
    /// Returns error if:
    /// - `path` is empty
    /// - `auto_release_interval_ms` or `retry_interval_ms` is 0
    /// - any duration exceeds one day
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "lease path cannot be empty".into(),
            )));
        }

        // A zero retry interval would spin on a locked store
        if self.retry_interval_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "retry_interval_ms must be at least 1ms".into(),
            )));
        }

        if self.auto_release_interval_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "auto_release_interval_ms must be at least 1ms".into(),
            )));
        }

        for (name, value) in [
            ("auto_release_interval_ms", self.auto_release_interval_ms),
            ("retry_interval_ms", self.retry_interval_ms),
            ("default_timeout_ms", self.default_timeout_ms),
        ] {
            if value > MAX_DURATION_MS {
                return Err(Error::Config(ConfigError::Message(format!(
                    "{name} must not exceed {MAX_DURATION_MS}, got {value}"
                ))));
            }
        }

        Ok(())
    }
}
