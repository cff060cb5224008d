use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Tuning knobs applied every time the sled adapter opens a store
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SledConfig {
    /// Page cache size in bytes
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    /// Background flush period; `None` disables periodic flushing
    #[serde(default = "default_flush_every_ms")]
    pub flush_every_ms: Option<u64>,

    #[serde(default = "default_use_compression")]
    pub use_compression: bool,

    #[serde(default)]
    pub mode: SledMode,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SledMode {
    #[default]
    HighThroughput,
    LowSpace,
}

impl From<SledMode> for ::sled::Mode {
    fn from(mode: SledMode) -> Self {
        match mode {
            SledMode::HighThroughput => ::sled::Mode::HighThroughput,
            SledMode::LowSpace => ::sled::Mode::LowSpace,
        }
    }
}

fn default_cache_capacity() -> u64 {
    10 * 1024 * 1024 //10MB
}
fn default_flush_every_ms() -> Option<u64> {
    Some(500)
}
fn default_use_compression() -> bool {
    true
}

impl Default for SledConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            flush_every_ms: default_flush_every_ms(),
            use_compression: default_use_compression(),
            mode: SledMode::default(),
        }
    }
}

impl SledConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "sled cache_capacity must be greater than 0".into(),
            )));
        }

        if self.flush_every_ms == Some(0) {
            return Err(Error::Config(ConfigError::Message(
                "sled flush_every_ms must be at least 1ms (or unset to disable)".into(),
            )));
        }

        Ok(())
    }
}
