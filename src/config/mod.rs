//! Configuration management module for the lease handle manager.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Environment variable overrides
//! - Configuration file support
//! - Component-wise validation
mod lease;
mod storage;
pub use lease::*;
pub use storage::*;
#[cfg(test)]
mod lease_test;

use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_PATH_ENV;
use crate::constants::ENV_PREFIX;
use crate::Result;

/// Main configuration container
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LeaseKvConfig {
    /// Store location and lease timings
    #[serde(default)]
    pub lease: LeaseConfig,
    /// Sled adapter tuning
    #[serde(default)]
    pub sled: SledConfig,
}

impl LeaseKvConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `LEASEKV__` prefix (highest priority)
    ///
    /// # Note
    /// Validation is deferred so further overrides can be applied via
    /// `with_override_config()`. Callers MUST call `validate()` before use.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("LEASEKV__LEASE__PATH", "/var/lib/app/db");
    /// let cfg = LeaseKvConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns validated instance.
    pub fn validate(self) -> Result<Self> {
        self.lease.validate()?;
        self.sled.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
