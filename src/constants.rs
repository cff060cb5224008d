use std::time::Duration;

// -
// Lease timing

/// Deadline updates closer than this to the current deadline are dropped
pub(crate) const DEADLINE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Upper bound on a single releaser wait; covers missed wakeups
pub(crate) const RELEASER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Name given to the per-manager maintenance thread
pub(crate) const RELEASER_THREAD_NAME: &str = "leasekv-releaser";

// -
// Configuration sources

/// Prefix of environment variable overrides, e.g. `LEASEKV__LEASE__RETRY_INTERVAL_MS`
pub(crate) const ENV_PREFIX: &str = "LEASEKV";

/// Environment variable naming an optional config file
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
