use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use crate::LeaseConfig;
use crate::LeaseManager;
use crate::MemEngine;

/// Lease settings short enough for timing tests.
pub fn fast_config(path: &str) -> LeaseConfig {
    LeaseConfig {
        path: PathBuf::from(path),
        auto_release_interval_ms: 300,
        retry_interval_ms: 10,
        default_timeout_ms: 200,
    }
}

/// A manager over a fresh in-memory engine. The engine is returned too so
/// tests can inspect open/close counts and lock state.
pub fn mem_manager(config: LeaseConfig) -> (MemEngine, LeaseManager<MemEngine>) {
    let engine = MemEngine::new();
    let manager = LeaseManager::new(engine.clone(), config).expect("valid lease config");
    (engine, manager)
}

/// Polls `cond` until it holds or `timeout` elapses.
pub fn wait_until(
    timeout: Duration,
    mut cond: impl FnMut() -> bool,
) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}
