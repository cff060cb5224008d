use std::path::Path;
use std::time::Duration;
use std::time::Instant;

use leasekv::LeaseConfig;
use leasekv::LeaseManager;
use leasekv::SledConfig;
use leasekv::SledEngine;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for integration test.");
}

pub fn sled_config(
    path: &Path,
    auto_release_interval_ms: u64,
) -> LeaseConfig {
    LeaseConfig {
        path: path.to_path_buf(),
        auto_release_interval_ms,
        retry_interval_ms: 20,
        default_timeout_ms: 5_000,
    }
}

pub fn sled_manager(config: LeaseConfig) -> LeaseManager<SledEngine> {
    LeaseManager::new(SledEngine::new(SledConfig::default()), config).expect("valid lease config")
}

pub fn wait_until(
    timeout: Duration,
    mut cond: impl FnMut() -> bool,
) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    cond()
}
