use std::path::PathBuf;
use std::time::Duration;

use super::lease::LeaseConfig;

#[test]
fn test_default_config() {
    let config = LeaseConfig::default();
    assert_eq!(config.path, PathBuf::from("./db"));
    assert_eq!(config.auto_release_interval(), Duration::from_secs(5));
    assert_eq!(config.retry_interval(), Duration::from_millis(100));
    assert_eq!(config.default_timeout(), Duration::from_secs(5));
    assert!(config.validate().is_ok());
}

#[test]
fn test_with_path_keeps_default_timings() {
    let config = LeaseConfig::with_path("/tmp/store");
    assert_eq!(config.path, PathBuf::from("/tmp/store"));
    assert_eq!(config.auto_release_interval_ms, 5000);
    assert_eq!(config.retry_interval_ms, 100);
    assert_eq!(config.default_timeout_ms, 5000);
}

#[test]
fn test_validation_rejects_empty_path() {
    let config = LeaseConfig::with_path("");
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_intervals() {
    let mut config = LeaseConfig::with_path("/tmp/store");

    config.retry_interval_ms = 0;
    assert!(config.validate().is_err());
    config.retry_interval_ms = 1;
    assert!(config.validate().is_ok());

    config.auto_release_interval_ms = 0;
    assert!(config.validate().is_err());
    config.auto_release_interval_ms = 86_400_001;
    assert!(config.validate().is_err());
    config.auto_release_interval_ms = 86_400_000;
    assert!(config.validate().is_ok());

    // Zero timeout is legal: acquisitions then try exactly once
    config.default_timeout_ms = 0;
    assert!(config.validate().is_ok());
}

#[test]
fn test_bytes_form_carries_every_field() {
    let config = LeaseConfig {
        path: PathBuf::from("/data/kv"),
        auto_release_interval_ms: 1000,
        retry_interval_ms: 20,
        default_timeout_ms: 750,
    };

    let bytes = config.to_bytes().unwrap();
    let decoded = LeaseConfig::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, config);
}

#[test]
fn test_from_bytes_rejects_garbage() {
    assert!(LeaseConfig::from_bytes(&[0xff, 0x01]).is_err());
}
