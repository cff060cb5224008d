use bytes::Bytes;
use tempfile::TempDir;
use tracing_test::traced_test;

use super::*;
use crate::BatchOptions;
use crate::EngineBatch;
use crate::EngineHandle;
use crate::IterOptions;
use crate::SledConfig;
use crate::SledMode;
use crate::StorageEngine;

// Test setup helper
fn setup_handle() -> (SledEngine, SledHandle, TempDir) {
    let tempdir = tempfile::tempdir().unwrap();
    let engine = SledEngine::new(SledConfig::default());
    let handle = engine.open(&tempdir.path().join("db")).unwrap();
    (engine, handle, tempdir)
}

fn keys(cursor: SledCursor) -> Vec<Bytes> {
    cursor.map(|entry| entry.unwrap().0).collect()
}

#[test]
#[traced_test]
fn test_empty_storage() {
    let (_engine, handle, _dir) = setup_handle();

    assert_eq!(handle.get(b"missing").unwrap(), None);
    assert!(keys(handle.iter(&IterOptions::default())).is_empty());
}

#[test]
#[traced_test]
fn test_point_operations() {
    let (_engine, handle, _dir) = setup_handle();

    handle.put(b"a", b"1").unwrap();
    assert_eq!(handle.get(b"a").unwrap(), Some(Bytes::from("1")));

    handle.put(b"a", b"2").unwrap();
    assert_eq!(handle.get(b"a").unwrap(), Some(Bytes::from("2")));

    handle.delete(b"a").unwrap();
    assert_eq!(handle.get(b"a").unwrap(), None);
}

#[test]
#[traced_test]
fn test_data_survives_close_and_reopen() {
    let tempdir = tempfile::tempdir().unwrap();
    let path = tempdir.path().join("db");
    let engine = SledEngine::new(SledConfig {
        mode: SledMode::LowSpace,
        ..Default::default()
    });

    let handle = engine.open(&path).unwrap();
    handle.put(b"persist", b"yes").unwrap();
    handle.close().unwrap();

    let handle = engine.open(&path).unwrap();
    assert_eq!(handle.get(b"persist").unwrap(), Some(Bytes::from("yes")));
}

#[test]
#[traced_test]
fn test_batch_persistence() {
    let (_engine, handle, _dir) = setup_handle();
    handle.put(b"old", b"x").unwrap();

    let mut batch = handle.write_batch(BatchOptions::transactional().with_sync(true));
    for i in 0..10u8 {
        batch.put(&[b'k', i], &[i]);
    }
    batch.delete(b"old");
    assert_eq!(batch.len(), 11);
    assert!(batch.options().sync);

    // Nothing is visible before commit
    assert_eq!(handle.get(&[b'k', 0]).unwrap(), None);

    handle.commit_batch(batch).unwrap();
    assert_eq!(handle.get(&[b'k', 9]).unwrap(), Some(Bytes::from(vec![9u8])));
    assert_eq!(handle.get(b"old").unwrap(), None);
}

#[test]
#[traced_test]
fn test_cleared_batch_is_empty() {
    let (_engine, handle, _dir) = setup_handle();

    let mut batch = handle.write_batch(BatchOptions::default());
    batch.put(b"a", b"1");
    batch.clear();
    assert!(batch.is_empty());

    handle.commit_batch(batch).unwrap();
    assert_eq!(handle.get(b"a").unwrap(), None);
}

#[test]
#[traced_test]
fn test_iter_prefix_and_direction() {
    let (_engine, handle, _dir) = setup_handle();
    for key in ["user:2", "user:1", "item:1", "user:3"] {
        handle.put(key.as_bytes(), b"v").unwrap();
    }

    assert_eq!(
        keys(handle.iter(&IterOptions::default())),
        vec!["item:1", "user:1", "user:2", "user:3"]
    );
    assert_eq!(
        keys(handle.iter(&IterOptions::default().with_prefix("user:").reversed())),
        vec!["user:3", "user:2", "user:1"]
    );
}
