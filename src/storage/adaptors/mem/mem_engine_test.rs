use std::path::Path;

use bytes::Bytes;
use tracing_test::traced_test;

use super::*;
use crate::BatchOptions;
use crate::EngineBatch;
use crate::EngineHandle;
use crate::Error;
use crate::IterOptions;
use crate::StorageEngine;
use crate::StorageError;

fn collect(cursor: impl Iterator<Item = crate::Result<(Bytes, Bytes)>>) -> Vec<(Bytes, Bytes)> {
    cursor.map(|entry| entry.unwrap()).collect()
}

#[test]
#[traced_test]
fn test_second_open_reports_busy() {
    let engine = MemEngine::new();
    let path = Path::new("/mem/a");

    let _handle = engine.open(path).unwrap();
    assert!(engine.is_locked(path));

    match engine.open(path) {
        Err(Error::Storage(StorageError::Busy { path: busy })) => assert_eq!(busy, path),
        other => panic!("expected busy, got {:?}", other.map(|_| ())),
    }
    assert_eq!(engine.open_count(), 1);
}

#[test]
#[traced_test]
fn test_close_unlocks_and_keeps_data() {
    let engine = MemEngine::new();
    let path = Path::new("/mem/b");

    let handle = engine.open(path).unwrap();
    handle.put(b"k", b"v").unwrap();
    handle.close().unwrap();

    assert!(!engine.is_locked(path));
    assert_eq!(engine.close_count(), 1);

    let handle = engine.open(path).unwrap();
    assert_eq!(handle.get(b"k").unwrap(), Some(Bytes::from("v")));
    assert_eq!(engine.open_count(), 2);
}

#[test]
fn test_paths_are_independent() {
    let engine = MemEngine::new();
    let a = engine.open(Path::new("/mem/c1")).unwrap();
    let b = engine.open(Path::new("/mem/c2")).unwrap();

    a.put(b"k", b"a").unwrap();
    assert_eq!(b.get(b"k").unwrap(), None);
    assert_eq!(engine.entry_count(Path::new("/mem/c1")), 1);
    assert_eq!(engine.entry_count(Path::new("/mem/c2")), 0);
}

#[test]
fn test_delete_removes_key() {
    let engine = MemEngine::new();
    let handle = engine.open(Path::new("/mem/d")).unwrap();

    handle.put(b"k", b"v").unwrap();
    handle.delete(b"k").unwrap();
    assert_eq!(handle.get(b"k").unwrap(), None);

    // Deleting a missing key is not an error
    handle.delete(b"missing").unwrap();
}

#[test]
fn test_batch_applies_on_commit_only() {
    let engine = MemEngine::new();
    let handle = engine.open(Path::new("/mem/e")).unwrap();
    handle.put(b"gone", b"x").unwrap();

    let mut batch = handle.write_batch(BatchOptions::transactional());
    batch.put(b"a", b"1");
    batch.put(b"b", b"2");
    batch.delete(b"gone");
    assert_eq!(batch.len(), 3);
    assert!(batch.options().transactional);
    assert_eq!(handle.get(b"a").unwrap(), None);

    handle.commit_batch(batch).unwrap();
    assert_eq!(handle.get(b"a").unwrap(), Some(Bytes::from("1")));
    assert_eq!(handle.get(b"b").unwrap(), Some(Bytes::from("2")));
    assert_eq!(handle.get(b"gone").unwrap(), None);
}

#[test]
fn test_cleared_batch_writes_nothing() {
    let engine = MemEngine::new();
    let handle = engine.open(Path::new("/mem/f")).unwrap();

    let mut batch = handle.write_batch(BatchOptions::default());
    batch.put(b"a", b"1");
    batch.clear();
    assert!(batch.is_empty());

    handle.commit_batch(batch).unwrap();
    assert_eq!(engine.entry_count(Path::new("/mem/f")), 0);
}

#[test]
fn test_iter_prefix_and_reverse() {
    let engine = MemEngine::new();
    let handle = engine.open(Path::new("/mem/g")).unwrap();
    for key in ["a1", "a2", "b1", "a3"] {
        handle.put(key.as_bytes(), b"v").unwrap();
    }

    let keys: Vec<Bytes> = collect(handle.iter(&IterOptions::default()))
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, vec!["a1", "a2", "a3", "b1"]);

    let keys: Vec<Bytes> = collect(handle.iter(&IterOptions::default().with_prefix("a").reversed()))
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, vec!["a3", "a2", "a1"]);
}

#[test]
fn test_iter_is_a_snapshot() {
    let engine = MemEngine::new();
    let handle = engine.open(Path::new("/mem/h")).unwrap();
    handle.put(b"a", b"1").unwrap();

    let cursor = handle.iter(&IterOptions::default());
    handle.put(b"b", b"2").unwrap();

    assert_eq!(collect(cursor).len(), 1);
}
