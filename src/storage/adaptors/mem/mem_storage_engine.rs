use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::trace;

use crate::BatchOptions;
use crate::EngineBatch;
use crate::EngineHandle;
use crate::IterOptions;
use crate::Result;
use crate::StorageEngine;
use crate::StorageError;

/// Data and lock flag of one in-memory store path
#[derive(Debug, Default)]
struct MemStore {
    data: RwLock<BTreeMap<Bytes, Bytes>>,
    locked: AtomicBool,
}

/// In-memory storage engine
///
/// Stores outlive their handles, so data written before a close is visible
/// after the next open, as with an on-disk store. Only one handle per path may
/// be open at a time; a second `open` reports [`StorageError::Busy`].
///
/// Clones share the same stores.
#[derive(Debug, Clone, Default)]
pub struct MemEngine {
    stores: Arc<DashMap<PathBuf, Arc<MemStore>>>,
    opens: Arc<AtomicU64>,
    closes: Arc<AtomicU64>,
}

impl MemEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful opens across all paths
    pub fn open_count(&self) -> u64 {
        self.opens.load(Ordering::Acquire)
    }

    /// Number of handles released across all paths
    pub fn close_count(&self) -> u64 {
        self.closes.load(Ordering::Acquire)
    }

    /// Whether a handle for `path` is currently open
    pub fn is_locked(
        &self,
        path: &Path,
    ) -> bool {
        self.stores
            .get(path)
            .map(|store| store.locked.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    /// Number of entries stored at `path`
    pub fn entry_count(
        &self,
        path: &Path,
    ) -> usize {
        self.stores.get(path).map(|store| store.data.read().len()).unwrap_or(0)
    }
}

impl StorageEngine for MemEngine {
    type Handle = MemHandle;

    fn open(
        &self,
        path: &Path,
    ) -> Result<Self::Handle> {
        let store = self.stores.entry(path.to_path_buf()).or_default().clone();

        if store.locked.swap(true, Ordering::AcqRel) {
            return Err(StorageError::Busy {
                path: path.to_path_buf(),
            }
            .into());
        }

        self.opens.fetch_add(1, Ordering::AcqRel);
        trace!(?path, "mem store opened");

        Ok(MemHandle {
            store,
            closes: self.closes.clone(),
        })
    }
}

/// Open handle to one in-memory store
///
/// Dropping the handle releases the path lock, like closing a file descriptor.
#[derive(Debug)]
pub struct MemHandle {
    store: Arc<MemStore>,
    closes: Arc<AtomicU64>,
}

impl Drop for MemHandle {
    fn drop(&mut self) {
        self.store.locked.store(false, Ordering::Release);
        self.closes.fetch_add(1, Ordering::AcqRel);
    }
}

impl EngineHandle for MemHandle {
    type Batch = MemBatch;
    type Cursor = std::vec::IntoIter<Result<(Bytes, Bytes)>>;

    fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<Bytes>> {
        Ok(self.store.data.read().get(key).cloned())
    }

    fn put(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<()> {
        self.store
            .data
            .write()
            .insert(Bytes::copy_from_slice(key), Bytes::copy_from_slice(value));
        Ok(())
    }

    fn delete(
        &self,
        key: &[u8],
    ) -> Result<()> {
        self.store.data.write().remove(key);
        Ok(())
    }

    fn write_batch(
        &self,
        options: BatchOptions,
    ) -> Self::Batch {
        MemBatch {
            ops: Vec::new(),
            options,
        }
    }

    fn commit_batch(
        &self,
        batch: Self::Batch,
    ) -> Result<()> {
        let mut data = self.store.data.write();
        for op in batch.ops {
            match op {
                MemBatchOp::Put(key, value) => {
                    data.insert(key, value);
                }
                MemBatchOp::Delete(key) => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    /// Cursors walk a snapshot taken when the cursor is created.
    fn iter(
        &self,
        options: &IterOptions,
    ) -> Self::Cursor {
        let data = self.store.data.read();
        let matches = |key: &Bytes| match &options.prefix {
            Some(prefix) => key.starts_with(prefix),
            None => true,
        };

        let mut entries: Vec<Result<(Bytes, Bytes)>> = data
            .iter()
            .filter(|&(k, _)| matches(k))
            .map(|(k, v)| Ok((k.clone(), v.clone())))
            .collect();

        if options.reverse {
            entries.reverse();
        }
        entries.into_iter()
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(self) -> Result<()> {
        // Drop releases the lock
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum MemBatchOp {
    Put(Bytes, Bytes),
    Delete(Bytes),
}

/// Buffered operations against a [`MemHandle`]
#[derive(Debug)]
pub struct MemBatch {
    ops: Vec<MemBatchOp>,
    options: BatchOptions,
}

impl EngineBatch for MemBatch {
    fn put(
        &mut self,
        key: &[u8],
        value: &[u8],
    ) {
        self.ops.push(MemBatchOp::Put(
            Bytes::copy_from_slice(key),
            Bytes::copy_from_slice(value),
        ));
    }

    fn delete(
        &mut self,
        key: &[u8],
    ) {
        self.ops.push(MemBatchOp::Delete(Bytes::copy_from_slice(key)));
    }

    fn clear(&mut self) {
        self.ops.clear();
    }

    fn len(&self) -> usize {
        self.ops.len()
    }

    fn options(&self) -> BatchOptions {
        self.options
    }
}
