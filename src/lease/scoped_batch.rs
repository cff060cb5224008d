use tracing::debug;
use tracing::warn;

use super::lease_guard::LeaseGuard;
use crate::BatchOptions;
use crate::EngineBatch;
use crate::EngineHandle;
use crate::Result;
use crate::StorageEngine;

pub(crate) type BatchOf<E> = <<E as StorageEngine>::Handle as EngineHandle>::Batch;

/// Atomic write batch bound to one scoped lease.
///
/// Writes are buffered and reach the engine only on [`ScopedBatch::commit`].
/// The handle stays open for the batch's whole lifetime and is released on
/// every exit path:
///
/// - `commit` applies the writes, then releases.
/// - `discard` drops the writes, then releases.
/// - Dropping an uncommitted batch discards a transactional batch and commits
///   a non-transactional one, then releases.
pub struct ScopedBatch<'a, E: StorageEngine> {
    batch: Option<BatchOf<E>>,
    // Declared last: the lease ends after the batch is settled
    guard: LeaseGuard<'a, E>,
}

impl<'a, E: StorageEngine> ScopedBatch<'a, E> {
    pub(crate) fn new(
        guard: LeaseGuard<'a, E>,
        batch: BatchOf<E>,
    ) -> Self {
        Self {
            batch: Some(batch),
            guard,
        }
    }

    /// Buffers a write. No I/O happens until commit.
    pub fn put(
        &mut self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) {
        if let Some(batch) = self.batch.as_mut() {
            batch.put(key.as_ref(), value.as_ref());
        }
    }

    /// Buffers a removal.
    pub fn delete(
        &mut self,
        key: impl AsRef<[u8]>,
    ) {
        if let Some(batch) = self.batch.as_mut() {
            batch.delete(key.as_ref());
        }
    }

    /// Number of buffered operations
    pub fn len(&self) -> usize {
        self.batch.as_ref().map_or(0, |b| b.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn options(&self) -> BatchOptions {
        self.batch.as_ref().map(|b| b.options()).unwrap_or_default()
    }

    /// Applies all buffered writes atomically, then releases the lease.
    pub fn commit(mut self) -> Result<()> {
        match self.batch.take() {
            Some(batch) => self.apply(batch),
            None => Ok(()),
        }
    }

    /// Drops all buffered writes, then releases the lease.
    pub fn discard(mut self) {
        if let Some(mut batch) = self.batch.take() {
            debug!(len = batch.len(), "write batch discarded");
            batch.clear();
        }
    }

    fn apply(
        &self,
        batch: BatchOf<E>,
    ) -> Result<()> {
        let len = batch.len();
        self.guard
            .manager()
            .with_held_handle(move |handle| handle.commit_batch(batch))?;
        debug!(len, "write batch committed");
        Ok(())
    }
}

impl<E: StorageEngine> Drop for ScopedBatch<'_, E> {
    fn drop(&mut self) {
        let Some(mut batch) = self.batch.take() else {
            return;
        };

        if batch.options().transactional {
            debug!(
                len = batch.len(),
                "transactional write batch left its scope uncommitted, discarding"
            );
            batch.clear();
        } else if !batch.is_empty() {
            if let Err(e) = self.apply(batch) {
                warn!(?e, "failed to commit write batch on scope exit");
            }
        }
    }
}

impl<E: StorageEngine> std::fmt::Debug for ScopedBatch<'_, E> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ScopedBatch")
            .field("len", &self.len())
            .field("options", &self.options())
            .finish()
    }
}
