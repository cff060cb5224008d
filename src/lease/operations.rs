//! Operation facade
//!
//! Point operations take a default lease around each engine call; traversals
//! and batches take a scoped, indefinite lease for their whole lifetime.

use bytes::Bytes;
use tracing::instrument;

use super::lease_guard::LeaseGuard;
use super::lease_manager::LeaseManager;
use super::scoped_batch::ScopedBatch;
use super::scoped_iter::ScopedIter;
use crate::BatchOptions;
use crate::EngineHandle;
use crate::IterOptions;
use crate::Result;
use crate::StorageEngine;

impl<E: StorageEngine> LeaseManager<E> {
    /// Reads `key`, opening the handle if needed.
    #[instrument(skip_all, fields(path = ?self.path()))]
    pub fn get(
        &self,
        key: impl AsRef<[u8]>,
    ) -> Result<Option<Bytes>> {
        self.with_handle(|handle| handle.get(key.as_ref()))
    }

    /// Reads `key`, falling back to `default` when it is missing.
    pub fn get_or(
        &self,
        key: impl AsRef<[u8]>,
        default: impl Into<Bytes>,
    ) -> Result<Bytes> {
        Ok(self.get(key)?.unwrap_or_else(|| default.into()))
    }

    #[instrument(skip_all, fields(path = ?self.path()))]
    pub fn put(
        &self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<()> {
        self.with_handle(|handle| handle.put(key.as_ref(), value.as_ref()))
    }

    #[instrument(skip_all, fields(path = ?self.path()))]
    pub fn delete(
        &self,
        key: impl AsRef<[u8]>,
    ) -> Result<()> {
        self.with_handle(|handle| handle.delete(key.as_ref()))
    }

    /// Persists buffered writes without waiting for the handle to close.
    #[instrument(skip_all, fields(path = ?self.path()))]
    pub fn flush(&self) -> Result<()> {
        self.with_handle(|handle| handle.flush())
    }

    /// Starts a lazy traversal.
    ///
    /// Blocks until the handle can be opened; the lease is held until the
    /// iterator is exhausted, closed or dropped.
    #[instrument(skip_all, fields(path = ?self.path()))]
    pub fn iterator(
        &self,
        options: IterOptions,
    ) -> Result<ScopedIter<'_, E>> {
        options.validate()?;
        let guard = self.hold(None)?;
        Ok(ScopedIter::new(guard, options))
    }

    /// Opens a write batch that keeps the handle open until it is committed,
    /// discarded or dropped. Blocks until the handle can be opened.
    #[instrument(skip_all, fields(path = ?self.path()))]
    pub fn write_batch(
        &self,
        options: BatchOptions,
    ) -> Result<ScopedBatch<'_, E>> {
        let guard = self.hold(None)?;
        let batch = self.with_held_handle(|handle| Ok(handle.write_batch(options)))?;
        Ok(ScopedBatch::new(guard, batch))
    }

    /// Runs `f` against a write batch.
    ///
    /// `Ok` commits. `Err` discards a transactional batch and commits a
    /// non-transactional one before the error is returned. The lease is
    /// released either way.
    pub fn batch<T>(
        &self,
        options: BatchOptions,
        f: impl FnOnce(&mut ScopedBatch<'_, E>) -> Result<T>,
    ) -> Result<T> {
        let mut batch = self.write_batch(options)?;
        let value = f(&mut batch)?;
        batch.commit()?;
        Ok(value)
    }

    /// Keeps the handle open until the returned guard is dropped.
    ///
    /// Waits at most `default_timeout` for the handle to open.
    pub fn scope(&self) -> Result<LeaseGuard<'_, E>> {
        self.hold(Some(self.config().default_timeout()))
    }

    /// Runs `f` while the handle is held open, releasing it afterwards.
    pub fn with_scope<T>(
        &self,
        f: impl FnOnce(&Self) -> Result<T>,
    ) -> Result<T> {
        let _guard = self.scope()?;
        f(self)
    }
}
