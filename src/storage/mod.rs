//! Engine adapter contract
//!
//! The lease manager never interprets stored data. It only needs to open a
//! handle for a path, run point operations, build atomic batches, walk a cursor
//! and close the handle again. Everything about on-disk format, compaction or
//! durability stays inside the engine behind these traits.
mod adaptors;


use std::path::Path;

pub use adaptors::*;
use bytes::Bytes;
#[cfg(test)]
use mockall::automock;

use crate::Result;
use crate::StorageError;

/// Opens engine handles for a store path.
///
/// `open` reports lock contention by another opener as
/// [`StorageError::Busy`]; the lease manager retries those and propagates
/// every other error unchanged.
#[cfg_attr(test, automock(type Handle = crate::MemHandle;))]
pub trait StorageEngine: Send + Sync + 'static {
    type Handle: EngineHandle;

    fn open(
        &self,
        path: &Path,
    ) -> Result<Self::Handle>;
}

/// An open connection to one store.
pub trait EngineHandle: Send + 'static {
    type Batch: EngineBatch;

    /// Entries yielded by the cursor are owned, so the cursor may outlive the
    /// borrow of the handle that produced it. A cursor may also keep the
    /// underlying store alive: with sled, the file lock is held until every
    /// cursor over the closed handle has been dropped.
    type Cursor: Iterator<Item = Result<(Bytes, Bytes)>> + Send + 'static;

    fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<Bytes>>;

    fn put(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<()>;

    fn delete(
        &self,
        key: &[u8],
    ) -> Result<()>;

    fn write_batch(
        &self,
        options: BatchOptions,
    ) -> Self::Batch;

    /// Applies every buffered operation atomically.
    fn commit_batch(
        &self,
        batch: Self::Batch,
    ) -> Result<()>;

    fn iter(
        &self,
        options: &IterOptions,
    ) -> Self::Cursor;

    /// Persists buffered writes to stable storage.
    fn flush(&self) -> Result<()>;

    /// Releases the handle and whatever lock it holds on the path.
    fn close(self) -> Result<()>;
}

/// Write operations buffered for one atomic commit.
pub trait EngineBatch: Send + 'static {
    fn put(
        &mut self,
        key: &[u8],
        value: &[u8],
    );

    fn delete(
        &mut self,
        key: &[u8],
    );

    /// Drops every buffered operation.
    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn options(&self) -> BatchOptions;
}

/// How a write batch behaves on commit and on failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Discard buffered writes when the scope exits with an error
    pub transactional: bool,
    /// Flush the engine after the batch is applied
    pub sync: bool,
}

impl BatchOptions {
    pub fn transactional() -> Self {
        Self {
            transactional: true,
            sync: false,
        }
    }

    pub fn with_sync(
        mut self,
        sync: bool,
    ) -> Self {
        self.sync = sync;
        self
    }
}

/// Parameters of one traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterOptions {
    pub include_key: bool,
    pub include_value: bool,
    /// Restrict the traversal to keys starting with this prefix
    pub prefix: Option<Bytes>,
    /// Walk keys in descending order
    pub reverse: bool,
}

impl Default for IterOptions {
    fn default() -> Self {
        Self {
            include_key: true,
            include_value: true,
            prefix: None,
            reverse: false,
        }
    }
}

impl IterOptions {
    pub fn keys_only() -> Self {
        Self {
            include_value: false,
            ..Default::default()
        }
    }

    pub fn values_only() -> Self {
        Self {
            include_key: false,
            ..Default::default()
        }
    }

    pub fn with_prefix(
        mut self,
        prefix: impl Into<Bytes>,
    ) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.include_key && !self.include_value {
            return Err(StorageError::InvalidArgument(
                "iterator must include keys, values, or both".into(),
            )
            .into());
        }
        Ok(())
    }

    /// Shapes a raw cursor entry according to the include flags.
    pub(crate) fn project(
        &self,
        key: Bytes,
        value: Bytes,
    ) -> IterItem {
        match (self.include_key, self.include_value) {
            (true, true) => IterItem::Pair(key, value),
            (true, false) => IterItem::Key(key),
            _ => IterItem::Value(value),
        }
    }
}

/// One entry produced by a scoped iterator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterItem {
    Pair(Bytes, Bytes),
    Key(Bytes),
    Value(Bytes),
}

impl IterItem {
    pub fn key(&self) -> Option<&Bytes> {
        match self {
            IterItem::Pair(k, _) | IterItem::Key(k) => Some(k),
            IterItem::Value(_) => None,
        }
    }

    pub fn value(&self) -> Option<&Bytes> {
        match self {
            IterItem::Pair(_, v) | IterItem::Value(v) => Some(v),
            IterItem::Key(_) => None,
        }
    }
}
