use std::io::ErrorKind;
use std::path::Path;

use bytes::Bytes;
use sled::Batch;
use sled::Db;
use tracing::instrument;
use tracing::trace;
use tracing::warn;

use crate::BatchOptions;
use crate::EngineBatch;
use crate::EngineHandle;
use crate::Error;
use crate::IterOptions;
use crate::Result;
use crate::SledConfig;
use crate::StorageEngine;
use crate::StorageError;

/// Storage engine backed by sled
#[derive(Debug, Clone, Default)]
pub struct SledEngine {
    config: SledConfig,
}

impl SledEngine {
    pub fn new(config: SledConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SledConfig {
        &self.config
    }
}

impl StorageEngine for SledEngine {
    type Handle = SledHandle;

    #[instrument(skip(self))]
    fn open(
        &self,
        path: &Path,
    ) -> Result<Self::Handle> {
        let db = sled::Config::default()
            .path(path)
            .cache_capacity(self.config.cache_capacity)
            .flush_every_ms(self.config.flush_every_ms)
            .use_compression(self.config.use_compression)
            .compression_factor(1)
            .mode(self.config.mode.into())
            .open()
            .map_err(|e| classify_open_error(path, e))?;

        trace!(?path, "sled db opened");
        Ok(SledHandle { db })
    }
}

/// Maps a file lock conflict to the retryable busy signal.
fn classify_open_error(
    path: &Path,
    err: sled::Error,
) -> Error {
    if let sled::Error::Io(io) = &err {
        if io.kind() == ErrorKind::WouldBlock || io.to_string().contains("could not acquire") {
            return StorageError::Busy {
                path: path.to_path_buf(),
            }
            .into();
        }
    }

    warn!(
        "Try to open DB at this location: {:?} and failed: {:?}",
        path, err
    );
    err.into()
}

/// Open sled database
pub struct SledHandle {
    db: Db,
}

impl std::fmt::Debug for SledHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SledHandle").finish()
    }
}

impl EngineHandle for SledHandle {
    type Batch = SledBatch;
    type Cursor = SledCursor;

    fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<Bytes>> {
        Ok(self.db.get(key)?.map(|ivec| Bytes::copy_from_slice(&ivec)))
    }

    fn put(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<()> {
        self.db.insert(key, value)?;
        Ok(())
    }

    fn delete(
        &self,
        key: &[u8],
    ) -> Result<()> {
        self.db.remove(key)?;
        Ok(())
    }

    fn write_batch(
        &self,
        options: BatchOptions,
    ) -> Self::Batch {
        SledBatch {
            batch: Batch::default(),
            len: 0,
            options,
        }
    }

    #[instrument(skip_all, fields(len = batch.len, sync = batch.options.sync))]
    fn commit_batch(
        &self,
        batch: Self::Batch,
    ) -> Result<()> {
        let sync = batch.options.sync;
        self.db.apply_batch(batch.batch)?;
        if sync {
            self.db.flush()?;
        }
        Ok(())
    }

    fn iter(
        &self,
        options: &IterOptions,
    ) -> Self::Cursor {
        let inner = match &options.prefix {
            Some(prefix) => self.db.scan_prefix(prefix.as_ref()),
            None => self.db.iter(),
        };
        SledCursor {
            inner,
            reverse: options.reverse,
        }
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn close(self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

/// Buffered writes for one [`SledHandle::commit_batch`]
pub struct SledBatch {
    batch: Batch,
    len: usize,
    options: BatchOptions,
}

impl std::fmt::Debug for SledBatch {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SledBatch")
            .field("len", &self.len)
            .field("options", &self.options)
            .finish()
    }
}

impl EngineBatch for SledBatch {
    fn put(
        &mut self,
        key: &[u8],
        value: &[u8],
    ) {
        self.batch.insert(key, value);
        self.len += 1;
    }

    fn delete(
        &mut self,
        key: &[u8],
    ) {
        self.batch.remove(key);
        self.len += 1;
    }

    fn clear(&mut self) {
        self.batch = Batch::default();
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn options(&self) -> BatchOptions {
        self.options
    }
}

/// Lazy cursor over a sled tree
pub struct SledCursor {
    inner: sled::Iter,
    reverse: bool,
}

impl Iterator for SledCursor {
    type Item = Result<(Bytes, Bytes)>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = if self.reverse {
            self.inner.next_back()
        } else {
            self.inner.next()
        };

        next.map(|entry| {
            entry
                .map(|(k, v)| (Bytes::copy_from_slice(&k), Bytes::copy_from_slice(&v)))
                .map_err(Error::from)
        })
    }
}
