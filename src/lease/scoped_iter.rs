use std::iter::FusedIterator;

use tracing::debug;

use super::lease_guard::LeaseGuard;
use crate::EngineHandle;
use crate::IterItem;
use crate::IterOptions;
use crate::Result;
use crate::StorageEngine;

type CursorOf<E> = <<E as StorageEngine>::Handle as EngineHandle>::Cursor;

enum IterState<'a, E: StorageEngine> {
    /// Lease taken, cursor not created yet
    Pending(LeaseGuard<'a, E>),
    Active {
        cursor: CursorOf<E>,
        // Dropped after the cursor
        _guard: LeaseGuard<'a, E>,
    },
    Done,
}

/// Lazy traversal of the store under one scoped lease.
///
/// The lease is taken when the iterator is created; the engine cursor is
/// attached on the first call to `next`. The handle stays open until the
/// iterator is exhausted, closed or dropped, whichever comes first. An error
/// from the cursor is yielded once and ends the traversal.
///
/// The attached cursor owns its view of the store. If the manager is closed
/// mid-traversal the cursor keeps yielding, and with sled the store's file
/// lock stays held until the iterator is dropped.
pub struct ScopedIter<'a, E: StorageEngine> {
    options: IterOptions,
    state: IterState<'a, E>,
}

impl<'a, E: StorageEngine> ScopedIter<'a, E> {
    pub(crate) fn new(
        guard: LeaseGuard<'a, E>,
        options: IterOptions,
    ) -> Self {
        Self {
            options,
            state: IterState::Pending(guard),
        }
    }

    pub fn options(&self) -> &IterOptions {
        &self.options
    }

    /// Whether the iterator still holds its lease
    pub fn is_open(&self) -> bool {
        !matches!(self.state, IterState::Done)
    }

    /// Stops the traversal early and ends the lease.
    pub fn close(&mut self) {
        if self.is_open() {
            debug!("scoped iterator closed");
        }
        self.state = IterState::Done;
    }

    fn attach(
        &mut self,
        guard: LeaseGuard<'a, E>,
    ) -> Result<()> {
        let options = &self.options;
        let cursor = guard
            .manager()
            .with_held_handle(|handle| Ok(handle.iter(options)))?;
        self.state = IterState::Active {
            cursor,
            _guard: guard,
        };
        Ok(())
    }
}

impl<E: StorageEngine> Iterator for ScopedIter<'_, E> {
    type Item = Result<IterItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if let IterState::Pending(_) = self.state {
            let IterState::Pending(guard) = std::mem::replace(&mut self.state, IterState::Done)
            else {
                return None;
            };
            if let Err(e) = self.attach(guard) {
                return Some(Err(e));
            }
        }

        let IterState::Active { cursor, .. } = &mut self.state else {
            return None;
        };

        match cursor.next() {
            Some(Ok((key, value))) => Some(Ok(self.options.project(key, value))),
            Some(Err(e)) => {
                self.state = IterState::Done;
                Some(Err(e))
            }
            None => {
                debug!("scoped iterator exhausted");
                self.state = IterState::Done;
                None
            }
        }
    }
}

impl<E: StorageEngine> FusedIterator for ScopedIter<'_, E> {}

impl<E: StorageEngine> std::fmt::Debug for ScopedIter<'_, E> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let state = match self.state {
            IterState::Pending(_) => "pending",
            IterState::Active { .. } => "active",
            IterState::Done => "done",
        };
        f.debug_struct("ScopedIter")
            .field("options", &self.options)
            .field("state", &state)
            .finish()
    }
}
