use super::lease_manager::LeaseManager;
use crate::StorageEngine;

/// A scoped, indefinite lease on the manager's handle.
///
/// While any guard is alive the handle is never auto-closed. Dropping the last
/// guard releases the handle, which then closes at the releaser's next wake
/// unless another acquisition intervenes. Guards nest: an iterator running
/// inside a write batch keeps the handle open until both are done.
#[must_use = "the lease ends as soon as the guard is dropped"]
pub struct LeaseGuard<'a, E: StorageEngine> {
    manager: &'a LeaseManager<E>,
}

impl<'a, E: StorageEngine> LeaseGuard<'a, E> {
    pub(crate) fn new(manager: &'a LeaseManager<E>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &'a LeaseManager<E> {
        self.manager
    }
}

impl<E: StorageEngine> Drop for LeaseGuard<'_, E> {
    fn drop(&mut self) {
        self.manager.unhold();
    }
}

impl<E: StorageEngine> std::fmt::Debug for LeaseGuard<'_, E> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LeaseGuard")
            .field("path", &self.manager.path())
            .finish()
    }
}
