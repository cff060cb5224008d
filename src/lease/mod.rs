mod deadline;
mod lease_guard;
mod lease_manager;
mod operations;
mod scoped_batch;
mod scoped_iter;

#[cfg(test)]
mod deadline_test;

pub use deadline::ReleaseInterval;
pub use lease_guard::*;
pub use lease_manager::*;
pub use scoped_batch::ScopedBatch;
pub use scoped_iter::ScopedIter;
