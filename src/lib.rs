//! # leasekv
//!
//! A time-leased handle manager for embedded key-value stores.
//!
//! [`LeaseManager`] owns at most one open handle to a store path. The handle
//! is opened by the first operation, kept open while it is in use and closed
//! by a background releaser once it has been idle for
//! `auto_release_interval`, giving the store's file lock back to other
//! openers. Iterators and write batches hold the handle open for their whole
//! lifetime and release it on every exit path.
//!
//! ```no_run
//! use leasekv::BatchOptions;
//! use leasekv::LeaseConfig;
//! use leasekv::LeaseManager;
//! use leasekv::SledConfig;
//! use leasekv::SledEngine;
//!
//! # fn main() -> leasekv::Result<()> {
//! let db = LeaseManager::new(
//!     SledEngine::new(SledConfig::default()),
//!     LeaseConfig::with_path("/tmp/leasekv-demo"),
//! )?;
//!
//! db.put("a", "1")?;
//! assert_eq!(db.get("a")?.as_deref(), Some(&b"1"[..]));
//!
//! db.batch(BatchOptions::transactional(), |batch| {
//!     batch.put("b", "2");
//!     batch.delete("a");
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! Storage engines plug in through [`StorageEngine`]; [`SledEngine`] is the
//! on-disk adapter and [`MemEngine`] an in-memory one with the same locking
//! behavior.

mod config;
mod constants;
mod errors;
mod lease;
mod storage;

pub use config::*;
pub use errors::*;
pub use lease::*;
pub use storage::*;


//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
