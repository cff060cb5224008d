//! Time-leased handle manager
//!
//! Owns at most one open engine handle for a store path and closes it once its
//! lease runs out, so idle stores give back their file descriptors and locks.
//!
//! # State machine
//!
//! ```text
//!                 acquire                        suspend / hold
//!   ┌────────┐ ───────────> ┌──────────────┐ ──────────────> ┌────────────────┐
//!   │ Closed │              │ Open (leased │                 │ Open           │
//!   │ handle │ <─────────── │ until T)     │ <────────────── │ (indefinite)   │
//!   └────────┘  releaser    └──────────────┘ release/restart └────────────────┘
//!        │      wakes at T          │                                │
//!        └──────────────────────────┴────────── close() ─────────────┴──> Terminated
//! ```
//!
//! One mutex/condvar pair guards every transition. Public methods take the
//! lock; `*_locked` helpers expect it to be held already, so composite
//! operations never re-enter the mutex.

use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use parking_lot::Condvar;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::deadline::Deadline;
use super::deadline::ReleaseInterval;
use super::lease_guard::LeaseGuard;
use crate::constants::RELEASER_POLL_INTERVAL;
use crate::constants::RELEASER_THREAD_NAME;
use crate::EngineHandle;
use crate::Error;
use crate::LeaseConfig;
use crate::LeaseError;
use crate::Result;
use crate::StorageEngine;

/// Handle state guarded by the manager lock.
///
/// Invariant: `handle.is_some()` exactly when `deadline != Deadline::Absent`.
struct LeaseState<H> {
    handle: Option<H>,
    deadline: Deadline,
    /// Outstanding scoped leases; while non-zero the deadline stays indefinite
    holds: usize,
    closed: bool,
}

struct Shared<E: StorageEngine> {
    engine: E,
    config: LeaseConfig,
    state: Mutex<LeaseState<E::Handle>>,
    wakeup: Condvar,
}

/// Reference-counted, time-leased owner of one engine handle.
///
/// The handle is opened lazily by the first operation, kept open while it is
/// in use and closed by a background releaser thread once the lease deadline
/// passes. Dropping the manager closes it.
pub struct LeaseManager<E: StorageEngine> {
    shared: Arc<Shared<E>>,
    releaser: Mutex<Option<JoinHandle<()>>>,
}

impl<E: StorageEngine> std::fmt::Debug for LeaseManager<E> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LeaseManager")
            .field("path", &self.shared.config.path)
            .finish()
    }
}

impl<E: StorageEngine> Drop for LeaseManager<E> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<E: StorageEngine> LeaseManager<E> {
    /// Validates `config` and starts the releaser thread. No handle is opened
    /// until the first acquisition.
    pub fn new(
        engine: E,
        config: LeaseConfig,
    ) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            engine,
            config,
            state: Mutex::new(LeaseState {
                handle: None,
                deadline: Deadline::Absent,
                holds: 0,
                closed: false,
            }),
            wakeup: Condvar::new(),
        });

        let releaser = {
            let shared = shared.clone();
            std::thread::Builder::new()
                .name(RELEASER_THREAD_NAME.into())
                .spawn(move || shared.run_releaser())
                .map_err(LeaseError::ReleaserSpawn)?
        };

        debug!(path = ?shared.config.path, "lease manager started");

        Ok(Self {
            shared,
            releaser: Mutex::new(Some(releaser)),
        })
    }

    pub fn config(&self) -> &LeaseConfig {
        &self.shared.config
    }

    pub fn path(&self) -> &Path {
        &self.shared.config.path
    }

    pub fn engine(&self) -> &E {
        &self.shared.engine
    }

    /// Ensures the handle is open and extends its lease.
    ///
    /// `interval` defaults to `auto_release_interval`, `timeout` to
    /// `default_timeout`. While the store is locked by another opener the open
    /// is retried every `retry_interval` until `timeout` elapses; `Ok(false)`
    /// means the timeout won. A zero timeout makes exactly one attempt.
    pub fn acquire(
        &self,
        interval: Option<ReleaseInterval>,
        timeout: Option<Duration>,
    ) -> Result<bool> {
        let interval = interval.unwrap_or(self.default_interval());
        let limit = self.limit(timeout);
        let mut state = self.shared.state.lock();
        self.shared.acquire_locked(&mut state, interval, limit)
    }

    /// Marks the lease as expired so the releaser closes the handle at its
    /// next wake. Deferred while scoped leases are outstanding; no-op when
    /// the handle is not open.
    pub fn release(&self) {
        let mut state = self.shared.state.lock();
        self.shared.release_locked(&mut state);
    }

    /// Keeps the handle open until it is released or restarted.
    ///
    /// When the handle is not open it is acquired indefinitely if `acquire`
    /// is set. Returns whether the handle is open afterwards.
    pub fn suspend_releaser(
        &self,
        acquire: bool,
        timeout: Option<Duration>,
    ) -> Result<bool> {
        let mut state = self.shared.state.lock();
        self.shared.ensure_active(&state)?;

        if state.handle.is_some() {
            self.shared.set_deadline_locked(&mut state, Deadline::Indefinite);
            Ok(true)
        } else if acquire {
            let limit = self.limit(timeout);
            self.shared
                .acquire_locked(&mut state, ReleaseInterval::Indefinite, limit)
        } else {
            Ok(false)
        }
    }

    /// Restarts the countdown at `now + interval` (default
    /// `auto_release_interval`).
    ///
    /// When the handle is not open it is acquired with that interval if
    /// `acquire` is set. Returns whether the handle is open afterwards.
    pub fn restart_releaser(
        &self,
        interval: Option<Duration>,
        acquire: bool,
        timeout: Option<Duration>,
    ) -> Result<bool> {
        let interval = interval.map(ReleaseInterval::After).unwrap_or(self.default_interval());
        let mut state = self.shared.state.lock();
        self.shared.ensure_active(&state)?;

        if state.handle.is_some() {
            self.shared.extend_locked(&mut state, interval);
            Ok(true)
        } else if acquire {
            let limit = self.limit(timeout);
            self.shared.acquire_locked(&mut state, interval, limit)
        } else {
            Ok(false)
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.shared.state.lock().handle.is_some()
    }

    /// Whether the open handle is currently exempt from auto-close
    pub fn releaser_is_suspended(&self) -> bool {
        self.shared.state.lock().deadline == Deadline::Indefinite
    }

    /// Time left before the releaser may close the handle; `None` when the
    /// handle is closed or the lease is indefinite.
    pub fn lease_remaining(&self) -> Option<Duration> {
        self.shared.state.lock().deadline.remaining(Instant::now())
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Stops the releaser, closing the handle if it is open, and waits for the
    /// releaser thread to exit. Every later operation fails with
    /// [`LeaseError::ManagerClosed`]. Idempotent.
    ///
    /// Closing does not wait for active [`ScopedIter`](crate::ScopedIter)s.
    /// Their cursors keep working, and an engine whose cursors pin the store
    /// (sled) keeps its file lock until they are dropped.
    pub fn close(&self) {
        {
            let mut state = self.shared.state.lock();
            if !state.closed {
                state.closed = true;
                info!(path = ?self.shared.config.path, "closing lease manager");
            }
            self.shared.wakeup.notify_all();
        }

        if let Some(releaser) = self.releaser.lock().take() {
            if releaser.join().is_err() {
                error!(path = ?self.shared.config.path, "releaser thread panicked");
            }
        }
    }

    // ------------------------------------------------------------------
    // Crate-internal primitives for scoped leases and the operation facade

    /// Takes a scoped, indefinite lease. `timeout: None` retries until the
    /// store can be opened or the manager is closed.
    pub(crate) fn hold(
        &self,
        timeout: Option<Duration>,
    ) -> Result<LeaseGuard<'_, E>> {
        let limit = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut state = self.shared.state.lock();

        if !self
            .shared
            .acquire_locked(&mut state, ReleaseInterval::Indefinite, limit)?
        {
            return Err(self.timeout_error(timeout.unwrap_or_default()));
        }

        state.holds += 1;
        trace!(holds = state.holds, "lease hold taken");
        Ok(LeaseGuard::new(self))
    }

    /// Ends one scoped lease; the last one releases the handle.
    pub(crate) fn unhold(&self) {
        let mut state = self.shared.state.lock();
        state.holds = state.holds.saturating_sub(1);
        trace!(holds = state.holds, "lease hold dropped");

        if state.holds == 0 {
            self.shared.release_locked(&mut state);
        }
    }

    /// Runs `f` against the handle with a default lease: acquired with the
    /// default timeout before the call, extended again once it completes.
    pub(crate) fn with_handle<R>(
        &self,
        f: impl FnOnce(&E::Handle) -> Result<R>,
    ) -> Result<R> {
        let interval = self.default_interval();
        let timeout = self.shared.config.default_timeout();
        let mut state = self.shared.state.lock();

        if !self
            .shared
            .acquire_locked(&mut state, interval, Instant::now().checked_add(timeout))?
        {
            return Err(self.timeout_error(timeout));
        }

        let handle = state.handle.as_ref().ok_or_else(|| self.closed_error())?;
        let result = f(handle);
        self.shared.extend_locked(&mut state, interval);
        result
    }

    /// Runs `f` against the handle on behalf of an outstanding hold.
    pub(crate) fn with_held_handle<R>(
        &self,
        f: impl FnOnce(&E::Handle) -> Result<R>,
    ) -> Result<R> {
        let mut state = self.shared.state.lock();

        if !self
            .shared
            .acquire_locked(&mut state, ReleaseInterval::Indefinite, None)?
        {
            return Err(self.timeout_error(Duration::ZERO));
        }

        let handle = state.handle.as_ref().ok_or_else(|| self.closed_error())?;
        f(handle)
    }

    fn default_interval(&self) -> ReleaseInterval {
        ReleaseInterval::After(self.shared.config.auto_release_interval())
    }

    /// Retry limit for `timeout`; `None` when it lies beyond any
    /// representable instant.
    fn limit(
        &self,
        timeout: Option<Duration>,
    ) -> Option<Instant> {
        Instant::now().checked_add(timeout.unwrap_or(self.shared.config.default_timeout()))
    }

    fn timeout_error(
        &self,
        timeout: Duration,
    ) -> Error {
        LeaseError::AcquisitionTimeout {
            path: self.shared.config.path.clone(),
            timeout,
        }
        .into()
    }

    fn closed_error(&self) -> Error {
        self.shared.closed_error()
    }
}

impl<E: StorageEngine> Shared<E> {
    fn closed_error(&self) -> Error {
        LeaseError::ManagerClosed {
            path: self.config.path.clone(),
        }
        .into()
    }

    fn ensure_active(
        &self,
        state: &LeaseState<E::Handle>,
    ) -> Result<()> {
        if state.closed {
            return Err(self.closed_error());
        }
        Ok(())
    }

    /// Opens the handle if needed, then extends the lease by `interval`.
    ///
    /// `limit: None` retries forever. Retry pauses wait on the condvar, so the
    /// lock is free while sleeping and `close()` interrupts the wait.
    fn acquire_locked(
        &self,
        state: &mut MutexGuard<'_, LeaseState<E::Handle>>,
        interval: ReleaseInterval,
        limit: Option<Instant>,
    ) -> Result<bool> {
        let mut attempts: u32 = 0;

        while state.handle.is_none() {
            self.ensure_active(state)?;
            attempts += 1;

            match self.engine.open(&self.config.path) {
                Ok(handle) => {
                    info!(path = ?self.config.path, attempts, "db handle opened");
                    // Published together so the releaser never sees an open
                    // handle without a deadline
                    state.deadline = next_deadline(state.holds, interval);
                    state.handle = Some(handle);
                    self.wakeup.notify_all();
                }
                Err(e) if e.is_transient() => {
                    let now = Instant::now();
                    let pause = match limit {
                        Some(limit) if now >= limit => {
                            debug!(path = ?self.config.path, attempts, "acquisition timed out");
                            return Ok(false);
                        }
                        Some(limit) => self.config.retry_interval().min(limit - now),
                        None => self.config.retry_interval(),
                    };

                    if attempts == 1 {
                        warn!(path = ?self.config.path, "db is busy, retrying: {}", e);
                    } else {
                        trace!(path = ?self.config.path, attempts, "db still busy");
                    }
                    self.wakeup.wait_for(state, pause);
                }
                Err(e) => {
                    error!(path = ?self.config.path, "failed to open db: {:?}", e);
                    return Err(e);
                }
            }
        }

        // The handle may have been opened while we waited; closing still wins
        self.ensure_active(state)?;
        self.extend_locked(state, interval);
        Ok(true)
    }

    /// Moves the deadline to `now + interval`, unless scoped leases pin it
    /// to indefinite.
    fn extend_locked(
        &self,
        state: &mut LeaseState<E::Handle>,
        interval: ReleaseInterval,
    ) {
        let next = next_deadline(state.holds, interval);
        self.set_deadline_locked(state, next);
    }

    fn release_locked(
        &self,
        state: &mut LeaseState<E::Handle>,
    ) {
        if state.handle.is_none() {
            return;
        }
        if state.holds > 0 {
            debug!(holds = state.holds, "release deferred until scoped leases end");
            return;
        }
        self.set_deadline_locked(state, Deadline::At(Instant::now()));
    }

    /// Applies a deadline change and wakes the releaser, subject to the
    /// debounce rule. Returns whether the deadline changed.
    fn set_deadline_locked(
        &self,
        state: &mut LeaseState<E::Handle>,
        next: Deadline,
    ) -> bool {
        if state.handle.is_none() || !state.deadline.accepts(&next) {
            trace!(current = ?state.deadline, ?next, "deadline update skipped");
            return false;
        }

        debug!(from = ?state.deadline, to = ?next, "lease deadline updated");
        state.deadline = next;
        self.wakeup.notify_all();
        true
    }

    fn close_handle_locked(
        &self,
        state: &mut LeaseState<E::Handle>,
    ) {
        if let Some(handle) = state.handle.take() {
            match handle.close() {
                Ok(()) => info!(path = ?self.config.path, "db handle closed"),
                Err(e) => error!(path = ?self.config.path, ?e, "failed to close db handle"),
            }
        }
        state.deadline = Deadline::Absent;
        // Acquirers waiting on a busy path may now succeed
        self.wakeup.notify_all();
    }

    /// Maintenance loop: closes the handle once its deadline has passed.
    ///
    /// Each wait is bounded by the time left on the lease and by
    /// [`RELEASER_POLL_INTERVAL`], so a missed notification delays a close by
    /// at most one poll.
    fn run_releaser(&self) {
        debug!(path = ?self.config.path, "releaser started");
        let mut state = self.state.lock();

        while !state.closed {
            let now = Instant::now();
            if state.handle.is_some() && state.deadline.is_expired(now) {
                self.close_handle_locked(&mut state);
                continue;
            }

            let pause = state
                .deadline
                .remaining(now)
                .map_or(RELEASER_POLL_INTERVAL, |left| left.min(RELEASER_POLL_INTERVAL));
            self.wakeup.wait_for(&mut state, pause);
        }

        self.close_handle_locked(&mut state);
        debug!(path = ?self.config.path, "releaser stopped");
    }
}

/// Deadline granted by `interval`, unless scoped leases pin it to indefinite.
fn next_deadline(
    holds: usize,
    interval: ReleaseInterval,
) -> Deadline {
    if holds > 0 {
        Deadline::Indefinite
    } else {
        Deadline::after(interval, Instant::now())
    }
}
