use std::time::Duration;
use std::time::Instant;

use crate::constants::DEADLINE_DEBOUNCE;

/// How long a lease lasts once granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseInterval {
    /// Expire this long after the lease is granted or extended
    After(Duration),
    /// Never expire until explicitly released
    Indefinite,
}

impl From<Duration> for ReleaseInterval {
    fn from(interval: Duration) -> Self {
        ReleaseInterval::After(interval)
    }
}

/// Instant at which the releaser may close the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Deadline {
    /// No handle is open
    Absent,
    /// Suspended: the handle stays open until released
    Indefinite,
    At(Instant),
}

impl Deadline {
    /// An interval too long to represent as an instant never expires.
    pub(crate) fn after(
        interval: ReleaseInterval,
        now: Instant,
    ) -> Self {
        match interval {
            ReleaseInterval::After(d) => now
                .checked_add(d)
                .map_or(Deadline::Indefinite, Deadline::At),
            ReleaseInterval::Indefinite => Deadline::Indefinite,
        }
    }

    pub(crate) fn is_expired(
        &self,
        now: Instant,
    ) -> bool {
        matches!(self, Deadline::At(at) if *at <= now)
    }

    /// Time left on a finite lease
    pub(crate) fn remaining(
        &self,
        now: Instant,
    ) -> Option<Duration> {
        match self {
            Deadline::At(at) => Some(at.saturating_duration_since(now)),
            _ => None,
        }
    }

    /// Debounce rule for deadline updates.
    ///
    /// Moving between absent, indefinite and finite always applies. A finite
    /// deadline only moves when the shift exceeds [`DEADLINE_DEBOUNCE`].
    pub(crate) fn accepts(
        &self,
        next: &Deadline,
    ) -> bool {
        match (self, next) {
            (Deadline::At(current), Deadline::At(next)) => {
                let shift = if next > current {
                    *next - *current
                } else {
                    *current - *next
                };
                shift > DEADLINE_DEBOUNCE
            }
            (current, next) => current != next,
        }
    }
}
