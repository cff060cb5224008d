use std::time::Duration;
use std::time::Instant;

use super::deadline::Deadline;
use super::deadline::ReleaseInterval;

#[test]
fn test_after_builds_finite_and_indefinite_deadlines() {
    let now = Instant::now();
    assert_eq!(
        Deadline::after(ReleaseInterval::After(Duration::from_secs(1)), now),
        Deadline::At(now + Duration::from_secs(1))
    );
    assert_eq!(
        Deadline::after(ReleaseInterval::Indefinite, now),
        Deadline::Indefinite
    );
}

#[test]
fn test_only_finite_deadlines_expire() {
    let now = Instant::now();
    assert!(Deadline::At(now).is_expired(now));
    assert!(!Deadline::At(now + Duration::from_millis(1)).is_expired(now));
    assert!(!Deadline::Indefinite.is_expired(now));
    assert!(!Deadline::Absent.is_expired(now));
}

#[test]
fn test_remaining() {
    let now = Instant::now();
    assert_eq!(
        Deadline::At(now + Duration::from_millis(300)).remaining(now),
        Some(Duration::from_millis(300))
    );
    // Past deadlines report zero rather than underflowing
    assert_eq!(
        Deadline::At(now).remaining(now + Duration::from_secs(1)),
        Some(Duration::ZERO)
    );
    assert_eq!(Deadline::Indefinite.remaining(now), None);
    assert_eq!(Deadline::Absent.remaining(now), None);
}

#[test]
fn test_small_shifts_are_debounced() {
    let now = Instant::now();
    let current = Deadline::At(now);

    assert!(!current.accepts(&Deadline::At(now)));
    assert!(!current.accepts(&Deadline::At(now + Duration::from_millis(100))));
    assert!(!current.accepts(&Deadline::At(now - Duration::from_millis(100))));
    assert!(current.accepts(&Deadline::At(now + Duration::from_millis(101))));
    assert!(current.accepts(&Deadline::At(now - Duration::from_millis(101))));
}

#[test]
fn test_kind_changes_always_apply() {
    let now = Instant::now();

    assert!(Deadline::Indefinite.accepts(&Deadline::At(now)));
    assert!(Deadline::At(now).accepts(&Deadline::Indefinite));
    assert!(Deadline::Absent.accepts(&Deadline::At(now)));
    assert!(Deadline::Absent.accepts(&Deadline::Indefinite));
    assert!(Deadline::At(now).accepts(&Deadline::Absent));

    assert!(!Deadline::Indefinite.accepts(&Deadline::Indefinite));
    assert!(!Deadline::Absent.accepts(&Deadline::Absent));
}

#[test]
fn test_duration_converts_to_finite_interval() {
    let interval: ReleaseInterval = Duration::from_millis(5).into();
    assert_eq!(interval, ReleaseInterval::After(Duration::from_millis(5)));
}

#[test]
fn test_unrepresentable_interval_is_indefinite() {
    let now = Instant::now();
    assert_eq!(
        Deadline::after(ReleaseInterval::After(Duration::MAX), now),
        Deadline::Indefinite
    );
}
