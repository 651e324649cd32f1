// SPDX-License-Identifier: MIT

use super::*;
use gc_core::SessionName;

fn session() -> SessionName {
    SessionName::new("acme--mayor")
}

#[test]
fn zero_max_restarts_is_null() {
    let tracker = CrashTracker::new(0, Duration::from_secs(60));
    assert!(tracker.is_null());
    let s = session();
    tracker.record_start(&s, 100);
    assert!(!tracker.is_quarantined(&s, 100));
}

#[test]
fn negative_max_restarts_is_null() {
    let tracker = CrashTracker::new(-1, Duration::from_secs(60));
    assert!(tracker.is_null());
}

#[test]
fn quarantines_after_nth_start_within_window() {
    let tracker = CrashTracker::new(3, Duration::from_secs(60));
    let s = session();

    tracker.record_start(&s, 0);
    assert!(!tracker.is_quarantined(&s, 0));

    tracker.record_start(&s, 10);
    assert!(!tracker.is_quarantined(&s, 10));

    tracker.record_start(&s, 20);
    assert!(tracker.is_quarantined(&s, 20));
}

#[test]
fn window_expiry_clears_quarantine() {
    let tracker = CrashTracker::new(2, Duration::from_secs(60));
    let s = session();

    tracker.record_start(&s, 0);
    tracker.record_start(&s, 10);
    assert!(tracker.is_quarantined(&s, 10));

    // All starts fall outside the 60s window relative to now=71.
    assert!(!tracker.is_quarantined(&s, 71));
}

#[test]
fn clear_history_resets_quarantine() {
    let tracker = CrashTracker::new(1, Duration::from_secs(60));
    let s = session();

    tracker.record_start(&s, 0);
    assert!(tracker.is_quarantined(&s, 0));

    tracker.clear_history(&s);
    assert!(!tracker.is_quarantined(&s, 0));
}

#[test]
fn sessions_are_tracked_independently() {
    let tracker = CrashTracker::new(1, Duration::from_secs(60));
    let a = SessionName::new("acme--a");
    let b = SessionName::new("acme--b");

    tracker.record_start(&a, 0);
    assert!(tracker.is_quarantined(&a, 0));
    assert!(!tracker.is_quarantined(&b, 0));
}
