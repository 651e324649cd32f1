// SPDX-License-Identifier: MIT

//! Sliding-window restart counter used to quarantine a session that keeps
//! crashing instead of restarting it forever.

use std::collections::HashMap;
use std::time::Duration;

use gc_core::SessionName;
use parking_lot::Mutex;

/// Tracks recent restart timestamps per session and declares quarantine once
/// `max_restarts` restarts have landed within `window`.
///
/// `max_restarts <= 0` yields the null-object form: [`CrashTracker::is_null`]
/// is true, `record_start` is a no-op, `is_quarantined` always false.
/// Callers guard on the null form and skip quarantine handling entirely.
pub struct CrashTracker {
    max_restarts: u32,
    window: Duration,
    starts: Mutex<HashMap<SessionName, Vec<u64>>>,
}

impl CrashTracker {
    pub fn new(max_restarts: i64, window: Duration) -> Self {
        Self {
            max_restarts: max_restarts.max(0) as u32,
            window,
            starts: Mutex::new(HashMap::new()),
        }
    }

    /// A tracker that never quarantines anything.
    pub fn null() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn is_null(&self) -> bool {
        self.max_restarts == 0
    }

    /// Record a start at `at` (unix seconds), pruning entries older than
    /// `at - window` first.
    pub fn record_start(&self, session: &SessionName, at: u64) {
        if self.is_null() {
            return;
        }
        let mut starts = self.starts.lock();
        let entry = starts.entry(session.clone()).or_default();
        prune(entry, at, self.window);
        entry.push(at);
    }

    /// Whether `session` has reached `max_restarts` within the window as of
    /// `now`. Must be called *after* `record_start` to observe the
    /// just-recorded start.
    pub fn is_quarantined(&self, session: &SessionName, now: u64) -> bool {
        if self.is_null() {
            return false;
        }
        let mut starts = self.starts.lock();
        let Some(entry) = starts.get_mut(session) else {
            return false;
        };
        prune(entry, now, self.window);
        let quarantined = entry.len() as u32 >= self.max_restarts;
        if entry.is_empty() {
            starts.remove(session);
        }
        quarantined
    }

    pub fn clear_history(&self, session: &SessionName) {
        self.starts.lock().remove(session);
    }
}

fn prune(entries: &mut Vec<u64>, at: u64, window: Duration) {
    let cutoff = at.saturating_sub(window.as_secs());
    entries.retain(|t| *t >= cutoff);
}

#[cfg(test)]
#[path = "crash_tracker_tests.rs"]
mod tests;
