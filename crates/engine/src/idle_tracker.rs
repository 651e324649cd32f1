// SPDX-License-Identifier: MIT

//! Per-session idle timeout tracking backed by a session adapter's
//! `last_activity_at`.

use std::collections::HashMap;
use std::time::Duration;

use gc_adapters::SessionAdapter;
use gc_core::SessionName;
use parking_lot::Mutex;

/// Consults a session backend's last-activity timestamp to decide whether a
/// session has gone idle past its configured timeout.
///
/// A tracker with no timeouts configured never reports anything idle — that
/// is the valid, disabled ("null tracker") mode.
pub struct IdleTracker<S: SessionAdapter> {
    backend: S,
    timeouts: Mutex<HashMap<SessionName, Duration>>,
}

impl<S: SessionAdapter> IdleTracker<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            timeouts: Mutex::new(HashMap::new()),
        }
    }

    /// Configure `session`'s idle timeout. A zero duration removes it.
    pub fn set_timeout(&self, session: &SessionName, duration: Duration) {
        let mut timeouts = self.timeouts.lock();
        if duration.is_zero() {
            timeouts.remove(session);
        } else {
            timeouts.insert(session.clone(), duration);
        }
    }

    /// True iff a timeout is configured, the backend reports a non-zero last
    /// activity, and `now - last_activity` exceeds it.
    pub async fn check_idle(&self, session: &SessionName, now: u64) -> bool {
        let timeout = match self.timeouts.lock().get(session).copied() {
            Some(t) => t,
            None => return false,
        };

        let last_activity = match self.backend.last_activity_at(session).await {
            Ok(Some(t)) if t > 0 => t,
            _ => return false,
        };

        now.saturating_sub(last_activity) > timeout.as_secs()
    }
}

#[cfg(test)]
#[path = "idle_tracker_tests.rs"]
mod tests;
