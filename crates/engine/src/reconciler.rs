// SPDX-License-Identifier: MIT

//! The reconciler: diffs desired agents against actual sessions and drives
//! the backend toward the desired state, one tick at a time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use gc_adapters::SessionAdapter;
use gc_core::{event_type, DesiredAgent, Event, SessionName};
use gc_storage::EventRecorder;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::crash_tracker::CrashTracker;
use crate::drain_ops::DrainOps;
use crate::error::ReconcileError;
use crate::idle_tracker::IdleTracker;
use crate::reconcile_ops::ReconcileOps;

/// Diffs a city's desired agent population against its actual sessions and
/// applies the decision tables in one tick.
///
/// Holds the stateful pieces (crash tracker, idle tracker, drain ops) across
/// ticks; `desired`, `pool_sessions`, and `suspended_names` are handed in
/// fresh each call since they're derived from config and may change on
/// reload.
pub struct Reconciler<S: SessionAdapter> {
    backend: S,
    reconcile_ops: Box<dyn ReconcileOps>,
    drain_ops: Option<Box<dyn DrainOps>>,
    crash_tracker: Option<CrashTracker>,
    idle_tracker: Option<IdleTracker<S>>,
    recorder: Arc<EventRecorder>,
    city_prefix: String,
}

impl<S: SessionAdapter> Reconciler<S> {
    pub fn new(
        backend: S,
        reconcile_ops: Box<dyn ReconcileOps>,
        drain_ops: Option<Box<dyn DrainOps>>,
        crash_tracker: Option<CrashTracker>,
        idle_tracker: Option<IdleTracker<S>>,
        recorder: Arc<EventRecorder>,
        city_prefix: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            reconcile_ops,
            drain_ops,
            crash_tracker,
            idle_tracker,
            recorder,
            city_prefix: city_prefix.into(),
        }
    }

    /// Configure (or, with a zero duration, clear) a session's idle timeout.
    /// A no-op if this reconciler was built without an idle tracker.
    pub fn set_idle_timeout(&self, session: &SessionName, timeout: Duration) {
        if let Some(idle) = &self.idle_tracker {
            idle.set_timeout(session, timeout);
        }
    }

    /// Run one reconciliation pass: desired agents first, then excess actual
    /// sessions. `now` is unix-epoch seconds.
    pub async fn tick(
        &self,
        desired: &[DesiredAgent],
        pool_sessions: &HashMap<SessionName, Duration>,
        suspended_names: &HashSet<SessionName>,
        now: u64,
    ) {
        self.reconcile_desired(desired, now).await;
        self.reconcile_excess(desired, pool_sessions, suspended_names, now).await;
    }

    async fn reconcile_desired(&self, desired: &[DesiredAgent], now: u64) {
        let mut to_start: Vec<&DesiredAgent> = Vec::new();

        for agent in desired {
            let running = self.backend.is_running(&agent.session_name).await.unwrap_or(false);
            if running {
                self.reconcile_running(agent, now).await;
                continue;
            }

            self.handle_zombie_capture(agent, now).await;

            if let Some(tracker) = &self.crash_tracker {
                if tracker.is_quarantined(&agent.session_name, now) {
                    continue;
                }
            }

            to_start.push(agent);
        }

        if to_start.is_empty() {
            return;
        }

        let mut set = JoinSet::new();
        for agent in &to_start {
            let backend = self.backend.clone();
            let name = agent.session_name.clone();
            let cfg = agent.session_config.clone();
            set.spawn(async move {
                let result = backend.start(&name, &cfg).await.map_err(ReconcileError::Start);
                (name, result)
            });
        }

        let mut started: HashSet<SessionName> = HashSet::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => {
                    started.insert(name);
                }
                Ok((name, Err(e))) => {
                    warn!(session = %name, error = %e, "gc: failed to start session");
                }
                Err(e) => warn!(error = %e, "gc: start task panicked"),
            }
        }

        for agent in to_start {
            let name = &agent.session_name;
            if !started.contains(name) {
                continue;
            }

            if let Some(tracker) = &self.crash_tracker {
                tracker.record_start(name, now);
            }
            let hash = agent.fingerprint();
            self.reconcile_ops.store_config_hash(name, &hash).await;
            self.record(Event::new(event_type::AGENT_STARTED, "reconciler", now as i64).with_subject(name.to_string()));

            if let Some(tracker) = &self.crash_tracker {
                if tracker.is_quarantined(name, now) {
                    self.record(
                        Event::new(event_type::AGENT_QUARANTINED, "reconciler", now as i64)
                            .with_subject(name.to_string()),
                    );
                }
            }
        }
    }

    async fn handle_zombie_capture(&self, agent: &DesiredAgent, now: u64) {
        let name = &agent.session_name;
        if let Ok(output) = self.backend.peek(name, 50).await {
            if !output.trim().is_empty() {
                self.record(
                    Event::new(event_type::AGENT_CRASHED, "reconciler", now as i64)
                        .with_subject(name.to_string())
                        .with_message(output),
                );
            }
        }
    }

    async fn reconcile_running(&self, agent: &DesiredAgent, now: u64) {
        let name = &agent.session_name;

        if let Some(drain) = &self.drain_ops {
            if drain.is_draining(name).await {
                drain.clear_drain(name).await;
                return;
            }

            if drain.is_restart_requested(name).await {
                self.record(
                    Event::new(event_type::AGENT_STOPPED, "reconciler", now as i64)
                        .with_subject(name.to_string())
                        .with_message("restart requested by agent"),
                );
                if self.restart(agent, now, true).await {
                    drain.clear_restart_requested(name).await;
                }
                return;
            }
        }

        if let Some(idle) = &self.idle_tracker {
            if idle.check_idle(name, now).await {
                self.record(
                    Event::new(event_type::AGENT_IDLE_KILLED, "reconciler", now as i64).with_subject(name.to_string()),
                );
                self.restart(agent, now, true).await;
                return;
            }
        }

        let current = agent.fingerprint();
        match self.reconcile_ops.config_hash(name).await {
            Some(stored) if stored != current => {
                self.restart(agent, now, false).await;
            }
            // Absent hash (graceful-upgrade grace period) or matching hash:
            // leave the session alone either way.
            _ => {}
        }
    }

    /// Stop, start, and clear scrollback for `agent`. Returns whether the
    /// start succeeded. `track_crash` controls whether this restart counts
    /// toward the crash tracker's sliding window (it does for idle-kill and
    /// restart-requested, but not for a config-drift restart).
    async fn restart(&self, agent: &DesiredAgent, now: u64, track_crash: bool) -> bool {
        let name = &agent.session_name;
        let _ = self.backend.stop(name).await.map_err(ReconcileError::Stop);

        if let Err(e) = self.backend.start(name, &agent.session_config).await.map_err(ReconcileError::Start) {
            warn!(session = %name, error = %e, "gc: failed to restart session");
            return false;
        }

        let _ = self.backend.clear_scrollback(name).await;

        if track_crash {
            if let Some(tracker) = &self.crash_tracker {
                tracker.record_start(name, now);
            }
        }

        let hash = agent.fingerprint();
        self.reconcile_ops.store_config_hash(name, &hash).await;
        self.record(Event::new(event_type::AGENT_STARTED, "reconciler", now as i64).with_subject(name.to_string()));
        true
    }

    async fn reconcile_excess(
        &self,
        desired: &[DesiredAgent],
        pool_sessions: &HashMap<SessionName, Duration>,
        suspended_names: &HashSet<SessionName>,
        now: u64,
    ) {
        let desired_names: HashSet<&SessionName> = desired.iter().map(|a| &a.session_name).collect();
        let actual = self.reconcile_ops.list_running(&self.city_prefix).await;

        for name in actual {
            if desired_names.contains(&name) {
                continue;
            }

            if let Some(drain_timeout) = pool_sessions.get(&name) {
                if let Some(drain) = &self.drain_ops {
                    if !drain.is_draining(&name).await {
                        drain.set_drain(&name, now).await;
                        info!("Draining '{}' (pool scaling down)", name);
                        continue;
                    }

                    if drain.is_drain_acked(&name).await {
                        let _ = self.backend.stop(&name).await;
                        self.record_stopped(&name, now);
                        info!("Stopped drained session '{}'", name);
                        continue;
                    }

                    let started_at = drain.drain_start_time(&name).await.unwrap_or(now);
                    let age = now.saturating_sub(started_at);
                    if !drain_timeout.is_zero() && age > drain_timeout.as_secs() {
                        let _ = self.backend.stop(&name).await;
                        self.record_stopped(&name, now);
                        info!("Killed drained session '{}' (timeout after {}s)", name, drain_timeout.as_secs());
                    }
                    // else: still winding down, leave it alone.
                    continue;
                }
                // drain ops unavailable: fall through to orphan/suspended handling below.
            }

            if suspended_names.contains(&name) {
                let _ = self.backend.stop(&name).await;
                self.record(
                    Event::new(event_type::AGENT_SUSPENDED, "reconciler", now as i64).with_subject(name.to_string()),
                );
                info!("Stopped suspended agent '{}'", name);
                continue;
            }

            let _ = self.backend.stop(&name).await;
            self.record_stopped(&name, now);
            info!("Stopped orphan session '{}'", name);
        }
    }

    fn record_stopped(&self, name: &SessionName, now: u64) {
        self.record(Event::new(event_type::AGENT_STOPPED, "reconciler", now as i64).with_subject(name.to_string()));
    }

    fn record(&self, event: Event) {
        if let Err(e) = self.recorder.record(event) {
            warn!(error = %e, "gc: failed to record event");
        }
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
