// SPDX-License-Identifier: MIT

//! Graceful shutdown: interrupt first, give agents a chance to exit on
//! their own, then kill whatever's left.

use std::time::Duration;

use gc_adapters::SessionAdapter;
use gc_core::{event_type, Event, SessionName};
use gc_storage::EventRecorder;
use tracing::warn;

/// Stop every session in `names`.
///
/// A zero timeout (or an empty set) skips the interrupt phase entirely and
/// kills everything immediately. Otherwise: interrupt all (best-effort),
/// wait `timeout`, then stop whatever is still running. `agent.stopped` is
/// emitted for every name, regardless of which pass ended it.
pub async fn graceful_shutdown<S: SessionAdapter>(
    backend: &S,
    recorder: &EventRecorder,
    names: &[SessionName],
    timeout: Duration,
    now: impl Fn() -> i64,
) {
    if timeout.is_zero() || names.is_empty() {
        for name in names {
            if let Err(e) = backend.stop(name).await {
                warn!(session = %name, error = %e, "gc: failed to stop session during shutdown");
                continue;
            }
            record(recorder, name, now());
        }
        return;
    }

    for name in names {
        let _ = backend.interrupt(name).await;
    }
    eprintln!("Sent interrupt to {} agent(s), waiting {:?}...", names.len(), timeout);
    tokio::time::sleep(timeout).await;

    for name in names {
        match backend.is_running(name).await {
            Ok(false) => {
                eprintln!("Agent '{name}' exited gracefully");
            }
            _ => {
                let _ = backend.stop(name).await;
            }
        }
        record(recorder, name, now());
    }
}

fn record(recorder: &EventRecorder, name: &SessionName, ts: i64) {
    let event = Event::new(event_type::AGENT_STOPPED, "controller", ts).with_subject(name.to_string());
    if let Err(e) = recorder.record(event) {
        warn!(session = %name, error = %e, "gc: failed to record agent.stopped");
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
