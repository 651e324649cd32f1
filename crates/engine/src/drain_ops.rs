// SPDX-License-Identifier: MIT

//! Drain protocol: a thin adapter over session metadata used to wind a pool
//! member down gracefully instead of killing it outright.

use async_trait::async_trait;
use gc_core::SessionName;

const DRAIN: &str = "DRAIN";
const DRAIN_ACK: &str = "DRAIN_ACK";
const RESTART_REQUESTED: &str = "RESTART_REQUESTED";

/// Capability interface for the drain back-channel. A production
/// implementation is a thin wrapper over [`gc_adapters::SessionAdapter`]'s
/// metadata bag; metadata read failures must map to "flag not set", never
/// propagate as an error.
#[async_trait]
pub trait DrainOps: Send + Sync {
    async fn set_drain(&self, session: &SessionName, now: u64);
    async fn clear_drain(&self, session: &SessionName);
    async fn is_draining(&self, session: &SessionName) -> bool;
    async fn drain_start_time(&self, session: &SessionName) -> Option<u64>;
    async fn set_drain_ack(&self, session: &SessionName);
    async fn is_drain_acked(&self, session: &SessionName) -> bool;
    async fn set_restart_requested(&self, session: &SessionName);
    async fn is_restart_requested(&self, session: &SessionName) -> bool;
    async fn clear_restart_requested(&self, session: &SessionName);
}

/// Production [`DrainOps`] backed by a session adapter's metadata bag.
pub struct SessionDrainOps<S: gc_adapters::SessionAdapter> {
    backend: S,
}

impl<S: gc_adapters::SessionAdapter> SessionDrainOps<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<S: gc_adapters::SessionAdapter> DrainOps for SessionDrainOps<S> {
    async fn set_drain(&self, session: &SessionName, now: u64) {
        let _ = self.backend.set_meta(session, DRAIN, &now.to_string()).await;
    }

    async fn clear_drain(&self, session: &SessionName) {
        let _ = self.backend.remove_meta(session, DRAIN_ACK).await;
        let _ = self.backend.remove_meta(session, DRAIN).await;
    }

    async fn is_draining(&self, session: &SessionName) -> bool {
        matches!(self.backend.get_meta(session, DRAIN).await, Ok(Some(v)) if !v.is_empty())
    }

    async fn drain_start_time(&self, session: &SessionName) -> Option<u64> {
        self.backend
            .get_meta(session, DRAIN)
            .await
            .ok()
            .flatten()
            .and_then(|v| v.parse().ok())
    }

    async fn set_drain_ack(&self, session: &SessionName) {
        let _ = self.backend.set_meta(session, DRAIN_ACK, "1").await;
    }

    async fn is_drain_acked(&self, session: &SessionName) -> bool {
        matches!(self.backend.get_meta(session, DRAIN_ACK).await, Ok(Some(v)) if v == "1")
    }

    async fn set_restart_requested(&self, session: &SessionName) {
        let _ = self.backend.set_meta(session, RESTART_REQUESTED, "1").await;
    }

    async fn is_restart_requested(&self, session: &SessionName) -> bool {
        matches!(self.backend.get_meta(session, RESTART_REQUESTED).await, Ok(Some(v)) if v == "1")
    }

    async fn clear_restart_requested(&self, session: &SessionName) {
        let _ = self.backend.remove_meta(session, RESTART_REQUESTED).await;
    }
}

#[cfg(test)]
#[path = "drain_ops_tests.rs"]
mod tests;
