// SPDX-License-Identifier: MIT

//! Reconcile-time queries over the session backend: which sessions are
//! actually running, and what config fingerprint each one was last started
//! with.

use async_trait::async_trait;
use gc_core::{Fingerprint, SessionName};

const CONFIG_HASH: &str = "CONFIG_HASH";

/// Capability interface the reconciler uses to inspect and tag actual
/// sessions. A missing `CONFIG_HASH` (never stored, or a read error) must be
/// reported identically as `("", None)` — never as an error — so the
/// reconciler treats it as the graceful-upgrade path, not drift.
#[async_trait]
pub trait ReconcileOps: Send + Sync {
    async fn list_running(&self, prefix: &str) -> Vec<SessionName>;
    async fn store_config_hash(&self, session: &SessionName, hash: &Fingerprint);
    async fn config_hash(&self, session: &SessionName) -> Option<Fingerprint>;
}

/// Production [`ReconcileOps`] backed by a session adapter.
pub struct SessionReconcileOps<S: gc_adapters::SessionAdapter> {
    backend: S,
}

impl<S: gc_adapters::SessionAdapter> SessionReconcileOps<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<S: gc_adapters::SessionAdapter> ReconcileOps for SessionReconcileOps<S> {
    async fn list_running(&self, prefix: &str) -> Vec<SessionName> {
        self.backend.list_running(prefix).await.unwrap_or_default()
    }

    async fn store_config_hash(&self, session: &SessionName, hash: &Fingerprint) {
        let _ = self.backend.set_meta(session, CONFIG_HASH, hash.as_str()).await;
    }

    async fn config_hash(&self, session: &SessionName) -> Option<Fingerprint> {
        self.backend
            .get_meta(session, CONFIG_HASH)
            .await
            .ok()
            .flatten()
            .map(Fingerprint)
    }
}

#[cfg(test)]
#[path = "reconcile_ops_tests.rs"]
mod tests;
