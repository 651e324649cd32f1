// SPDX-License-Identifier: MIT

//! Internal error type for reconcile sub-operations.
//!
//! Never returned from [`crate::Reconciler::tick`] itself — per the
//! reconciler's contract a tick always succeeds, swallowing per-agent
//! failures so one bad session can't starve the rest. Used internally (and
//! in tests) to tag *which* sub-operation failed before it gets logged and
//! discarded.

use gc_adapters::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("starting session: {0}")]
    Start(#[source] SessionError),
    #[error("stopping session: {0}")]
    Stop(#[source] SessionError),
    #[error("peeking session: {0}")]
    Peek(#[source] SessionError),
}
