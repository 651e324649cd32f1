// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gc-engine: the reconciler and its supporting trackers — the part of the
//! Gas City control plane that decides what the session backend should be
//! doing and drives it there.

mod crash_tracker;
mod drain_ops;
mod error;
mod idle_tracker;
mod reconcile_ops;
mod reconciler;
mod shutdown;

pub use crash_tracker::CrashTracker;
pub use drain_ops::{DrainOps, SessionDrainOps};
pub use error::ReconcileError;
pub use idle_tracker::IdleTracker;
pub use reconcile_ops::{ReconcileOps, SessionReconcileOps};
pub use reconciler::Reconciler;
pub use shutdown::graceful_shutdown;
