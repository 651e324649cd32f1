// SPDX-License-Identifier: MIT

//! Session backend adapters: start/stop/inspect the terminal-multiplexer
//! sessions that back each agent, plus the per-session metadata bag used as
//! a control-plane back-channel (`DRAIN`, `DRAIN_ACK`, `RESTART_REQUESTED`,
//! `CONFIG_HASH`).

mod noop;
mod tmux;

pub use noop::NoOpSessionAdapter;
pub use tmux::TmuxAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSession, FakeSessionAdapter, SessionCall};

use async_trait::async_trait;
use gc_core::{SessionConfig, SessionName};
use thiserror::Error;

/// Errors from session backend operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// A session backend: tmux today, anything that can start/stop/inspect a
/// long-lived terminal process tomorrow.
///
/// `get_meta` on a key that was never set must return `Ok(None)`, not an
/// error — callers distinguish "not set" from "set to empty" only where the
/// reconciler explicitly checks for it (e.g. `DRAIN` being present but
/// empty is still "draining").
#[async_trait]
pub trait SessionAdapter: Clone + Send + Sync + 'static {
    /// Start a session under `name`, replacing any stale session of the
    /// same name first.
    async fn start(&self, name: &SessionName, cfg: &SessionConfig) -> Result<(), SessionError>;

    /// Send an interrupt (Ctrl-C-equivalent) to the session, best-effort.
    async fn interrupt(&self, name: &SessionName) -> Result<(), SessionError>;

    /// Kill the session outright.
    async fn stop(&self, name: &SessionName) -> Result<(), SessionError>;

    /// Whether the session is currently alive.
    async fn is_running(&self, name: &SessionName) -> Result<bool, SessionError>;

    /// All currently-running session names whose name begins with `prefix`.
    async fn list_running(&self, prefix: &str) -> Result<Vec<SessionName>, SessionError>;

    /// Capture the last `n_lines` of output.
    async fn peek(&self, name: &SessionName, n_lines: u32) -> Result<String, SessionError>;

    /// Clear the pane's scrollback history (used after a restart so the next
    /// zombie-capture check doesn't see stale output).
    async fn clear_scrollback(&self, name: &SessionName) -> Result<(), SessionError>;

    /// Unix-epoch seconds of the session's last observed activity, or `None`
    /// if the backend can't report one. Callers must treat `None` the same
    /// as "not idle", never as "idle forever".
    async fn last_activity_at(&self, name: &SessionName) -> Result<Option<u64>, SessionError>;

    /// The backend-native identifier a human would use to attach
    /// interactively (e.g. for `tmux attach -t <id>`).
    async fn attach(&self, name: &SessionName) -> Result<String, SessionError>;

    /// Read one metadata key. Missing key is `Ok(None)`, never an error.
    async fn get_meta(&self, name: &SessionName, key: &str) -> Result<Option<String>, SessionError>;

    /// Write one metadata key.
    async fn set_meta(&self, name: &SessionName, key: &str, value: &str) -> Result<(), SessionError>;

    /// Remove one metadata key. Removing an absent key is not an error.
    async fn remove_meta(&self, name: &SessionName, key: &str) -> Result<(), SessionError>;
}
