// SPDX-License-Identifier: MIT

//! No-op session adapter for when session management is disabled.

use super::{SessionAdapter, SessionError};
use async_trait::async_trait;
use gc_core::{SessionConfig, SessionName};

/// Session adapter that does nothing.
///
/// Used in minimal deployments or dry-run invocations where no sessions
/// should actually be started.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpSessionAdapter;

impl NoOpSessionAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionAdapter for NoOpSessionAdapter {
    async fn start(&self, _name: &SessionName, _cfg: &SessionConfig) -> Result<(), SessionError> {
        Ok(())
    }

    async fn interrupt(&self, _name: &SessionName) -> Result<(), SessionError> {
        Ok(())
    }

    async fn stop(&self, _name: &SessionName) -> Result<(), SessionError> {
        Ok(())
    }

    async fn is_running(&self, _name: &SessionName) -> Result<bool, SessionError> {
        Ok(false)
    }

    async fn list_running(&self, _prefix: &str) -> Result<Vec<SessionName>, SessionError> {
        Ok(Vec::new())
    }

    async fn peek(&self, _name: &SessionName, _n_lines: u32) -> Result<String, SessionError> {
        Ok(String::new())
    }

    async fn clear_scrollback(&self, _name: &SessionName) -> Result<(), SessionError> {
        Ok(())
    }

    async fn last_activity_at(&self, _name: &SessionName) -> Result<Option<u64>, SessionError> {
        Ok(None)
    }

    async fn attach(&self, name: &SessionName) -> Result<String, SessionError> {
        Ok(name.as_str().to_string())
    }

    async fn get_meta(&self, _name: &SessionName, _key: &str) -> Result<Option<String>, SessionError> {
        Ok(None)
    }

    async fn set_meta(&self, _name: &SessionName, _key: &str, _value: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn remove_meta(&self, _name: &SessionName, _key: &str) -> Result<(), SessionError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
