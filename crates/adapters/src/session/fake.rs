// SPDX-License-Identifier: MIT

//! Fake session adapter for testing.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SessionAdapter, SessionError};
use async_trait::async_trait;
use gc_core::{SessionConfig, SessionName};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Recorded session call.
#[derive(Debug, Clone)]
pub enum SessionCall {
    Start { name: SessionName, cfg: SessionConfig },
    Interrupt { name: SessionName },
    Stop { name: SessionName },
    IsRunning { name: SessionName },
    ListRunning { prefix: String },
    Peek { name: SessionName, n_lines: u32 },
    ClearScrollback { name: SessionName },
    LastActivityAt { name: SessionName },
    Attach { name: SessionName },
    GetMeta { name: SessionName, key: String },
    SetMeta { name: SessionName, key: String, value: String },
    RemoveMeta { name: SessionName, key: String },
}

/// Fake session state.
#[derive(Debug, Clone)]
pub struct FakeSession {
    pub cfg: SessionConfig,
    pub output: Vec<String>,
    pub running: bool,
    pub last_activity_at: Option<u64>,
    pub meta: HashMap<String, String>,
}

impl FakeSession {
    fn new(cfg: SessionConfig) -> Self {
        Self {
            cfg,
            output: Vec::new(),
            running: true,
            last_activity_at: None,
            meta: HashMap::new(),
        }
    }
}

struct FakeSessionState {
    sessions: HashMap<SessionName, FakeSession>,
    calls: Vec<SessionCall>,
}

/// In-memory fake session backend for reconciler and daemon tests.
#[derive(Clone)]
pub struct FakeSessionAdapter {
    inner: Arc<Mutex<FakeSessionState>>,
}

impl Default for FakeSessionAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeSessionState {
                sessions: HashMap::new(),
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeSessionAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<SessionCall> {
        self.inner.lock().calls.clone()
    }

    pub fn get_session(&self, name: &SessionName) -> Option<FakeSession> {
        self.inner.lock().sessions.get(name).cloned()
    }

    pub fn set_output(&self, name: &SessionName, output: Vec<String>) {
        if let Some(session) = self.inner.lock().sessions.get_mut(name) {
            session.output = output;
        }
    }

    pub fn set_last_activity_at(&self, name: &SessionName, at: Option<u64>) {
        if let Some(session) = self.inner.lock().sessions.get_mut(name) {
            session.last_activity_at = at;
        }
    }

    /// Mark a session as dead without removing it — simulates a crashed
    /// process whose tmux pane is still around (a "zombie").
    pub fn mark_dead(&self, name: &SessionName) {
        if let Some(session) = self.inner.lock().sessions.get_mut(name) {
            session.running = false;
        }
    }

    /// Add a pre-existing session directly, bypassing `start()`.
    pub fn seed_session(&self, name: &SessionName, cfg: SessionConfig, running: bool) {
        let mut session = FakeSession::new(cfg);
        session.running = running;
        self.inner.lock().sessions.insert(name.clone(), session);
    }
}

#[async_trait]
impl SessionAdapter for FakeSessionAdapter {
    async fn start(&self, name: &SessionName, cfg: &SessionConfig) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Start {
            name: name.clone(),
            cfg: cfg.clone(),
        });
        inner.sessions.insert(name.clone(), FakeSession::new(cfg.clone()));
        Ok(())
    }

    async fn interrupt(&self, name: &SessionName) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Interrupt { name: name.clone() });
        if !inner.sessions.contains_key(name) {
            return Err(SessionError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn stop(&self, name: &SessionName) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Stop { name: name.clone() });
        inner.sessions.remove(name);
        Ok(())
    }

    async fn is_running(&self, name: &SessionName) -> Result<bool, SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::IsRunning { name: name.clone() });
        Ok(inner.sessions.get(name).map(|s| s.running).unwrap_or(false))
    }

    async fn list_running(&self, prefix: &str) -> Result<Vec<SessionName>, SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::ListRunning { prefix: prefix.to_string() });
        Ok(inner
            .sessions
            .iter()
            .filter(|(name, session)| session.running && name.as_str().starts_with(prefix))
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn peek(&self, name: &SessionName, n_lines: u32) -> Result<String, SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Peek { name: name.clone(), n_lines });
        match inner.sessions.get(name) {
            Some(session) => {
                let start = session.output.len().saturating_sub(n_lines as usize);
                Ok(session.output[start..].join("\n"))
            }
            None => Err(SessionError::NotFound(name.to_string())),
        }
    }

    async fn clear_scrollback(&self, name: &SessionName) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::ClearScrollback { name: name.clone() });
        if let Some(session) = inner.sessions.get_mut(name) {
            session.output.clear();
        }
        Ok(())
    }

    async fn last_activity_at(&self, name: &SessionName) -> Result<Option<u64>, SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::LastActivityAt { name: name.clone() });
        Ok(inner.sessions.get(name).and_then(|s| s.last_activity_at))
    }

    async fn attach(&self, name: &SessionName) -> Result<String, SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Attach { name: name.clone() });
        Ok(name.as_str().to_string())
    }

    async fn get_meta(&self, name: &SessionName, key: &str) -> Result<Option<String>, SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::GetMeta {
            name: name.clone(),
            key: key.to_string(),
        });
        Ok(inner.sessions.get(name).and_then(|s| s.meta.get(key).cloned()))
    }

    async fn set_meta(&self, name: &SessionName, key: &str, value: &str) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::SetMeta {
            name: name.clone(),
            key: key.to_string(),
            value: value.to_string(),
        });
        match inner.sessions.get_mut(name) {
            Some(session) => {
                session.meta.insert(key.to_string(), value.to_string());
                Ok(())
            }
            None => Err(SessionError::NotFound(name.to_string())),
        }
    }

    async fn remove_meta(&self, name: &SessionName, key: &str) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::RemoveMeta {
            name: name.clone(),
            key: key.to_string(),
        });
        if let Some(session) = inner.sessions.get_mut(name) {
            session.meta.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
