// SPDX-License-Identifier: MIT

//! Tmux session adapter.
//!
//! Session metadata is stored as tmux user options (`@key`), which persist
//! for the session's lifetime and are visible to processes running inside
//! it — exactly what the drain/restart back-channel needs.

use super::{SessionAdapter, SessionError};
use async_trait::async_trait;
use gc_core::{SessionConfig, SessionName};
use tokio::process::Command;

const BACKEND_PREFIX: &str = "gc-";

fn backend_id(name: &SessionName) -> String {
    format!("{BACKEND_PREFIX}{}", name.as_str())
}

/// Tmux-based session adapter.
#[derive(Clone, Default)]
pub struct TmuxAdapter;

impl TmuxAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionAdapter for TmuxAdapter {
    async fn start(&self, name: &SessionName, cfg: &SessionConfig) -> Result<(), SessionError> {
        if !cfg.cwd.exists() {
            return Err(SessionError::SpawnFailed(format!(
                "working directory does not exist: {}",
                cfg.cwd.display()
            )));
        }

        let id = backend_id(name);

        let existing = Command::new("tmux")
            .args(["has-session", "-t", &id])
            .output()
            .await;
        if existing.map(|o| o.status.success()).unwrap_or(false) {
            tracing::warn!(session = %id, "session already exists, killing first");
            let _ = Command::new("tmux").args(["kill-session", "-t", &id]).output().await;
        }

        let mut tmux_cmd = Command::new("tmux");
        tmux_cmd
            .arg("new-session")
            .arg("-d")
            .arg("-s")
            .arg(&id)
            .arg("-c")
            .arg(&cfg.cwd);

        for (key, value) in &cfg.env {
            tmux_cmd.arg("-e").arg(format!("{key}={value}"));
        }

        tmux_cmd.arg(&cfg.command);

        let output = tmux_cmd
            .output()
            .await
            .map_err(|e| SessionError::SpawnFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(session = %id, stderr = %stderr, "tmux spawn failed");
            return Err(SessionError::SpawnFailed(stderr.to_string()));
        }

        Ok(())
    }

    async fn interrupt(&self, name: &SessionName) -> Result<(), SessionError> {
        let id = backend_id(name);
        let output = Command::new("tmux")
            .args(["send-keys", "-t", &id, "C-c"])
            .output()
            .await
            .map_err(|e| SessionError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(SessionError::NotFound(id));
        }
        Ok(())
    }

    async fn stop(&self, name: &SessionName) -> Result<(), SessionError> {
        let id = backend_id(name);
        // Non-fatal if the session is already gone.
        let _ = Command::new("tmux").args(["kill-session", "-t", &id]).output().await;
        Ok(())
    }

    async fn is_running(&self, name: &SessionName) -> Result<bool, SessionError> {
        let id = backend_id(name);
        let output = Command::new("tmux")
            .args(["has-session", "-t", &id])
            .output()
            .await
            .map_err(|e| SessionError::CommandFailed(e.to_string()))?;
        Ok(output.status.success())
    }

    async fn list_running(&self, prefix: &str) -> Result<Vec<SessionName>, SessionError> {
        let output = Command::new("tmux")
            .args(["list-sessions", "-F", "#{session_name}"])
            .output()
            .await;

        let output = match output {
            Ok(o) if o.status.success() => o,
            // No server running means no sessions, not an error.
            _ => return Ok(Vec::new()),
        };

        let names = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| line.strip_prefix(BACKEND_PREFIX))
            .filter(|name| name.starts_with(prefix))
            .map(SessionName::new)
            .collect();

        Ok(names)
    }

    async fn peek(&self, name: &SessionName, n_lines: u32) -> Result<String, SessionError> {
        let id = backend_id(name);
        let output = Command::new("tmux")
            .args(["capture-pane", "-t", &id, "-p", "-S", &format!("-{n_lines}")])
            .output()
            .await
            .map_err(|e| SessionError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(SessionError::NotFound(id));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn clear_scrollback(&self, name: &SessionName) -> Result<(), SessionError> {
        let id = backend_id(name);
        let _ = Command::new("tmux").args(["clear-history", "-t", &id]).output().await;
        Ok(())
    }

    async fn last_activity_at(&self, name: &SessionName) -> Result<Option<u64>, SessionError> {
        let id = backend_id(name);
        let output = Command::new("tmux")
            .args(["display-message", "-t", &id, "-p", "#{window_activity}"])
            .output()
            .await
            .map_err(|e| SessionError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            return Ok(None);
        }

        let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(raw.parse::<u64>().ok())
    }

    async fn attach(&self, name: &SessionName) -> Result<String, SessionError> {
        Ok(backend_id(name))
    }

    async fn get_meta(&self, name: &SessionName, key: &str) -> Result<Option<String>, SessionError> {
        let id = backend_id(name);
        let output = Command::new("tmux")
            .args(["show-options", "-t", &id, "-v", &format!("@{key}")])
            .output()
            .await;

        let output = match output {
            Ok(o) if o.status.success() => o,
            _ => return Ok(None),
        };

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(value))
        }
    }

    async fn set_meta(&self, name: &SessionName, key: &str, value: &str) -> Result<(), SessionError> {
        let id = backend_id(name);
        let output = Command::new("tmux")
            .args(["set-option", "-t", &id, &format!("@{key}"), value])
            .output()
            .await
            .map_err(|e| SessionError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SessionError::CommandFailed(stderr.to_string()));
        }
        Ok(())
    }

    async fn remove_meta(&self, name: &SessionName, key: &str) -> Result<(), SessionError> {
        let id = backend_id(name);
        // tmux has no unset for user options short of setting empty; fine
        // since get_meta treats an empty value as "not set".
        let _ = Command::new("tmux")
            .args(["set-option", "-u", "-t", &id, &format!("@{key}")])
            .output()
            .await;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
