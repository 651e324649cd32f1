// SPDX-License-Identifier: MIT

//! The desired-state side of the reconciler: what a city's config says
//! should be running.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::names::{AgentName, SessionName};

/// The complete launch recipe for a session: everything that, if changed,
/// should be observable from outside the process (and therefore should
/// trigger a restart via fingerprint drift).
///
/// `env` is a `BTreeMap` rather than a `HashMap` so that serialization order
/// is stable without an extra canonicalization pass — this is the data the
/// fingerprint is computed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub command: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub cwd: PathBuf,
}

impl SessionConfig {
    pub fn new(command: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            env: BTreeMap::new(),
            cwd: cwd.into(),
        }
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// A stable hash over the serialized form of this config.
    ///
    /// Two configs produce the same fingerprint iff their external behaviour
    /// is identical: same command, same cwd, same environment (the `BTreeMap`
    /// guarantees key order is already canonical before we ever serialize).
    pub fn fingerprint(&self) -> Fingerprint {
        // unwrap: SessionConfig contains only Strings, a BTreeMap, and a PathBuf,
        // all of which always serialize successfully.
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&canonical);
        Fingerprint(format!("{:x}", digest))
    }
}

/// A stable hash of a [`SessionConfig`]; written to session metadata as
/// `CONFIG_HASH` and compared on every reconcile tick to detect drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Drain configuration for a pool-member agent: present iff the agent
/// belongs to a dynamically-sized pool rather than a fixed rig agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    pub pool_name: String,
    pub drain_timeout: Duration,
}

/// One entry of the desired agent population, as built from `city.toml`.
///
/// `session_name` is derived once at load time via
/// [`crate::names::session_name`] and never recomputed — the reconciler keys
/// everything off of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredAgent {
    pub name: AgentName,
    pub session_name: SessionName,
    pub session_config: SessionConfig,
    /// Free-form hints handed to the agent on first prompt (e.g. a priming
    /// message); opaque to the reconciler.
    #[serde(default)]
    pub startup_hints: Vec<String>,
    #[serde(default)]
    pub idle_timeout: Option<Duration>,
    #[serde(default)]
    pub pool_info: Option<PoolInfo>,
}

impl DesiredAgent {
    /// The launch command, delegating to `session_config` so there is a
    /// single source of truth for what actually gets executed.
    pub fn start_command(&self) -> &str {
        &self.session_config.command
    }

    /// The launch environment, delegating to `session_config`.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.session_config.env
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.session_config.fingerprint()
    }
}

#[cfg(test)]
#[path = "desired_agent_tests.rs"]
mod tests;
