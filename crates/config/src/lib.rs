// SPDX-License-Identifier: MIT

//! Loads and validates `city.toml`, and expands it into the desired-agent
//! population the reconciler diffs against reality.
//!
//! Deliberately the simplest possible loader: no templating, no includes, no
//! HCL. A `city.toml` maps almost one-to-one onto [`CityConfig`]; the only
//! real work this crate does is validation and the rig/pool expansion in
//! [`CityConfig::to_desired_agents`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use gc_core::{session_name, AgentName, CityName, DesiredAgent, PoolInfo, SessionConfig, SessionName};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_PATROL_INTERVAL_SECS: u64 = 5;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("workspace name changed from {old:?} to {new:?}; restart the controller to pick this up")]
    NameChanged { old: String, new: String },
}

/// The root of `city.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CityConfig {
    pub workspace: WorkspaceSection,
    #[serde(default)]
    pub daemon: DaemonSection,
    #[serde(default)]
    pub rigs: Vec<RigSection>,
    #[serde(default)]
    pub agents: Vec<AgentSection>,
    #[serde(default)]
    pub pools: Vec<PoolSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceSection {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonSection {
    #[serde(default = "default_patrol_interval")]
    pub patrol_interval_secs: u64,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            patrol_interval_secs: default_patrol_interval(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl DaemonSection {
    pub fn patrol_interval(&self) -> Duration {
        Duration::from_secs(self.patrol_interval_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn default_patrol_interval() -> u64 {
    DEFAULT_PATROL_INTERVAL_SECS
}

fn default_shutdown_timeout() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

#[derive(Debug, Clone, Deserialize)]
pub struct RigSection {
    pub path: String,
    #[serde(default)]
    pub suspended: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    pub name: String,
    #[serde(default)]
    pub rig: Option<String>,
    pub start_command: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default)]
    pub suspended: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolSection {
    pub name: String,
    #[serde(default)]
    pub rig: Option<String>,
    pub size: i64,
    pub start_command: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
    #[serde(default)]
    pub drain_timeout_secs: u64,
    #[serde(default)]
    pub suspended: bool,
}

impl CityConfig {
    /// Read and parse `<root>/city.toml`. Does not validate — call
    /// [`Self::validate`] explicitly, matching the load/validate split a
    /// reload needs to run independently.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = root.as_ref().join("city.toml");
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Toml { path, source })
    }

    /// Structural validation: unique agent names within a rig scope,
    /// non-empty commands, non-negative pool sizes, a non-empty workspace
    /// name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workspace.name.trim().is_empty() {
            return Err(ConfigError::Invalid("workspace.name must not be empty".into()));
        }

        let mut seen: HashSet<(Option<&str>, &str)> = HashSet::new();
        for agent in &self.agents {
            if agent.start_command.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "agent {:?} has an empty start_command",
                    agent.name
                )));
            }
            let key = (agent.rig.as_deref(), agent.name.as_str());
            if !seen.insert(key) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate agent name {:?} in rig {:?}",
                    agent.name, agent.rig
                )));
            }
        }

        let mut pool_names: HashSet<(Option<&str>, &str)> = HashSet::new();
        for pool in &self.pools {
            if pool.start_command.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "pool {:?} has an empty start_command",
                    pool.name
                )));
            }
            if pool.size < 0 || pool.size > i64::from(u32::MAX) {
                return Err(ConfigError::Invalid(format!(
                    "pool {:?} has an out-of-range size {}",
                    pool.name, pool.size
                )));
            }
            let key = (pool.rig.as_deref(), pool.name.as_str());
            if !pool_names.insert(key) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate pool name {:?} in rig {:?}",
                    pool.name, pool.rig
                )));
            }
        }

        Ok(())
    }

    /// Re-load and re-validate from `root`, additionally requiring the
    /// workspace name to be unchanged from `locked_name` — renaming a city
    /// mid-flight requires a controller restart, not a hot reload.
    ///
    /// On any failure the caller's existing config is untouched: this
    /// function borrows nothing from `self` and only returns a fresh value
    /// or an error.
    pub fn try_reload(root: impl AsRef<Path>, locked_name: &str) -> Result<Self, ConfigError> {
        let fresh = Self::load(root)?;
        fresh.validate()?;
        if fresh.workspace.name != locked_name {
            return Err(ConfigError::NameChanged {
                old: locked_name.to_string(),
                new: fresh.workspace.name.clone(),
            });
        }
        Ok(fresh)
    }

    /// Expand rigs/agents/pools into the desired-agent population and the
    /// pool membership map the reconciler needs.
    ///
    /// Pool member `N` is named `<pool-name>-N` for `N` in `1..=size`.
    pub fn to_desired_agents(&self) -> (Vec<DesiredAgent>, HashMap<SessionName, Duration>) {
        let city = CityName::new(self.workspace.name.clone());
        let mut agents = Vec::with_capacity(self.agents.len() + self.pools.len());
        let mut pool_sessions = HashMap::new();

        for agent in &self.agents {
            let name = AgentName::new(agent.name.clone());
            let session = session_name(&city, agent.rig.as_deref(), &name);
            let env = with_session_env(&agent.env, &session);
            agents.push(DesiredAgent {
                name,
                session_name: session,
                session_config: SessionConfig::new(agent.start_command.clone(), ".").with_env(env),
                startup_hints: Vec::new(),
                idle_timeout: agent.idle_timeout_secs.map(Duration::from_secs),
                pool_info: None,
            });
        }

        for pool in &self.pools {
            let size = pool.size.max(0) as u32;
            let drain_timeout = Duration::from_secs(pool.drain_timeout_secs);
            for n in 1..=size {
                let member_name = format!("{}-{}", pool.name, n);
                let name = AgentName::new(member_name);
                let session = session_name(&city, pool.rig.as_deref(), &name);
                pool_sessions.insert(session.clone(), drain_timeout);
                let env = with_session_env(&pool.env, &session);
                agents.push(DesiredAgent {
                    name,
                    session_name: session,
                    session_config: SessionConfig::new(pool.start_command.clone(), ".").with_env(env),
                    startup_hints: Vec::new(),
                    idle_timeout: pool.idle_timeout_secs.map(Duration::from_secs),
                    pool_info: Some(PoolInfo {
                        pool_name: pool.name.clone(),
                        drain_timeout,
                    }),
                });
            }
        }

        (agents, pool_sessions)
    }

    /// The set of session names whose agent or enclosing rig is marked
    /// `suspended = true`.
    pub fn suspended_names(&self) -> HashSet<SessionName> {
        let city = CityName::new(self.workspace.name.clone());
        let suspended_rigs: HashSet<&str> = self
            .rigs
            .iter()
            .filter(|r| r.suspended)
            .map(|r| r.path.as_str())
            .collect();

        let mut names = HashSet::new();
        for agent in &self.agents {
            let rig_suspended = agent
                .rig
                .as_deref()
                .is_some_and(|rig| suspended_rigs.contains(rig));
            if agent.suspended || rig_suspended {
                let name = AgentName::new(agent.name.clone());
                names.insert(session_name(&city, agent.rig.as_deref(), &name));
            }
        }
        for pool in &self.pools {
            let rig_suspended = pool
                .rig
                .as_deref()
                .is_some_and(|rig| suspended_rigs.contains(rig));
            if pool.suspended || rig_suspended {
                for n in 1..=pool.size.max(0) as u32 {
                    let name = AgentName::new(format!("{}-{}", pool.name, n));
                    names.insert(session_name(&city, pool.rig.as_deref(), &name));
                }
            }
        }
        names
    }
}

/// Every spawned agent is given `GC_SESSION` set to its own derived session
/// name, so a command run inside the session (e.g. `gc agent drain-check`
/// with no argument) can identify which session it's running in without the
/// caller having to pass it explicitly. An explicit `env` entry of the same
/// name wins.
fn with_session_env(configured: &BTreeMap<String, String>, session: &SessionName) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    env.insert("GC_SESSION".to_string(), session.as_str().to_string());
    env.extend(configured.clone());
    env
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
