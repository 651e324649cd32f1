// SPDX-License-Identifier: MIT

//! `gc agent drain|undrain|drain-check|drain-ack|request-restart` — act
//! directly on the session backend's metadata bag. These commands don't go
//! through the control socket: the socket's only protocol is `stop`/`ok`,
//! so every other control action is taken directly against the backend,
//! whether or not a controller is currently running for this city.

use anyhow::{anyhow, Result};
use gc_adapters::TmuxAdapter;
use gc_config::CityConfig;
use gc_core::SessionName;
use gc_engine::{DrainOps, SessionDrainOps};

use crate::citydir::find_city_root;

/// Resolve an explicit agent name (bare, e.g. `mayor`) or a derived session
/// name (e.g. `acme--mayor`) to the session it refers to.
///
/// When `name` is `None`, falls back to `GC_SESSION` — set by the controller
/// in every spawned agent's environment — so a command run *inside* a
/// session (with no argument) resolves to "the session I'm running in".
fn resolve_session(cfg: &CityConfig, name: Option<String>) -> Result<SessionName> {
    resolve_session_with(cfg, name, std::env::var("GC_SESSION").ok())
}

fn resolve_session_with(cfg: &CityConfig, name: Option<String>, gc_session_env: Option<String>) -> Result<SessionName> {
    if let Some(name) = name {
        let (desired, _) = cfg.to_desired_agents();
        let mut matches: Vec<SessionName> = desired
            .iter()
            .filter(|a| a.name.as_str() == name || a.session_name.as_str() == name)
            .map(|a| a.session_name.clone())
            .collect();
        matches.dedup();
        return match matches.len() {
            0 => Err(anyhow!("no agent named {name:?} in this city")),
            1 => Ok(matches.remove(0)),
            _ => Err(anyhow!(
                "agent name {name:?} is ambiguous across rigs: {}",
                matches.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
            )),
        };
    }

    gc_session_env
        .map(SessionName::new)
        .ok_or_else(|| anyhow!("no agent name given and GC_SESSION is not set in this environment"))
}

fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn drain_ops() -> SessionDrainOps<TmuxAdapter> {
    SessionDrainOps::new(TmuxAdapter::new())
}

pub async fn drain(name: Option<String>) -> Result<bool> {
    let root = find_city_root()?;
    let cfg = CityConfig::load(&root)?;
    cfg.validate()?;
    let session = resolve_session(&cfg, name)?;

    drain_ops().set_drain(&session, now_unix()).await;
    println!("{} is now draining", session.as_str());
    Ok(true)
}

pub async fn undrain(name: Option<String>) -> Result<bool> {
    let root = find_city_root()?;
    let cfg = CityConfig::load(&root)?;
    cfg.validate()?;
    let session = resolve_session(&cfg, name)?;

    drain_ops().clear_drain(&session).await;
    println!("{} is no longer draining", session.as_str());
    Ok(true)
}

pub async fn drain_check(name: Option<String>) -> Result<bool> {
    let root = find_city_root()?;
    let cfg = CityConfig::load(&root)?;
    cfg.validate()?;
    let session = resolve_session(&cfg, name)?;

    let draining = drain_ops().is_draining(&session).await;
    println!("{}", if draining { "draining" } else { "not draining" });
    Ok(draining)
}

pub async fn drain_ack(name: Option<String>) -> Result<bool> {
    let root = find_city_root()?;
    let cfg = CityConfig::load(&root)?;
    cfg.validate()?;
    let session = resolve_session(&cfg, name)?;

    drain_ops().set_drain_ack(&session).await;
    println!("acked drain for {}", session.as_str());
    Ok(true)
}

pub async fn request_restart(name: Option<String>) -> Result<bool> {
    let root = find_city_root()?;
    let cfg = CityConfig::load(&root)?;
    cfg.validate()?;
    let session = resolve_session(&cfg, name)?;

    drain_ops().set_restart_requested(&session).await;
    println!("restart requested for {}", session.as_str());
    Ok(true)
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
