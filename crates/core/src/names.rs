// SPDX-License-Identifier: MIT

//! Name newtypes for the entities a city manages.
//!
//! Keeping these as distinct types (rather than passing `String` everywhere)
//! stops a rig path from being handed to a function expecting a session name.

crate::define_id! {
    /// The name of a city (workspace), taken from `workspace.name` in `city.toml`.
    pub struct CityName;
}

crate::define_id! {
    /// The name of a single declared agent, scoped to its rig (if any).
    pub struct AgentName;
}

crate::define_id! {
    /// The fully-qualified name of the session backing one agent.
    ///
    /// Derived deterministically by [`session_name`] — never constructed by hand
    /// outside of tests, since two different inputs must never collide.
    pub struct SessionName;
}

/// Derive a session name from a city, an optional rig-relative path, and an
/// agent name, replacing `/` with `--` so the result is safe as a single
/// tmux/backend session identifier.
///
/// ```
/// use gc_core::names::{session_name, CityName, AgentName};
///
/// let name = session_name(&CityName::new("acme"), Some("services/api"), &AgentName::new("mayor"));
/// assert_eq!(name.as_str(), "acme--services--api--mayor");
///
/// let name = session_name(&CityName::new("acme"), None, &AgentName::new("mayor"));
/// assert_eq!(name.as_str(), "acme--mayor");
/// ```
pub fn session_name(city: &CityName, rig: Option<&str>, agent: &AgentName) -> SessionName {
    let mut parts: Vec<String> = vec![city.as_str().replace('/', "--")];
    if let Some(rig) = rig {
        if !rig.is_empty() {
            parts.push(rig.replace('/', "--"));
        }
    }
    parts.push(agent.as_str().replace('/', "--"));
    SessionName::new(parts.join("--"))
}

/// Returns true iff `name` begins with `prefix` — used by reconcile ops to
/// find every session belonging to one city among a shared backend.
pub fn has_city_prefix(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix)
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod tests;
