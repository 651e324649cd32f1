// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gc-core: shared types for the Gas City workspace orchestrator.
//!
//! Nothing in this crate knows how an agent is actually supervised — that's
//! `gc-adapters` and `gc-engine`. This crate only models identity (`id`,
//! `names`), the external event contract (`event`), and the desired-state
//! shape the reconciler diffs against reality (`desired_agent`).

pub mod desired_agent;
pub mod event;
pub mod id;
pub mod names;
pub mod time_fmt;

pub use desired_agent::{DesiredAgent, Fingerprint, PoolInfo, SessionConfig};
pub use event::{event_type, Event};
pub use id::ShortId;
pub use names::{has_city_prefix, session_name, AgentName, CityName, SessionName};
pub use time_fmt::{format_elapsed, format_elapsed_ms};
