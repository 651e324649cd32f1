// SPDX-License-Identifier: MIT

//! The flat event record written to and read from the city's event log.
//!
//! Unlike the reconciler's internal decisions, events are a stable external
//! contract: `type` is an open string, not a closed Rust enum, so that a
//! daemon built against an older vocabulary can still append events a newer
//! reader understands, and vice versa.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line of the event log.
///
/// `seq` is assigned by the recorder at append time and is dense and
/// monotonic within a single log file; it is never set by callers of
/// `record()` ahead of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub seq: u64,
    pub ts: i64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Event {
    /// Build an event with `seq` left at zero, to be filled in by the
    /// recorder when it is appended.
    pub fn new(event_type: impl Into<String>, actor: impl Into<String>, ts: i64) -> Self {
        Self {
            seq: 0,
            ts,
            event_type: event_type.into(),
            actor: actor.into(),
            subject: None,
            message: None,
            payload: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Well-known event type strings.
///
/// This is a closed vocabulary for *writers* — everything the controller
/// itself emits uses one of these constants — but readers must tolerate
/// unrecognized `type` values from other actors (bead/mail/molecule
/// subsystems, future controller versions) without erroring.
pub mod event_type {
    pub const CONTROLLER_STARTED: &str = "controller.started";
    pub const CONTROLLER_STOPPED: &str = "controller.stopped";

    pub const AGENT_STARTED: &str = "agent.started";
    pub const AGENT_STOPPED: &str = "agent.stopped";
    pub const AGENT_CRASHED: &str = "agent.crashed";
    pub const AGENT_QUARANTINED: &str = "agent.quarantined";
    pub const AGENT_DRAINING: &str = "agent.draining";
    pub const AGENT_UNDRAINED: &str = "agent.undrained";
    pub const AGENT_IDLE_KILLED: &str = "agent.idle-killed";
    pub const AGENT_SUSPENDED: &str = "agent.suspended";

    pub const BEAD_CREATED: &str = "bead.created";
    pub const BEAD_CLOSED: &str = "bead.closed";
    pub const BEAD_CLAIMED: &str = "bead.claimed";
    pub const BEAD_UNCLAIMED: &str = "bead.unclaimed";

    pub const MAIL_SENT: &str = "mail.sent";

    pub const MOLECULE_CREATED: &str = "molecule.created";

    pub const STEP_COMPLETED: &str = "step.completed";
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
