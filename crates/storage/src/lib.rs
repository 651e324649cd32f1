// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The append-only JSON-lines event log backing a city's `events.jsonl`.

mod event_log;

pub use event_log::{EventLogError, EventRecorder};
