// SPDX-License-Identifier: MIT

//! `gc events [--type T] [--since D]` and
//! `gc events watch --after-seq N [--type T] [--match k=v …] --deadline T`.

use std::time::Duration;

use anyhow::{anyhow, Result};
use gc_storage::EventRecorder;

use crate::citydir::{find_city_root, load_paths};

const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn list(event_type: Option<String>, since: Option<i64>) -> Result<bool> {
    let root = find_city_root()?;
    let (_cfg, paths) = load_paths(&root)?;
    let recorder = EventRecorder::new(paths.events);

    let events = recorder.list(since, event_type.as_deref())?;
    for event in &events {
        print_event(event);
    }
    Ok(true)
}

pub async fn watch(after_seq: u64, event_type: Option<String>, matches: Vec<String>, deadline: Duration) -> Result<bool> {
    let root = find_city_root()?;
    let (_cfg, paths) = load_paths(&root)?;
    let payload_match = parse_matches(&matches)?;

    // EventRecorder::watch blocks the calling thread for up to `deadline`;
    // run it off the async executor so it doesn't stall other tasks.
    let found = tokio::task::spawn_blocking(move || {
        let recorder = EventRecorder::new(paths.events);
        recorder.watch(after_seq, event_type.as_deref(), &payload_match, deadline, WATCH_POLL_INTERVAL)
    })
    .await??;

    match found {
        Some(event) => {
            print_event(&event);
            Ok(true)
        }
        None => Ok(false),
    }
}

fn parse_matches(matches: &[String]) -> Result<Vec<(String, String)>> {
    matches
        .iter()
        .map(|kv| {
            kv.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| anyhow!("--match expects key=value, got {kv:?}"))
        })
        .collect()
}

fn print_event(event: &gc_core::Event) {
    let subject = event.subject.as_deref().unwrap_or("-");
    let message = event.message.as_deref().unwrap_or("");
    println!("{}\t{}\t{}\t{}\t{}", event.seq, event.ts, event.event_type, subject, message);
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
