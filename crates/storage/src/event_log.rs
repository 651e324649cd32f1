// SPDX-License-Identifier: MIT

//! Append-only JSON-lines event log.
//!
//! Writers open the file, take an exclusive advisory lock for the duration
//! of one append, tail-scan to find the last `seq`, and write the next
//! record followed by a newline. Readers tolerate a torn final line (a
//! writer that died mid-append) by silently discarding it.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use gc_core::Event;
use serde_json::Value;
use thiserror::Error;

/// How many trailing bytes of the log to scan for the last complete line.
/// Generous relative to a single JSON event line; avoids reading the whole
/// file just to find the last `seq`.
const TAIL_SCAN_BYTES: u64 = 64 * 1024;

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serializing event: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only event log backing one city's `.{'<city>'}/events.jsonl`.
pub struct EventRecorder {
    path: PathBuf,
}

impl EventRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open_append(&self) -> Result<File, EventLogError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| EventLogError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| EventLogError::Io {
                path: self.path.clone(),
                source,
            })
    }

    /// Append `event` to the log, assigning its `seq` as `head() + 1`.
    /// Returns the event as actually written (with `seq` populated).
    ///
    /// Appends are serialized by an exclusive advisory lock held for the
    /// duration of this call; concurrent writers from other processes block
    /// rather than interleave.
    pub fn record(&self, mut event: Event) -> Result<Event, EventLogError> {
        let mut file = self.open_append()?;
        file.lock_exclusive().map_err(|source| EventLogError::Io {
            path: self.path.clone(),
            source,
        })?;

        let result = (|| {
            let last_seq = tail_last_seq(&file, &self.path)?;
            event.seq = last_seq + 1;
            let mut line = serde_json::to_vec(&event)?;
            line.push(b'\n');
            file.write_all(&line).map_err(|source| EventLogError::Io {
                path: self.path.clone(),
                source,
            })?;
            Ok(event)
        })();

        let _ = file.unlock();
        result
    }

    /// The highest `seq` currently in the log, or 0 if it is empty or
    /// doesn't exist yet.
    pub fn head(&self) -> Result<u64, EventLogError> {
        let file = self.open_append()?;
        tail_last_seq(&file, &self.path)
    }

    /// All events with `ts >= since` (if given) and `type == event_type`
    /// (if given), in log order. Tolerates a torn trailing line.
    pub fn list(&self, since: Option<i64>, event_type: Option<&str>) -> Result<Vec<Event>, EventLogError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(EventLogError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let reader = BufReader::new(file);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => break, // torn tail: stop, don't error
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let event: Event = match serde_json::from_str(trimmed) {
                Ok(e) => e,
                Err(_) => break, // torn tail
            };
            if let Some(since) = since {
                if event.ts < since {
                    continue;
                }
            }
            if let Some(event_type) = event_type {
                if event.event_type != event_type {
                    continue;
                }
            }
            events.push(event);
        }
        Ok(events)
    }

    /// Block until an event with `seq > after_seq` matching `event_type`
    /// and `payload_match` appears, or `overall_deadline` elapses.
    ///
    /// Re-scans only the bytes appended since the last poll; never buffers
    /// the whole file.
    pub fn watch(
        &self,
        after_seq: u64,
        event_type: Option<&str>,
        payload_match: &[(String, String)],
        overall_deadline: Duration,
        poll_interval: Duration,
    ) -> Result<Option<Event>, EventLogError> {
        let started = Instant::now();
        let mut offset = 0u64;

        loop {
            if let Some(file) = open_read_optional(&self.path)? {
                let mut reader = BufReader::new(&file);
                reader.seek(SeekFrom::Start(offset)).map_err(|source| EventLogError::Io {
                    path: self.path.clone(),
                    source,
                })?;

                loop {
                    let mut line = String::new();
                    let bytes_read = match reader.read_line(&mut line) {
                        Ok(0) => break,
                        Ok(n) => n as u64,
                        Err(_) => break,
                    };

                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        offset += bytes_read;
                        continue;
                    }
                    if !line.ends_with('\n') {
                        // Torn tail: don't advance offset, retry next poll.
                        break;
                    }

                    let event: Event = match serde_json::from_str(trimmed) {
                        Ok(e) => e,
                        Err(_) => break,
                    };
                    offset += bytes_read;

                    if event.seq <= after_seq {
                        continue;
                    }
                    if let Some(event_type) = event_type {
                        if event.event_type != event_type {
                            continue;
                        }
                    }
                    if event_matches_payload(&event, payload_match) {
                        return Ok(Some(event));
                    }
                }
            }

            if started.elapsed() >= overall_deadline {
                return Ok(None);
            }
            std::thread::sleep(poll_interval.min(overall_deadline.saturating_sub(started.elapsed())));
        }
    }
}

fn open_read_optional(path: &Path) -> Result<Option<File>, EventLogError> {
    match File::open(path) {
        Ok(f) => Ok(Some(f)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(EventLogError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn event_matches_payload(event: &Event, payload_match: &[(String, String)]) -> bool {
    if payload_match.is_empty() {
        return true;
    }
    let Some(Value::Object(map)) = &event.payload else {
        return false;
    };
    payload_match.iter().all(|(key, expected)| {
        map.get(key)
            .map(|v| value_to_compare_string(v) == *expected)
            .unwrap_or(false)
    })
}

fn value_to_compare_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Scan the trailing [`TAIL_SCAN_BYTES`] of `file` for the highest `seq` of
/// any complete (newline-terminated) JSON line. A torn final line is
/// ignored, not treated as corruption.
fn tail_last_seq(file: &File, path: &Path) -> Result<u64, EventLogError> {
    let len = file.metadata().map_err(|source| EventLogError::Io {
        path: path.to_path_buf(),
        source,
    })?.len();

    if len == 0 {
        return Ok(0);
    }

    let start = len.saturating_sub(TAIL_SCAN_BYTES);
    let mut reader = file.try_clone().map_err(|source| EventLogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    reader.seek(SeekFrom::Start(start)).map_err(|source| EventLogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).map_err(|source| EventLogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let text = String::from_utf8_lossy(&buf);
    let mut max_seq = 0u64;
    let mut lines: Vec<&str> = text.split('\n').collect();
    // If we didn't start at byte 0, the first chunk may be a partial line
    // from the middle of a record; drop it unless we started at the
    // true beginning of the file.
    if start > 0 {
        lines.remove(0);
    }
    // The text may or may not end with a trailing newline; if the last
    // element is non-empty it's an unterminated (torn) line and must be
    // ignored.
    if let Some(last) = lines.last() {
        if !last.trim().is_empty() && !text.ends_with('\n') {
            lines.pop();
        }
    }

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Ok(event) = serde_json::from_str::<Event>(trimmed) {
            max_seq = max_seq.max(event.seq);
        }
    }

    Ok(max_seq)
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
