// SPDX-License-Identifier: MIT

//! `gc logs -n <lines> [-f]` — tail the controller's log file.
//!
//! `tracing-appender`'s daily roller names files `daemon.log.<date>`; there
//! is no fixed filename to open, so this finds the most recently dated file
//! under the city's log directory (ISO dates sort correctly as strings).

use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::citydir::{find_city_root, load_paths};
use crate::poll::{Poller, Tick};

const LOG_FILE_PREFIX: &str = "daemon.log";
const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub async fn run(lines: usize, follow: bool) -> Result<bool> {
    let root = find_city_root()?;
    let (_cfg, paths) = load_paths(&root)?;

    let log_path = latest_log_file(&paths.log_dir)
        .ok_or_else(|| anyhow!("no log file found under {}", paths.log_dir.display()))?;

    let text = std::fs::read_to_string(&log_path)?;
    for line in tail_lines(&text, lines) {
        println!("{line}");
    }

    if follow {
        follow_file(&log_path).await?;
    }

    Ok(true)
}

fn latest_log_file(log_dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(log_dir).ok()?;
    entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            name.starts_with(LOG_FILE_PREFIX).then_some((name, entry.path()))
        })
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, path)| path)
}

fn tail_lines(text: &str, n: usize) -> Vec<&str> {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(n);
    all[start..].to_vec()
}

async fn follow_file(path: &Path) -> Result<()> {
    let mut file = std::fs::File::open(path)?;
    let mut offset = file.metadata()?.len();
    let mut poller = Poller::new(POLL_INTERVAL);

    loop {
        if matches!(poller.tick().await, Tick::Interrupted) {
            return Ok(());
        }
        let len = std::fs::metadata(path)?.len();
        if len < offset {
            // Rolled over to a new file: start again from the top of this one.
            offset = 0;
        }
        if len == offset {
            continue;
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        print!("{buf}");
        offset = len;
    }
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
