// SPDX-License-Identifier: MIT

//! Controller log setup: daily-rotated file logging via `tracing-appender`,
//! with old rotated files pruned at startup.

use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "daemon.log";
const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Install a daily-rotating file subscriber under `log_dir/daemon.log.<date>`.
///
/// The returned guard must be held for the process lifetime — dropping it
/// stops the background writer thread and any buffered lines are lost.
pub fn setup_logging(log_dir: &Path) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    prune_old_logs(log_dir);

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // try_init, not init: a test process (or an embedding CLI that already
    // installed a subscriber) may call this more than once per process.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .try_init();

    Ok(guard)
}

/// Delete rotated log files older than [`RETENTION`]. Best-effort: a file
/// whose modified time can't be read is left alone rather than guessed at.
fn prune_old_logs(log_dir: &Path) {
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return;
    };
    let now = SystemTime::now();

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(LOG_FILE_PREFIX) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else { continue };
        let Ok(modified) = metadata.modified() else { continue };
        if now.duration_since(modified).unwrap_or_default() > RETENTION {
            let _ = std::fs::remove_file(entry.path());
        }
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
