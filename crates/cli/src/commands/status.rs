// SPDX-License-Identifier: MIT

//! `gc status` — print whether a live controller is running for this city,
//! cleaning up a stale PID file left behind by a process that died without
//! shutting down cleanly.

use std::process::Command;

use anyhow::Result;

use crate::citydir::{find_city_root, load_paths};

pub async fn run() -> Result<bool> {
    let root = find_city_root()?;
    let (cfg, paths) = load_paths(&root)?;

    let Some(pid) = read_pid(&paths.pid) else {
        println!("not running");
        return Ok(false);
    };

    if process_exists(pid) {
        println!("running (pid {pid}, city '{}')", cfg.workspace.name);
        Ok(true)
    } else {
        let _ = std::fs::remove_file(&paths.pid);
        println!("not running (stale pid file removed)");
        Ok(false)
    }
}

fn read_pid(path: &std::path::Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn process_exists(pid: u32) -> bool {
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
