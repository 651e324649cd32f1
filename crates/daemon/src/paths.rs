// SPDX-License-Identifier: MIT

//! Filesystem layout for one city's control-plane files, all rooted under
//! `<city root>/.<city name>/`.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CityPaths {
    pub root: PathBuf,
    pub config: PathBuf,
    pub dot_dir: PathBuf,
    pub lock: PathBuf,
    pub socket: PathBuf,
    pub pid: PathBuf,
    pub events: PathBuf,
    pub log_dir: PathBuf,
}

impl CityPaths {
    pub fn new(root: impl AsRef<Path>, city_name: &str) -> Self {
        let root = root.as_ref().to_path_buf();
        let dot_dir = root.join(format!(".{city_name}"));
        Self {
            config: root.join("city.toml"),
            lock: dot_dir.join("controller.lock"),
            socket: dot_dir.join("controller.sock"),
            pid: dot_dir.join("daemon.pid"),
            events: dot_dir.join("events.jsonl"),
            log_dir: dot_dir.clone(),
            dot_dir,
            root,
        }
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
