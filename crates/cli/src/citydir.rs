// SPDX-License-Identifier: MIT

//! Locating the city root: the nearest ancestor directory (starting from
//! the current directory) containing a `city.toml`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use gc_config::CityConfig;
use gc_daemon::CityPaths;

/// Walk upward from the current directory looking for `city.toml`.
pub fn find_city_root() -> Result<PathBuf> {
    let start = std::env::current_dir()?;
    find_city_root_from(&start)
}

fn find_city_root_from(start: &Path) -> Result<PathBuf> {
    let mut dir = start;
    loop {
        if dir.join("city.toml").is_file() {
            return Ok(dir.to_path_buf());
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return Err(anyhow!("no city.toml found in {} or any parent directory", start.display())),
        }
    }
}

/// Load and validate the config at the city root, and derive its filesystem
/// layout. Used by every subcommand that needs to talk to a city without
/// starting the controller itself.
pub fn load_paths(root: &Path) -> Result<(CityConfig, CityPaths)> {
    let cfg = CityConfig::load(root)?;
    cfg.validate()?;
    let paths = CityPaths::new(root, &cfg.workspace.name);
    Ok((cfg, paths))
}

#[cfg(test)]
#[path = "citydir_tests.rs"]
mod tests;
