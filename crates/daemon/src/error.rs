// SPDX-License-Identifier: MIT

//! Controller startup/shutdown errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("loading city.toml: {0}")]
    Config(#[from] gc_config::ConfigError),

    #[error("controller already running for this city")]
    LockFailed(#[source] io::Error),

    #[error("binding control socket at {0}: {1}")]
    BindFailed(PathBuf, io::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
