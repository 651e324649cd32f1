// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gc-daemon: the controller process for one city — startup, the
//! reconciliation loop, the control socket, and graceful shutdown.

mod controller;
mod error;
mod logging;
mod paths;

pub use controller::run;
pub use error::LifecycleError;
pub use logging::setup_logging;
pub use paths::CityPaths;
