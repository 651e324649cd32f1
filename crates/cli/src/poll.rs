// SPDX-License-Identifier: MIT

//! A small polling-loop helper for CLI commands that watch a changing
//! file or process and need Ctrl-C to interrupt cleanly.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Result of waiting for the next poll tick.
pub enum Tick {
    /// Ready for the next poll iteration.
    Ready,
    /// Ctrl-C was pressed.
    Interrupted,
}

/// A polling loop with interval timing and Ctrl-C handling, for commands
/// that follow something indefinitely (e.g. `gc logs -f`).
pub struct Poller {
    interval: Duration,
    ctrl_c: Pin<Box<dyn Future<Output = std::io::Result<()>>>>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ctrl_c: Box::pin(tokio::signal::ctrl_c()),
        }
    }

    pub async fn tick(&mut self) -> Tick {
        tokio::select! {
            _ = &mut self.ctrl_c => Tick::Interrupted,
            _ = tokio::time::sleep(self.interval) => Tick::Ready,
        }
    }
}
