// SPDX-License-Identifier: MIT

//! `gc start` — acquire the city lock and run the controller in-process
//! until it's told to stop.

use anyhow::Result;
use gc_adapters::TmuxAdapter;

use crate::citydir::find_city_root;

pub async fn run() -> Result<bool> {
    let root = find_city_root()?;
    gc_daemon::run(root, TmuxAdapter::new()).await?;
    Ok(true)
}
