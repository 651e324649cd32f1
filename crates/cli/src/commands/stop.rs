// SPDX-License-Identifier: MIT

//! `gc stop` — connect to the control socket and send `stop\n`, waiting for
//! the `ok\n` acknowledgement.

use anyhow::{bail, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use crate::citydir::{find_city_root, load_paths};

pub async fn run() -> Result<bool> {
    let root = find_city_root()?;
    let (_cfg, paths) = load_paths(&root)?;

    let mut stream = UnixStream::connect(&paths.socket)
        .await
        .map_err(|e| anyhow::anyhow!("connecting to {}: {e}", paths.socket.display()))?;
    stream.write_all(b"stop\n").await?;

    let mut reply = String::new();
    BufReader::new(&mut stream).read_line(&mut reply).await?;
    if reply.trim() != "ok" {
        bail!("controller did not acknowledge stop (got {reply:?})");
    }

    println!("stopped");
    Ok(true)
}
