//! Per-client transcript files.
//!
//! Every distinct client IP gets one `<ip>.log` file. Sessions from the same
//! IP each open their own append-mode handle on it; each record goes out in a
//! single write so concurrent appenders interleave whole lines.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::protocol::Response;

/// Append-only transcript for one session
#[derive(Debug)]
pub struct ClientLog {
    file: File,
    path: PathBuf,
}

impl ClientLog {
    /// Open (creating if needed) the transcript for `peer` inside `dir`.
    pub async fn open(dir: &Path, peer: &SocketAddr) -> std::io::Result<Self> {
        let path = dir.join(file_name(peer));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(ClientLog { file, path })
    }

    /// Append one message as a line.
    pub async fn append(&mut self, msg: &str) -> std::io::Result<()> {
        self.file.write_all(&Response::record(msg)).await?;
        // tokio hands the write to a blocking thread; wait for it to land
        self.file.flush().await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Transcript file name for a peer: its IP without the port.
///
/// IPv4 clients reaching the dual-stack listener show up as `::ffff:a.b.c.d`
/// and are filed under their plain IPv4 address.
pub fn file_name(peer: &SocketAddr) -> String {
    format!("{}.log", peer.ip().to_canonical())
}
