//! Per-connection session handling.
//!
//! A session owns one client connection and its transcript handle from
//! accept to close. Each iteration re-arms the idle timeout, reads one
//! newline-terminated line, normalizes it, appends it to the transcript and
//! writes the reply. Dropping the session releases the connection and the
//! transcript on every exit path.

use chrono::{Local, SecondsFormat};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
    WriteHalf,
};
use tracing::{debug, error, info, warn};

use crate::client_log::ClientLog;
use crate::config::Config;
use crate::protocol::{Message, Reply, Response};

/// Starting (and post-overflow) capacity of the line buffer
const LINE_CAPACITY: usize = 256;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// No line arrived within the idle timeout
    Idle,
    /// Client closed its side (or left a final unterminated line)
    PeerClosed,
    /// Reading from the client failed
    ReadFailed,
    /// Client said `bye` or `/quit`
    Farewell,
    /// Writing to the client failed
    WriteFailed,
    /// The transcript could not be opened
    LogUnavailable,
}

impl std::fmt::Display for Disconnect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Disconnect::Idle => "idle timeout",
            Disconnect::PeerClosed => "peer closed",
            Disconnect::ReadFailed => "read error",
            Disconnect::Farewell => "farewell",
            Disconnect::WriteFailed => "write error",
            Disconnect::LogUnavailable => "transcript unavailable",
        };
        f.write_str(reason)
    }
}

/// Handle a single client connection until it ends.
///
/// Failures never escape the session; the returned reason is informational.
#[tracing::instrument(name = "session", skip_all, fields(peer = %peer))]
pub async fn handle_connection<S>(stream: S, peer: SocketAddr, config: Arc<Config>) -> Disconnect
where
    S: AsyncRead + AsyncWrite,
{
    let log = match ClientLog::open(&config.log_dir, &peer).await {
        Ok(log) => log,
        Err(e) => {
            warn!(error = %e, "Could not open client log");
            return Disconnect::LogUnavailable;
        }
    };

    info!(at = %timestamp(), "Connected");

    let (reader, writer) = tokio::io::split(stream);
    let mut session = Session {
        reader: BufReader::new(reader),
        writer,
        log,
        idle_timeout: config.idle_timeout,
        max_message_len: config.max_message_len,
    };

    let reason = session.run().await;
    info!(at = %timestamp(), %reason, "Disconnected");
    reason
}

struct Session<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    log: ClientLog,
    idle_timeout: Duration,
    max_message_len: usize,
}

/// Outcome of reading one client line
enum LineRead {
    /// A newline-terminated line; `overflowed` when bytes past the cap were dropped
    Line { overflowed: bool },
    /// EOF, possibly after an unterminated final line
    Eof,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite,
{
    async fn run(&mut self) -> Disconnect {
        let mut line = Vec::with_capacity(LINE_CAPACITY);

        loop {
            line.clear();

            let read = tokio::time::timeout(self.idle_timeout, self.read_line(&mut line)).await;

            let overflowed = match read {
                Err(_) => {
                    if let Err(e) = self.writer.write_all(Response::inactivity()).await {
                        debug!(error = %e, "Failed to send inactivity notice");
                    }
                    return Disconnect::Idle;
                }
                Ok(Err(e)) => {
                    debug!(error = %e, "Read failed");
                    return Disconnect::ReadFailed;
                }
                Ok(Ok(LineRead::Eof)) => return Disconnect::PeerClosed,
                Ok(Ok(LineRead::Line { overflowed })) => overflowed,
            };

            let mut msg = Message::normalize(&line, self.max_message_len);
            msg.truncated |= overflowed;

            if overflowed {
                line.clear();
                line.shrink_to(LINE_CAPACITY);
            }

            if msg.truncated {
                if let Err(e) = self.writer.write_all(Response::truncated()).await {
                    error!(error = %e, "Write error");
                    return Disconnect::WriteFailed;
                }
            }

            if let Err(e) = self.log.append(&msg.text).await {
                warn!(error = %e, path = %self.log.path().display(), "Failed to append to client log");
            }

            let reply = Reply::for_message(&msg.text);

            if let Err(e) = self.writer.write_all(reply.text.as_bytes()).await {
                error!(error = %e, "Write error");
                return Disconnect::WriteFailed;
            }

            if reply.close {
                return Disconnect::Farewell;
            }
        }
    }

    /// Read one line into `line`, keeping at most `line_cap` bytes of it.
    async fn read_line(&mut self, line: &mut Vec<u8>) -> std::io::Result<LineRead> {
        let cap = line_cap(self.max_message_len);
        (&mut self.reader).take(cap).read_until(b'\n', line).await?;

        if line.ends_with(b"\n") {
            return Ok(LineRead::Line { overflowed: false });
        }
        if (line.len() as u64) < cap {
            return Ok(LineRead::Eof);
        }

        // Over the cap: drop the rest of the line without buffering it
        loop {
            let (used, found) = {
                let buf = self.reader.fill_buf().await?;
                if buf.is_empty() {
                    return Ok(LineRead::Eof);
                }
                match buf.iter().position(|&b| b == b'\n') {
                    Some(pos) => (pos + 1, true),
                    None => (buf.len(), false),
                }
            };
            self.reader.consume(used);

            if found {
                return Ok(LineRead::Line { overflowed: true });
            }
        }
    }
}

/// Bytes kept from one line: enough for `max_chars` four-byte characters plus slack
fn line_cap(max_chars: usize) -> u64 {
    (max_chars as u64 + 1) * 4
}

fn timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
