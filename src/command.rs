//! Slash-command dispatcher.
//!
//! Maps a line starting with `/` to the text sent back to the client:
//! - `/time`: current timestamp (RFC 3339)
//! - `/quit`: farewell; the session closes after sending it
//! - `/echo <args>`: arguments joined by single spaces
//!
//! Anything else is echoed back unchanged. Dispatch never fails.

use chrono::{DateTime, Local, SecondsFormat, TimeZone};

use crate::protocol::Response;

/// Parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// Report the server's current time
    Time,
    /// Say goodbye and close the connection
    Quit,
    /// Repeat the arguments
    Echo { args: Vec<&'a str> },
    /// Not a known command; the whole line is echoed
    Unknown { line: &'a str },
}

impl<'a> Command<'a> {
    /// Parse a trimmed line that starts with `/`.
    pub fn parse(line: &'a str) -> Self {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();

        match name.as_str() {
            "/time" => Command::Time,
            "/quit" => Command::Quit,
            "/echo" => Command::Echo {
                args: parts.collect(),
            },
            _ => Command::Unknown { line },
        }
    }

    /// Whether the session ends once this command's reply is sent
    pub fn ends_session(&self) -> bool {
        matches!(self, Command::Quit)
    }

    /// Render the reply against the local clock.
    pub fn reply(&self) -> String {
        self.reply_at(Local::now())
    }

    /// Render the reply, using `now` for `/time`.
    pub fn reply_at<Tz>(&self, now: DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        match self {
            Command::Time => format!("{}\n", now.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Command::Quit => Response::farewell().to_string(),
            Command::Echo { args } => format!("{}\n", args.join(" ")),
            Command::Unknown { line } => format!("{line}\n"),
        }
    }
}
