//! Line protocol: message normalization and reply classification.
//!
//! Each client line is trimmed, capped in length, and then answered:
//! - empty line: a prompt to say something
//! - `hello` / `bye` (any case): greeting / farewell (farewell closes)
//! - `/...`: handed to the command dispatcher
//! - anything else: echoed back

use bytes::BytesMut;

use crate::command::Command;

/// A client line after trimming and truncation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    /// Set when the line was cut down to the length limit
    pub truncated: bool,
}

impl Message {
    /// Normalize a raw line (delimiter included) read from the client.
    pub fn normalize(raw: &[u8], max_len: usize) -> Self {
        let decoded = String::from_utf8_lossy(raw);
        let trimmed = decoded.trim();

        match trimmed.char_indices().nth(max_len) {
            Some((cut, _)) => Message {
                text: trimmed[..cut].to_string(),
                truncated: true,
            },
            None => Message {
                text: trimmed.to_string(),
                truncated: false,
            },
        }
    }
}

/// What to send back for one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Close the session once `text` has been sent
    pub close: bool,
}

impl Reply {
    fn keep(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            close: false,
        }
    }

    fn close(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            close: true,
        }
    }

    /// Classify a normalized message; the first matching rule wins.
    pub fn for_message(msg: &str) -> Self {
        if msg.is_empty() {
            Reply::keep(Response::prompt())
        } else if msg.eq_ignore_ascii_case("hello") {
            Reply::keep(Response::greeting())
        } else if msg.eq_ignore_ascii_case("bye") {
            Reply::close(Response::farewell())
        } else if msg.starts_with('/') {
            let command = Command::parse(msg);
            let text = command.reply();
            if command.ends_session() {
                Reply::close(text)
            } else {
                Reply::keep(text)
            }
        } else {
            Reply::keep(Response::echo(msg))
        }
    }
}

/// Fixed server texts
pub struct Response;

impl Response {
    /// Reply to an empty line
    pub fn prompt() -> &'static str {
        "Say something...\n"
    }

    /// Reply to `hello`
    pub fn greeting() -> &'static str {
        "Hi there!\n"
    }

    /// Reply to `bye` and `/quit`
    pub fn farewell() -> &'static str {
        "Goodbye!\n"
    }

    /// Notice sent before the reply to an over-long line
    pub fn truncated() -> &'static [u8] {
        b"Message too long, truncated\n"
    }

    /// Notice sent when the idle timeout fires
    pub fn inactivity() -> &'static [u8] {
        b"Disconnected due to inactivity\n"
    }

    /// Echo a message back
    pub fn echo(msg: &str) -> String {
        format!("{msg}\n")
    }

    /// One transcript record: the message and a newline, as a single buffer
    pub fn record(msg: &str) -> BytesMut {
        let mut record = BytesMut::with_capacity(msg.len() + 1);
        record.extend_from_slice(msg.as_bytes());
        record.extend_from_slice(b"\n");
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_whitespace() {
        let msg = Message::normalize(b"  \t hi there \r\n", 1024);
        assert_eq!(msg.text, "hi there");
        assert!(!msg.truncated);

        let msg = Message::normalize(b"\n", 1024);
        assert_eq!(msg.text, "");
    }

    #[test]
    fn test_normalize_truncates_long_lines() {
        let raw = format!("{}\n", "x".repeat(1500));
        let msg = Message::normalize(raw.as_bytes(), 1024);
        assert_eq!(msg.text.len(), 1024);
        assert!(msg.truncated);
    }

    #[test]
    fn test_normalize_limit_is_inclusive() {
        let raw = format!("{}\n", "y".repeat(1024));
        let msg = Message::normalize(raw.as_bytes(), 1024);
        assert_eq!(msg.text.len(), 1024);
        assert!(!msg.truncated);
    }

    #[test]
    fn test_normalize_counts_characters() {
        let raw = format!("{}\n", "é".repeat(10));
        let msg = Message::normalize(raw.as_bytes(), 4);
        assert_eq!(msg.text, "éééé");
        assert!(msg.truncated);
    }

    #[test]
    fn test_normalize_replaces_invalid_utf8() {
        let msg = Message::normalize(b"ab\xffcd\n", 1024);
        assert_eq!(msg.text, "ab\u{fffd}cd");
    }

    #[test]
    fn test_reply_classification() {
        assert_eq!(Reply::for_message(""), Reply::keep("Say something...\n"));
        assert_eq!(Reply::for_message("hello"), Reply::keep("Hi there!\n"));
        assert_eq!(Reply::for_message("HeLLo"), Reply::keep("Hi there!\n"));
        assert_eq!(Reply::for_message("BYE"), Reply::close("Goodbye!\n"));
        assert_eq!(Reply::for_message("hello world"), Reply::keep("hello world\n"));
        assert_eq!(Reply::for_message("just text"), Reply::keep("just text\n"));
    }

    #[test]
    fn test_reply_slash_commands() {
        assert_eq!(Reply::for_message("/echo a b c"), Reply::keep("a b c\n"));
        assert_eq!(Reply::for_message("/echo"), Reply::keep("\n"));
        assert_eq!(Reply::for_message("/quit"), Reply::close("Goodbye!\n"));
        assert_eq!(Reply::for_message("/QUIT now"), Reply::close("Goodbye!\n"));
        assert_eq!(Reply::for_message("/unknown"), Reply::keep("/unknown\n"));
    }

    #[test]
    fn test_record() {
        assert_eq!(&Response::record("line")[..], b"line\n");
        assert_eq!(&Response::record("")[..], b"\n");
    }
}
