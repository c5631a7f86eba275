//! Minimal STOMP 1.2 frame codec.
//!
//! Only the client side of the protocol is covered: the commands a client
//! sends (`CONNECT`, `SUBSCRIBE`, `UNSUBSCRIBE`, `DISCONNECT`) and the ones a
//! broker answers with (`CONNECTED`, `MESSAGE`, `RECEIPT`, `ERROR`). Frames
//! travel one or more per WebSocket text message; bare EOLs between frames
//! are heart-beats.

use std::fmt::Write as _;
use std::time::Duration;

use strum::{AsRefStr, Display, EnumString};

use crate::error::Error;

/// Heart-beat EOL sent when the client has nothing else to say.
pub const HEARTBEAT_EOL: &str = "\n";

// ── Command ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Command {
    Connect,
    Stomp,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Ack,
    Nack,
    Begin,
    Commit,
    Abort,
    Disconnect,
    Message,
    Receipt,
    Error,
}

impl Command {
    /// `CONNECT` and `CONNECTED` headers are never escaped.
    fn escapes_headers(self) -> bool {
        !matches!(self, Self::Connect | Self::Connected)
    }
}

// ── Frame ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    /// Headers in wire order. Lookups return the first occurrence.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// First value for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    // ── Client frames ────────────────────────────────────────────────

    pub fn connect(host: &str, heart_beat: HeartBeat) -> Self {
        Self::new(Command::Connect)
            .header("accept-version", "1.2")
            .header("host", host)
            .header("heart-beat", &heart_beat.to_string())
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new(Command::Subscribe)
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn disconnect() -> Self {
        Self::new(Command::Disconnect)
    }

    // ── Encoding ─────────────────────────────────────────────────────

    /// Serialize to the wire form, including the trailing NUL.
    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_ref());
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                let _ = write!(out, "{}:{}", escape_header(name), escape_header(value));
            } else {
                let _ = write!(out, "{name}:{value}");
            }
            out.push('\n');
        }
        if !self.body.is_empty() && self.get("content-length").is_none() {
            let _ = writeln!(out, "content-length:{}", self.body.len());
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    // ── Decoding ─────────────────────────────────────────────────────

    /// Decode every frame in one WebSocket text message.
    ///
    /// A message made only of EOLs decodes to an empty list (heart-beat).
    pub fn decode_all(input: &str) -> Result<Vec<Self>, Error> {
        let mut frames = Vec::new();
        let mut rest = input;
        loop {
            rest = rest.trim_start_matches(['\r', '\n']);
            if rest.is_empty() {
                return Ok(frames);
            }
            let (frame, remaining) = Self::decode_one(rest)?;
            frames.push(frame);
            rest = remaining;
        }
    }

    fn decode_one(input: &str) -> Result<(Self, &str), Error> {
        let (command_line, mut rest) = split_line(input)
            .ok_or_else(|| protocol("frame has no command line"))?;
        let command: Command = command_line
            .parse()
            .map_err(|_| protocol(format!("unknown command {command_line:?}")))?;

        let mut headers = Vec::new();
        loop {
            let (line, after) =
                split_line(rest).ok_or_else(|| protocol("frame headers are not terminated"))?;
            rest = after;
            if line.is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| protocol(format!("malformed header {line:?}")))?;
            if command.escapes_headers() {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_owned(), value.to_owned()));
            }
        }

        let content_length = headers
            .iter()
            .find(|(k, _)| k == "content-length")
            .map(|(_, v)| {
                v.trim()
                    .parse::<usize>()
                    .map_err(|_| protocol(format!("bad content-length {v:?}")))
            })
            .transpose()?;

        let (body, remaining) = match content_length {
            Some(len) => {
                let body = rest
                    .get(..len)
                    .ok_or_else(|| protocol("body shorter than content-length"))?;
                let after = rest
                    .get(len..)
                    .and_then(|r| r.strip_prefix('\0'))
                    .ok_or_else(|| protocol("frame body is not NUL-terminated"))?;
                (body, after)
            }
            None => {
                let end = rest
                    .find('\0')
                    .ok_or_else(|| protocol("frame body is not NUL-terminated"))?;
                (&rest[..end], &rest[end + 1..])
            }
        };

        Ok((
            Self {
                command,
                headers,
                body: body.to_owned(),
            },
            remaining,
        ))
    }
}

/// Split off one line, accepting both `\n` and `\r\n` endings.
fn split_line(input: &str) -> Option<(&str, &str)> {
    let idx = input.find('\n')?;
    let line = &input[..idx];
    Some((line.strip_suffix('\r').unwrap_or(line), &input[idx + 1..]))
}

fn protocol(message: impl Into<String>) -> Error {
    Error::Stomp {
        message: message.into(),
    }
}

fn escape_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(raw: &str) -> Result<String, Error> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => return Err(protocol(format!("invalid header escape \\{other:?}"))),
        }
    }
    Ok(out)
}

// ── Heart-beating ────────────────────────────────────────────────────

/// A `heart-beat` header value: `outgoing,incoming` in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeartBeat {
    pub outgoing_ms: u64,
    pub incoming_ms: u64,
}

impl HeartBeat {
    pub fn new(outgoing: Duration, incoming: Duration) -> Self {
        Self {
            outgoing_ms: u64::try_from(outgoing.as_millis()).unwrap_or(u64::MAX),
            incoming_ms: u64::try_from(incoming.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Parse a header value; anything malformed disables heart-beating.
    pub fn parse(value: &str) -> Self {
        let mut parts = value.split(',').map(|p| p.trim().parse::<u64>().ok());
        match (parts.next().flatten(), parts.next().flatten()) {
            (Some(outgoing_ms), Some(incoming_ms)) => Self {
                outgoing_ms,
                incoming_ms,
            },
            _ => Self::default(),
        }
    }

    /// Negotiate the effective intervals from the client's offer and the
    /// server's answer. Returns `(send_every, expect_within)`; `None` means
    /// that direction is disabled.
    pub fn negotiate(client: Self, server: Self) -> (Option<Duration>, Option<Duration>) {
        let pick = |ours: u64, theirs: u64| {
            (ours != 0 && theirs != 0).then(|| Duration::from_millis(ours.max(theirs)))
        };
        (
            pick(client.outgoing_ms, server.incoming_ms),
            pick(client.incoming_ms, server.outgoing_ms),
        )
    }
}

impl std::fmt::Display for HeartBeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.outgoing_ms, self.incoming_ms)
    }
}
