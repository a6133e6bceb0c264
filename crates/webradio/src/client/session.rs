//! Line-oriented request/response exchange with a backend daemon.

use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::quote::quoted;

const GREETING_PREFIX: &str = "OK MPD ";

/// Commands understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    /// Empties the queue.
    Clear,
    /// Appends a URL to the queue.
    Add(&'a str),
    /// Starts playback, optionally at a queue position.
    Play(Option<usize>),
    /// Sets the mixer volume.
    SetVolume(u8),
    /// Reports player state as `key: value` pairs.
    Status,
    /// Keeps the connection alive.
    Ping,
}

impl fmt::Display for Request<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear => formatter.write_str("clear"),
            Self::Add(url) => write!(formatter, "add {}", quoted(url)),
            Self::Play(None) => formatter.write_str("play"),
            Self::Play(Some(position)) => write!(formatter, "play {position}"),
            Self::SetVolume(volume) => write!(formatter, "setvol {volume}"),
            Self::Status => formatter.write_str("status"),
            Self::Ping => formatter.write_str("ping"),
        }
    }
}

/// Failure of a single exchange.
#[derive(Debug)]
pub(crate) enum SessionError {
    /// The transport failed or the daemon hung up.
    Io(io::Error),
    /// The daemon rejected the command.
    Ack {
        code: Option<u32>,
        command: String,
        message: String,
    },
    /// The daemon replied with a line outside the protocol.
    Malformed(String),
}

impl From<io::Error> for SessionError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

/// An open connection that has completed the greeting.
pub(crate) struct Session {
    reader: BufReader<Box<dyn Read + Send>>,
    writer: Box<dyn Write + Send>,
    version: String,
}

impl Session {
    /// Connects to the daemon socket at `path`.
    #[cfg(unix)]
    pub(crate) fn open(path: &Path, timeout: Duration) -> io::Result<Self> {
        use socket2::{Domain, SockAddr, Socket, Type};
        use std::os::unix::net::UnixStream;

        let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
        let address = SockAddr::unix(path)?;
        let timeout = Some(timeout).filter(|timeout| !timeout.is_zero());
        match timeout {
            Some(limit) => socket.connect_timeout(&address, limit)?,
            None => socket.connect(&address)?,
        }
        let stream: UnixStream = socket.into();
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;
        let writer = stream.try_clone()?;
        Self::handshake(Box::new(stream), Box::new(writer))
    }

    #[cfg(not(unix))]
    pub(crate) fn open(_path: &Path, _timeout: Duration) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "backend sockets require a Unix platform",
        ))
    }

    /// Reads the greeting from an already connected stream pair.
    pub(crate) fn handshake(
        reader: Box<dyn Read + Send>,
        writer: Box<dyn Write + Send>,
    ) -> io::Result<Self> {
        let mut reader = BufReader::new(reader);
        let greeting = read_line(&mut reader)?;
        let version = greeting
            .strip_prefix(GREETING_PREFIX)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unexpected greeting '{greeting}'"),
                )
            })?
            .to_owned();
        Ok(Self {
            reader,
            writer,
            version,
        })
    }

    /// Protocol version announced by the daemon.
    pub(crate) fn version(&self) -> &str {
        &self.version
    }

    /// Sends `request` and collects the `key: value` pairs of the reply.
    pub(crate) fn execute(
        &mut self,
        request: &Request<'_>,
    ) -> Result<Vec<(String, String)>, SessionError> {
        writeln!(self.writer, "{request}")?;
        self.writer.flush()?;
        self.read_response()
    }

    /// Asks the daemon to close the connection. Failures are ignored since
    /// the stream is dropped either way.
    pub(crate) fn close(mut self) {
        let _ = writeln!(self.writer, "close").and_then(|()| self.writer.flush());
    }

    fn read_response(&mut self) -> Result<Vec<(String, String)>, SessionError> {
        let mut pairs = Vec::new();
        loop {
            let line = read_line(&mut self.reader)?;
            if line == "OK" {
                return Ok(pairs);
            }
            if let Some(ack) = line.strip_prefix("ACK ") {
                return Err(parse_ack(ack));
            }
            match line.split_once(": ") {
                Some((key, value)) => pairs.push((key.to_owned(), value.to_owned())),
                None => return Err(SessionError::Malformed(line)),
            }
        }
    }
}

fn read_line(reader: &mut impl BufRead) -> io::Result<String> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "backend closed the connection",
        ));
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

/// Parses `[code@index] {command} message`.
fn parse_ack(text: &str) -> SessionError {
    let code = text
        .strip_prefix('[')
        .and_then(|rest| rest.split_once('@'))
        .and_then(|(code, _)| code.parse().ok());
    let after_position = text.split_once("] ").map_or(text, |(_, rest)| rest);
    let (command, message) = after_position
        .strip_prefix('{')
        .and_then(|rest| rest.split_once('}'))
        .map_or(("", after_position), |(command, message)| {
            (command, message.trim_start())
        });
    SessionError::Ack {
        code,
        command: command.to_owned(),
        message: message.to_owned(),
    }
}
