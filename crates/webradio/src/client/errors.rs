use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`ProtocolClient`](super::ProtocolClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport failed and a reconnect did not help.
    #[error("lost connection to backend at '{socket}': {source}")]
    Connectivity {
        /// Backend socket.
        socket: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The backend socket never became available.
    #[error("backend at '{socket}' not reachable after {attempts} attempts")]
    StartupTimeout {
        /// Backend socket.
        socket: PathBuf,
        /// Connection attempts made.
        attempts: u32,
    },
    /// A channel index outside the channel list was requested.
    #[error("channel {index} out of range (channels: {len})")]
    OutOfRange {
        /// Requested index.
        index: i64,
        /// Number of channels.
        len: usize,
    },
    /// A volume outside `0..=100` was requested.
    #[error("volume {volume} out of range 0-100")]
    InvalidVolume {
        /// Requested volume.
        volume: i64,
    },
    /// The backend has no mixer to report a volume from.
    #[error("backend at '{socket}' reports no volume")]
    VolumeUnavailable {
        /// Backend socket.
        socket: PathBuf,
    },
    /// The backend rejected a command.
    #[error("backend rejected '{command}': {message}")]
    Protocol {
        /// Numeric error code, when the reply carried one.
        code: Option<u32>,
        /// Command named in the reply.
        command: String,
        /// Message from the backend.
        message: String,
    },
    /// The backend sent a reply the client cannot interpret.
    #[error("malformed backend reply '{line}'")]
    MalformedResponse {
        /// Offending line.
        line: String,
    },
}
