//! Stateful control connection to one backend daemon.
//!
//! [`ProtocolClient`] mirrors the daemon's queue and mixer so that callers can
//! mute and unmute without losing the volume they chose. Every command runs
//! through a reconnect-once wrapper: a transport failure drops the session,
//! opens a fresh one and retries the command a single time.

mod errors;
mod session;

use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use webradio_config::Config;

use crate::CLIENT_TARGET;
use session::{Session, SessionError};

pub use errors::ClientError;
pub use session::Request;

/// Highest volume the backend mixer accepts.
pub const MAX_VOLUME: u8 = 100;

/// Bounds on connecting to a daemon that may still be starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    /// Connection attempts before giving up.
    pub attempts: u32,
    /// Pause between attempts.
    pub interval: Duration,
    /// Connect, read and write timeout of an established session.
    pub io_timeout: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ConnectPolicy {
    fn from(config: &Config) -> Self {
        Self {
            attempts: config.connect_attempts(),
            interval: config.connect_interval(),
            io_timeout: config.io_timeout(),
        }
    }
}

/// Subset of the daemon's `status` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    /// Mixer volume, absent when the daemon has no mixer.
    pub volume: Option<u8>,
    /// Playback state such as `play` or `stop`.
    pub state: Option<String>,
    /// Queue position of the current song.
    pub song: Option<usize>,
}

impl Status {
    fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, ClientError> {
        let mut status = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "volume" => status.volume = parse_volume(&value)?,
                "state" => status.state = Some(value),
                "song" => status.song = Some(parse_field(&key, &value)?),
                _ => {}
            }
        }
        Ok(status)
    }
}

fn parse_volume(value: &str) -> Result<Option<u8>, ClientError> {
    let volume: i64 = parse_field("volume", value)?;
    if volume < 0 {
        return Ok(None);
    }
    validate_volume(volume).map(Some)
}

fn parse_field<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ClientError> {
    value
        .parse()
        .map_err(|_| ClientError::MalformedResponse {
            line: format!("{key}: {value}"),
        })
}

/// Checks that `volume` lies in `0..=100`.
///
/// # Errors
///
/// Returns [`ClientError::InvalidVolume`] otherwise.
pub fn validate_volume(volume: i64) -> Result<u8, ClientError> {
    u8::try_from(volume)
        .ok()
        .filter(|value| *value <= MAX_VOLUME)
        .ok_or(ClientError::InvalidVolume { volume })
}

/// Control connection to one daemon.
///
/// The client caches the daemon's volume after the first query. While muted,
/// the cached value is the volume restored by [`ProtocolClient::unmute`] and
/// [`ProtocolClient::set_volume`] only updates the cache.
pub struct ProtocolClient {
    socket: PathBuf,
    policy: ConnectPolicy,
    session: Option<Session>,
    volume: Option<u8>,
    muted: bool,
    channels: Vec<String>,
    current: Option<usize>,
}

impl std::fmt::Debug for ProtocolClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ProtocolClient")
            .field("socket", &self.socket)
            .field("connected", &self.session.is_some())
            .field("volume", &self.volume)
            .field("muted", &self.muted)
            .field("channels", &self.channels)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl ProtocolClient {
    /// Creates an unconnected client for the daemon at `socket`.
    #[must_use]
    pub fn new(socket: impl Into<PathBuf>, policy: ConnectPolicy) -> Self {
        Self {
            socket: socket.into(),
            policy,
            session: None,
            volume: None,
            muted: false,
            channels: Vec::new(),
            current: None,
        }
    }

    /// Marks the client as muted from the start, so the first
    /// [`ProtocolClient::unmute`] restores the daemon's reported volume.
    #[must_use]
    pub fn muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    /// Socket of the daemon this client talks to.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket
    }

    /// Opens a fresh session, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::StartupTimeout`] when the socket does not
    /// accept connections within the policy's attempts, and
    /// [`ClientError::Connectivity`] for any other transport failure.
    pub fn connect(&mut self) -> Result<(), ClientError> {
        self.disconnect();
        let session = self.wait_for_session()?;
        self.session = Some(session);
        Ok(())
    }

    /// Closes the session if one is open.
    pub fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
            debug!(target: CLIENT_TARGET, socket = %self.socket.display(), "disconnected");
        }
    }

    /// Returns whether a session is open. A lost connection is only noticed
    /// by the next command.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Queries the daemon's current state.
    ///
    /// # Errors
    ///
    /// Returns an error when the command fails or the reply cannot be
    /// parsed.
    pub fn status(&mut self) -> Result<Status, ClientError> {
        let pairs = self.ensure_connected(|session| session.execute(&Request::Status))?;
        Status::from_pairs(pairs)
    }

    /// Checks that the daemon still answers.
    ///
    /// # Errors
    ///
    /// Returns an error when the daemon cannot be reached.
    pub fn ping(&mut self) -> Result<(), ClientError> {
        self.send(&Request::Ping)
    }

    /// Returns the unmuted volume, querying the daemon on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::VolumeUnavailable`] when the daemon has no
    /// mixer, or the error of the status query.
    pub fn volume(&mut self) -> Result<u8, ClientError> {
        if let Some(volume) = self.volume {
            return Ok(volume);
        }
        let volume = self
            .status()?
            .volume
            .ok_or_else(|| ClientError::VolumeUnavailable {
                socket: self.socket.clone(),
            })?;
        self.volume = Some(volume);
        Ok(volume)
    }

    /// Sets the volume. While muted only the cached value changes.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidVolume`] outside `0..=100`, or the
    /// error of the `setvol` command.
    pub fn set_volume(&mut self, volume: i64) -> Result<(), ClientError> {
        let volume = validate_volume(volume)?;
        if !self.muted {
            self.send(&Request::SetVolume(volume))?;
        }
        self.volume = Some(volume);
        Ok(())
    }

    /// Returns whether the client is muted.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Mutes or unmutes.
    ///
    /// # Errors
    ///
    /// See [`ProtocolClient::mute`] and [`ProtocolClient::unmute`].
    pub fn set_muted(&mut self, muted: bool) -> Result<(), ClientError> {
        if muted { self.mute() } else { self.unmute() }
    }

    /// Silences the daemon, remembering the volume to restore. Nothing is
    /// sent when already muted or when the volume is already zero.
    ///
    /// # Errors
    ///
    /// Returns an error when the volume cannot be read or set.
    pub fn mute(&mut self) -> Result<(), ClientError> {
        if self.muted {
            return Ok(());
        }
        if self.volume()? != 0 {
            self.send(&Request::SetVolume(0))?;
        }
        self.muted = true;
        Ok(())
    }

    /// Restores the remembered volume. Does nothing when not muted.
    ///
    /// # Errors
    ///
    /// Returns an error when the volume cannot be read or set.
    pub fn unmute(&mut self) -> Result<(), ClientError> {
        if !self.muted {
            return Ok(());
        }
        let volume = self.volume()?;
        self.send(&Request::SetVolume(volume))?;
        self.muted = false;
        Ok(())
    }

    /// Flips the mute state.
    ///
    /// # Errors
    ///
    /// See [`ProtocolClient::set_muted`].
    pub fn toggle_mute(&mut self) -> Result<(), ClientError> {
        self.set_muted(!self.muted)
    }

    /// Channel URLs in queue order.
    #[must_use]
    pub fn channel_urls(&self) -> &[String] {
        &self.channels
    }

    /// Replaces the daemon's queue with `urls`. No channel is selected
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing `clear` or `add`.
    pub fn set_channels(&mut self, urls: Vec<String>) -> Result<(), ClientError> {
        self.clear()?;
        for url in urls {
            self.add(url)?;
        }
        Ok(())
    }

    /// Appends `url` to the queue.
    ///
    /// # Errors
    ///
    /// Returns the error of the `add` command.
    pub fn add(&mut self, url: String) -> Result<(), ClientError> {
        self.send(&Request::Add(&url))?;
        self.channels.push(url);
        Ok(())
    }

    /// Empties the queue and deselects the current channel.
    ///
    /// # Errors
    ///
    /// Returns the error of the `clear` command.
    pub fn clear(&mut self) -> Result<(), ClientError> {
        self.send(&Request::Clear)?;
        self.channels.clear();
        self.current = None;
        Ok(())
    }

    /// Starts playback of channel `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::OutOfRange`] without contacting the daemon when
    /// `index` is negative or past the end of the channel list.
    pub fn play(&mut self, index: i64) -> Result<(), ClientError> {
        let position = self.position(index)?;
        self.send(&Request::Play(Some(position)))?;
        self.current = Some(position);
        Ok(())
    }

    /// Resumes playback without changing the channel.
    ///
    /// # Errors
    ///
    /// Returns the error of the `play` command.
    pub fn resume(&mut self) -> Result<(), ClientError> {
        self.send(&Request::Play(None))
    }

    /// Index of the selected channel.
    #[must_use]
    pub fn station(&self) -> Option<usize> {
        self.current
    }

    /// Selects and plays channel `index`.
    ///
    /// # Errors
    ///
    /// See [`ProtocolClient::play`].
    pub fn set_station(&mut self, index: i64) -> Result<(), ClientError> {
        self.play(index)
    }

    fn position(&self, index: i64) -> Result<usize, ClientError> {
        usize::try_from(index)
            .ok()
            .filter(|position| *position < self.channels.len())
            .ok_or(ClientError::OutOfRange {
                index,
                len: self.channels.len(),
            })
    }

    fn send(&mut self, request: &Request<'_>) -> Result<(), ClientError> {
        self.ensure_connected(|session| session.execute(request).map(drop))
    }

    /// Runs `operation` on the session, reconnecting and retrying once when
    /// the transport fails.
    fn ensure_connected<T>(
        &mut self,
        mut operation: impl FnMut(&mut Session) -> Result<T, SessionError>,
    ) -> Result<T, ClientError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => self.reopen_session()?,
        };
        let session = self.session.insert(session);
        match operation(session) {
            Ok(value) => Ok(value),
            Err(SessionError::Io(error)) => {
                warn!(
                    target: CLIENT_TARGET,
                    socket = %self.socket.display(),
                    error = %error,
                    "backend connection lost; reconnecting"
                );
                self.session = None;
                let session = self.reopen_session()?;
                let session = self.session.insert(session);
                operation(session).map_err(|error| self.fail(error))
            }
            Err(error) => Err(self.fail(error)),
        }
    }

    fn fail(&mut self, error: SessionError) -> ClientError {
        match error {
            SessionError::Io(source) => {
                self.session = None;
                ClientError::Connectivity {
                    socket: self.socket.clone(),
                    source,
                }
            }
            SessionError::Ack {
                code,
                command,
                message,
            } => ClientError::Protocol {
                code,
                command,
                message,
            },
            SessionError::Malformed(line) => {
                self.session = None;
                ClientError::MalformedResponse { line }
            }
        }
    }

    /// Connects to a freshly spawned daemon, waiting for it to bind its
    /// socket.
    fn wait_for_session(&self) -> Result<Session, ClientError> {
        let attempts = self.policy.attempts.max(1);
        for attempt in 1..=attempts {
            match self.open_session(attempt) {
                Ok(session) => return Ok(session),
                Err(error) if is_not_ready(&error) => {
                    if attempt < attempts {
                        thread::sleep(self.policy.interval);
                    }
                }
                Err(source) => {
                    return Err(ClientError::Connectivity {
                        socket: self.socket.clone(),
                        source,
                    });
                }
            }
        }
        Err(ClientError::StartupTimeout {
            socket: self.socket.clone(),
            attempts,
        })
    }

    /// Single connection attempt to a daemon that was already reachable.
    fn reopen_session(&self) -> Result<Session, ClientError> {
        self.open_session(1)
            .map_err(|source| ClientError::Connectivity {
                socket: self.socket.clone(),
                source,
            })
    }

    fn open_session(&self, attempt: u32) -> io::Result<Session> {
        let session = Session::open(&self.socket, self.policy.io_timeout)?;
        debug!(
            target: CLIENT_TARGET,
            socket = %self.socket.display(),
            attempt,
            version = session.version(),
            "connected to backend"
        );
        Ok(session)
    }
}

impl Drop for ProtocolClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Errors meaning the daemon has not bound its socket yet.
fn is_not_ready(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused | io::ErrorKind::AddrNotAvailable
    )
}
