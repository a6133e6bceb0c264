//! Playback strategies behind the [`Player`](crate::Player) façade.
//!
//! [`SingleController`] drives one daemon whose queue holds every channel.
//! [`PoolController`] keeps one muted daemon per channel playing, so switching
//! channels is a mute of the old daemon and an unmute of the new one.

mod pool;
mod single;

use std::sync::Arc;

use thiserror::Error;

use webradio_config::Config;

use crate::client::{ClientError, ConnectPolicy};
use crate::daemon::{BackendLauncher, LaunchError, MpdLauncher};
use crate::workspace::{BackendSettings, WorkspaceError};

pub use pool::PoolController;
pub use single::SingleController;

/// Errors surfaced by controllers and the player.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A daemon failed to start.
    #[error(transparent)]
    Launch(#[from] LaunchError),
    /// A daemon rejected or failed a command.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The pool root directory could not be prepared.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    /// A pool worker failed during startup.
    #[error("pool worker {index} failed: {source}")]
    Worker {
        /// Channel index of the worker.
        index: usize,
        /// Failure reported by the worker.
        #[source]
        source: Box<ControllerError>,
    },
    /// A pool worker thread panicked during startup.
    #[error("pool worker {index} panicked during startup")]
    WorkerPanicked {
        /// Channel index of the worker.
        index: usize,
    },
    /// The pool has no channels to take a volume from.
    #[error("no channels configured")]
    NoChannels,
    /// The player has been shut down.
    #[error("player is shut down")]
    Inactive,
}

/// Everything a controller needs to start its daemons.
#[derive(Clone)]
pub struct ControllerSettings {
    /// Values written into each daemon's configuration.
    pub backend: BackendSettings,
    /// Connection bounds for each client.
    pub connect: ConnectPolicy,
    /// Starts and stops daemons.
    pub launcher: Arc<dyn BackendLauncher>,
}

impl std::fmt::Debug for ControllerSettings {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ControllerSettings")
            .field("backend", &self.backend)
            .field("connect", &self.connect)
            .finish_non_exhaustive()
    }
}

impl ControllerSettings {
    /// Builds settings that launch the configured backend binary.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            backend: BackendSettings::from(config),
            connect: ConnectPolicy::from(config),
            launcher: Arc::new(MpdLauncher::new(config.backend_binary())),
        }
    }

    /// Replaces the launcher.
    #[must_use]
    pub fn with_launcher(mut self, launcher: Arc<dyn BackendLauncher>) -> Self {
        self.launcher = launcher;
        self
    }
}

/// Operations shared by both playback strategies.
pub trait Controller {
    /// Plays channel `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::OutOfRange`] for an index outside the channel
    /// list, without contacting any daemon.
    fn play(&mut self, index: i64) -> Result<(), ControllerError>;

    /// Resumes playback of the current channel.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing daemon.
    fn resume(&mut self) -> Result<(), ControllerError>;

    /// Returns the unmuted volume.
    ///
    /// # Errors
    ///
    /// Returns an error when no volume can be determined.
    fn volume(&mut self) -> Result<u8, ControllerError>;

    /// Sets the unmuted volume; applied immediately unless muted.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidVolume`] outside `0..=100`.
    fn set_volume(&mut self, volume: i64) -> Result<(), ControllerError>;

    /// Silences playback.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing daemon.
    fn mute(&mut self) -> Result<(), ControllerError>;

    /// Restores the unmuted volume.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing daemon.
    fn unmute(&mut self) -> Result<(), ControllerError>;

    /// Flips the mute state.
    ///
    /// # Errors
    ///
    /// See [`Controller::mute`] and [`Controller::unmute`].
    fn toggle_mute(&mut self) -> Result<(), ControllerError> {
        if self.is_muted() { self.unmute() } else { self.mute() }
    }

    fn is_muted(&self) -> bool;

    fn channel_urls(&self) -> &[String];

    /// Index of the selected channel.
    fn current_channel(&self) -> Option<usize>;

    /// Number of daemons currently running.
    fn running_daemons(&self) -> usize;

    /// Stops every daemon and removes every workspace. Safe to repeat.
    fn shutdown(&mut self);
}

/// The controller currently owned by a player.
#[derive(Debug)]
pub enum ActiveController {
    Single(SingleController),
    Pool(PoolController),
}

impl ActiveController {
    /// The strategy as a trait object.
    #[must_use]
    pub fn as_controller(&self) -> &dyn Controller {
        match self {
            Self::Single(controller) => controller,
            Self::Pool(controller) => controller,
        }
    }

    /// The strategy as a mutable trait object.
    pub fn as_controller_mut(&mut self) -> &mut dyn Controller {
        match self {
            Self::Single(controller) => controller,
            Self::Pool(controller) => controller,
        }
    }

    /// Returns whether this is the prebuffering strategy.
    #[must_use]
    pub const fn is_pool(&self) -> bool {
        matches!(self, Self::Pool(_))
    }
}
