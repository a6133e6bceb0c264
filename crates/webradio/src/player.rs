//! Façade that owns exactly one controller at a time.

use std::path::{Path, PathBuf};

use tracing::info;

use webradio_config::Config;

use crate::PLAYER_TARGET;
use crate::controller::{
    ActiveController, Controller, ControllerError, ControllerSettings, PoolController,
    SingleController,
};

/// Plays a list of channels through either a single daemon or a
/// prebuffering pool.
///
/// Switching modes tears the current controller down completely before the
/// replacement starts, so at most one controller's daemons run at any time.
/// Call [`Player::shutdown`] when done; dropping the player does the same.
#[derive(Debug)]
pub struct Player {
    base_path: PathBuf,
    channels: Vec<String>,
    prebuffering: bool,
    settings: ControllerSettings,
    active: Option<ActiveController>,
}

impl Player {
    /// Starts a player rooted at `base_path` in the requested mode.
    ///
    /// # Errors
    ///
    /// Returns the error of the initial controller.
    pub fn start(
        base_path: impl Into<PathBuf>,
        channels: Vec<String>,
        prebuffering: bool,
        settings: ControllerSettings,
    ) -> Result<Self, ControllerError> {
        let mut player = Self {
            base_path: base_path.into(),
            channels,
            prebuffering,
            settings,
            active: None,
        };
        player.activate(prebuffering)?;
        Ok(player)
    }

    /// Starts a player from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns the error of the initial controller.
    pub fn from_config(config: &Config, channels: Vec<String>) -> Result<Self, ControllerError> {
        Self::start(
            config.base_path().as_std_path(),
            channels,
            config.prebuffering(),
            ControllerSettings::from_config(config),
        )
    }

    fn activate(&mut self, prebuffering: bool) -> Result<(), ControllerError> {
        let channels = self.channels.clone();
        let controller = if prebuffering {
            ActiveController::Pool(PoolController::start(
                &self.base_path,
                channels,
                &self.settings,
            )?)
        } else {
            ActiveController::Single(SingleController::start(
                &self.base_path,
                channels,
                &self.settings,
            )?)
        };
        self.prebuffering = prebuffering;
        self.active = Some(controller);
        info!(
            target: PLAYER_TARGET,
            prebuffering,
            channels = self.channels.len(),
            "player controller active"
        );
        Ok(())
    }

    /// Directory the active controller builds its workspaces in.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns whether the prebuffering pool is the selected mode.
    #[must_use]
    pub const fn prebuffering(&self) -> bool {
        self.prebuffering
    }

    /// Switches between single and prebuffering mode.
    ///
    /// Does nothing when `prebuffering` matches the running mode. Otherwise
    /// the current controller is shut down and a new one is started with the
    /// same channels.
    ///
    /// # Errors
    ///
    /// Returns the error of the new controller. The player is then inactive
    /// and keeps its previous mode.
    pub fn set_prebuffering(&mut self, prebuffering: bool) -> Result<(), ControllerError> {
        if self.active.is_some() && self.prebuffering == prebuffering {
            return Ok(());
        }
        self.shutdown();
        self.activate(prebuffering)
    }

    /// Channel URLs in order.
    #[must_use]
    pub fn channel_urls(&self) -> &[String] {
        &self.channels
    }

    /// Replaces the channel list.
    ///
    /// The single daemon reloads its queue in place; the pool is rebuilt.
    ///
    /// # Errors
    ///
    /// Returns the error of the reload or rebuild.
    pub fn set_channel_urls(&mut self, urls: Vec<String>) -> Result<(), ControllerError> {
        self.channels = urls;
        match self.active.as_mut() {
            Some(ActiveController::Single(controller)) => {
                controller.set_channel_urls(self.channels.clone())
            }
            Some(ActiveController::Pool(_)) => {
                self.shutdown();
                self.activate(true)
            }
            None => Ok(()),
        }
    }

    /// The running controller, if any.
    #[must_use]
    pub fn controller(&self) -> Option<&dyn Controller> {
        self.active.as_ref().map(ActiveController::as_controller)
    }

    /// Mutable access to the active controller.
    pub fn controller_mut(&mut self) -> Option<&mut dyn Controller> {
        self.active.as_mut().map(ActiveController::as_controller_mut)
    }

    /// The active controller, when the player has not been shut down.
    #[must_use]
    pub fn active(&self) -> Option<&ActiveController> {
        self.active.as_ref()
    }

    fn require(&mut self) -> Result<&mut dyn Controller, ControllerError> {
        self.controller_mut().ok_or(ControllerError::Inactive)
    }

    /// Plays channel `index`.
    ///
    /// # Errors
    ///
    /// See [`Controller::play`].
    pub fn play(&mut self, index: i64) -> Result<(), ControllerError> {
        self.require()?.play(index)
    }

    /// Resumes playback.
    ///
    /// # Errors
    ///
    /// See [`Controller::resume`].
    pub fn resume(&mut self) -> Result<(), ControllerError> {
        self.require()?.resume()
    }

    /// Returns the unmuted volume.
    ///
    /// # Errors
    ///
    /// See [`Controller::volume`].
    pub fn volume(&mut self) -> Result<u8, ControllerError> {
        self.require()?.volume()
    }

    /// Sets the unmuted volume.
    ///
    /// # Errors
    ///
    /// See [`Controller::set_volume`].
    pub fn set_volume(&mut self, volume: i64) -> Result<(), ControllerError> {
        self.require()?.set_volume(volume)
    }

    /// # Errors
    ///
    /// See [`Controller::mute`].
    pub fn mute(&mut self) -> Result<(), ControllerError> {
        self.require()?.mute()
    }

    /// # Errors
    ///
    /// See [`Controller::unmute`].
    pub fn unmute(&mut self) -> Result<(), ControllerError> {
        self.require()?.unmute()
    }

    /// # Errors
    ///
    /// See [`Controller::toggle_mute`].
    pub fn toggle_mute(&mut self) -> Result<(), ControllerError> {
        self.require()?.toggle_mute()
    }

    /// Returns whether the active controller is muted.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.controller().is_some_and(|controller| controller.is_muted())
    }

    /// Index of the selected channel.
    #[must_use]
    pub fn current_channel(&self) -> Option<usize> {
        self.controller().and_then(|controller| controller.current_channel())
    }

    /// URL of the selected channel.
    #[must_use]
    pub fn current_channel_url(&self) -> Option<&str> {
        self.current_channel()
            .and_then(|index| self.channels.get(index))
            .map(String::as_str)
    }

    /// Number of daemons the active controller runs.
    #[must_use]
    pub fn running_daemons(&self) -> usize {
        self.controller()
            .map_or(0, |controller| controller.running_daemons())
    }

    /// Shuts the active controller down. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        if let Some(mut controller) = self.active.take() {
            controller.as_controller_mut().shutdown();
            info!(target: PLAYER_TARGET, "player shut down");
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.shutdown();
    }
}
