use std::path::Path;

use super::{Controller, ControllerError, ControllerSettings};
use crate::client::ProtocolClient;
use crate::daemon::DaemonInstance;

/// One daemon whose queue holds every channel.
#[derive(Debug)]
pub struct SingleController {
    daemon: DaemonInstance,
    client: ProtocolClient,
}

impl SingleController {
    /// Starts a daemon in a workspace at `base` and loads `channels` into its
    /// queue. Nothing plays until [`Controller::play`] is called.
    ///
    /// # Errors
    ///
    /// Returns an error when the daemon cannot be started or reached. The
    /// workspace is removed again in that case.
    pub fn start(
        base: &Path,
        channels: Vec<String>,
        settings: &ControllerSettings,
    ) -> Result<Self, ControllerError> {
        let daemon = DaemonInstance::start(base, &settings.backend, settings.launcher.clone())?;
        let client = ProtocolClient::new(daemon.socket_path(), settings.connect);
        let mut controller = Self { daemon, client };
        let loaded = controller
            .client
            .connect()
            .and_then(|()| controller.client.set_channels(channels));
        if let Err(error) = loaded {
            controller.shutdown();
            return Err(error.into());
        }
        Ok(controller)
    }

    /// Replaces the queue with `urls`, keeping the daemon running.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing queue command.
    pub fn set_channel_urls(&mut self, urls: Vec<String>) -> Result<(), ControllerError> {
        Ok(self.client.set_channels(urls)?)
    }

    /// Client of the daemon.
    #[must_use]
    pub fn client(&self) -> &ProtocolClient {
        &self.client
    }

    /// The daemon playing every channel.
    #[must_use]
    pub fn daemon(&self) -> &DaemonInstance {
        &self.daemon
    }
}

impl Controller for SingleController {
    fn play(&mut self, index: i64) -> Result<(), ControllerError> {
        Ok(self.client.play(index)?)
    }

    fn resume(&mut self) -> Result<(), ControllerError> {
        Ok(self.client.resume()?)
    }

    fn volume(&mut self) -> Result<u8, ControllerError> {
        Ok(self.client.volume()?)
    }

    fn set_volume(&mut self, volume: i64) -> Result<(), ControllerError> {
        Ok(self.client.set_volume(volume)?)
    }

    fn mute(&mut self) -> Result<(), ControllerError> {
        Ok(self.client.mute()?)
    }

    fn unmute(&mut self) -> Result<(), ControllerError> {
        Ok(self.client.unmute()?)
    }

    fn is_muted(&self) -> bool {
        self.client.is_muted()
    }

    fn channel_urls(&self) -> &[String] {
        self.client.channel_urls()
    }

    fn current_channel(&self) -> Option<usize> {
        self.client.station()
    }

    fn running_daemons(&self) -> usize {
        usize::from(self.daemon.is_running())
    }

    fn shutdown(&mut self) {
        self.client.disconnect();
        self.daemon.shutdown();
    }
}
