use std::path::{Path, PathBuf};
use std::thread;

use tracing::{debug, info};

use super::{Controller, ControllerError, ControllerSettings};
use crate::PLAYER_TARGET;
use crate::client::{ClientError, ProtocolClient, validate_volume};
use crate::daemon::DaemonInstance;
use crate::workspace::{WorkspaceError, create_private_dir, remove_empty_dir};

/// One daemon and its client, dedicated to a single channel.
#[derive(Debug)]
struct Worker {
    daemon: DaemonInstance,
    client: ProtocolClient,
}

impl Worker {
    fn start(base: &Path, url: &str, settings: &ControllerSettings) -> Result<Self, ControllerError> {
        let daemon = DaemonInstance::start(base, &settings.backend, settings.launcher.clone())?;
        let client = ProtocolClient::new(daemon.socket_path(), settings.connect);
        let mut worker = Self { daemon, client };
        if let Err(error) = worker.prime(url) {
            worker.shutdown();
            return Err(error.into());
        }
        Ok(worker)
    }

    /// Loads the channel and starts it playing silently.
    fn prime(&mut self, url: &str) -> Result<(), ClientError> {
        self.client.connect()?;
        self.client.set_channels(vec![url.to_owned()])?;
        self.client.mute()?;
        self.client.play(0)
    }

    fn shutdown(&mut self) {
        self.client.disconnect();
        self.daemon.shutdown();
    }
}

/// One continuously playing, muted daemon per channel.
///
/// Workers live in `root/worker{index}`. Only the selected worker is ever
/// unmuted. The pool keeps its own volume and mute state; the selected worker
/// is brought in line with it on every switch.
#[derive(Debug)]
pub struct PoolController {
    root: PathBuf,
    workers: Vec<Worker>,
    channels: Vec<String>,
    selected: Option<usize>,
    muted: bool,
    volume: Option<u8>,
    shut_down: bool,
}

impl PoolController {
    /// Creates `root` and starts one worker per channel in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Workspace`] when `root` cannot be created,
    /// or [`ControllerError::Worker`] for the first worker that failed. Every
    /// worker that did start is shut down and `root` is removed before
    /// returning.
    pub fn start(
        root: &Path,
        channels: Vec<String>,
        settings: &ControllerSettings,
    ) -> Result<Self, ControllerError> {
        let root = std::path::absolute(root).map_err(|source| {
            WorkspaceError::CreateDirectory {
                path: root.to_path_buf(),
                source,
            }
        })?;
        create_private_dir(&root)?;
        let results = start_workers(&root, &channels, settings);

        let mut workers = Vec::with_capacity(results.len());
        let mut failure = None;
        for result in results {
            match result {
                Ok(worker) => workers.push(worker),
                Err(error) if failure.is_none() => failure = Some(error),
                Err(_) => {}
            }
        }
        if let Some(error) = failure {
            for worker in &mut workers {
                worker.shutdown();
            }
            remove_empty_dir(&root);
            return Err(error);
        }

        info!(
            target: PLAYER_TARGET,
            root = %root.display(),
            workers = workers.len(),
            "prebuffering pool started"
        );
        Ok(Self {
            root,
            workers,
            channels,
            selected: None,
            muted: false,
            volume: None,
            shut_down: false,
        })
    }

    /// Directory holding the worker workspaces.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Client of the worker playing channel `index`.
    #[must_use]
    pub fn worker_client(&self, index: usize) -> Option<&ProtocolClient> {
        self.workers.get(index).map(|worker| &worker.client)
    }

    fn position(&self, index: i64) -> Result<usize, ClientError> {
        usize::try_from(index)
            .ok()
            .filter(|position| *position < self.workers.len())
            .ok_or(ClientError::OutOfRange {
                index,
                len: self.workers.len(),
            })
    }

    fn selected_client(&mut self) -> Option<&mut ProtocolClient> {
        let index = self.selected?;
        self.workers.get_mut(index).map(|worker| &mut worker.client)
    }
}

fn start_workers(
    root: &Path,
    channels: &[String],
    settings: &ControllerSettings,
) -> Vec<Result<Worker, ControllerError>> {
    thread::scope(|scope| {
        let handles: Vec<_> = channels
            .iter()
            .enumerate()
            .map(|(index, url)| {
                let base = root.join(format!("worker{index}"));
                scope.spawn(move || Worker::start(&base, url, settings))
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| match handle.join() {
                Ok(result) => result.map_err(|error| ControllerError::Worker {
                    index,
                    source: Box::new(error),
                }),
                Err(_) => Err(ControllerError::WorkerPanicked { index }),
            })
            .collect()
    })
}

impl Controller for PoolController {
    fn play(&mut self, index: i64) -> Result<(), ControllerError> {
        let position = self.position(index)?;
        let volume = self.volume()?;
        if let Some(previous) = self.selected.filter(|previous| *previous != position) {
            if let Some(worker) = self.workers.get_mut(previous) {
                worker.client.mute()?;
            }
        }
        let muted = self.muted;
        let worker = self
            .workers
            .get_mut(position)
            .ok_or(ClientError::OutOfRange {
                index,
                len: self.channels.len(),
            })?;
        worker.client.set_volume(i64::from(volume))?;
        if !muted {
            worker.client.unmute()?;
        }
        self.selected = Some(position);
        debug!(target: PLAYER_TARGET, channel = position, muted, "switched pool channel");
        Ok(())
    }

    fn resume(&mut self) -> Result<(), ControllerError> {
        for worker in &mut self.workers {
            worker.client.resume()?;
        }
        Ok(())
    }

    fn volume(&mut self) -> Result<u8, ControllerError> {
        if let Some(volume) = self.volume {
            return Ok(volume);
        }
        let reference = self.selected.unwrap_or(0);
        let worker = self
            .workers
            .get_mut(reference)
            .ok_or(ControllerError::NoChannels)?;
        let volume = worker.client.volume()?;
        self.volume = Some(volume);
        Ok(volume)
    }

    fn set_volume(&mut self, volume: i64) -> Result<(), ControllerError> {
        let volume = validate_volume(volume)?;
        if let Some(client) = self.selected_client() {
            client.set_volume(i64::from(volume))?;
        }
        self.volume = Some(volume);
        Ok(())
    }

    fn mute(&mut self) -> Result<(), ControllerError> {
        if let Some(client) = self.selected_client() {
            client.mute()?;
        }
        self.muted = true;
        Ok(())
    }

    fn unmute(&mut self) -> Result<(), ControllerError> {
        if let Some(client) = self.selected_client() {
            client.unmute()?;
        }
        self.muted = false;
        Ok(())
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn channel_urls(&self) -> &[String] {
        &self.channels
    }

    fn current_channel(&self) -> Option<usize> {
        self.selected
    }

    fn running_daemons(&self) -> usize {
        self.workers
            .iter()
            .filter(|worker| worker.daemon.is_running())
            .count()
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        for worker in &mut self.workers {
            worker.shutdown();
        }
        self.workers.clear();
        self.selected = None;
        remove_empty_dir(&self.root);
        self.shut_down = true;
        info!(target: PLAYER_TARGET, root = %self.root.display(), "prebuffering pool stopped");
    }
}

impl Drop for PoolController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
