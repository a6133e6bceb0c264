//! Launcher that starts [`FakeMpd`] servers instead of `mpd` processes.

use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::fake_mpd::{FakeMpd, MpdState};
use crate::daemon::{BackendLauncher, LaunchError};
use crate::workspace::Workspace;

pub(crate) const FAKE_BINARY: &str = "fake-mpd";
pub(crate) const DEFAULT_VOLUME: i64 = 50;

#[derive(Default)]
struct Shared {
    servers: Mutex<HashMap<PathBuf, FakeMpd>>,
    failing: Mutex<HashSet<String>>,
    launches: AtomicUsize,
    terminations: AtomicUsize,
}

/// Records launches and serves each workspace socket with a fake daemon.
#[derive(Clone, Default)]
pub(crate) struct FakeLauncher {
    shared: Arc<Shared>,
}

impl FakeLauncher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn as_launcher(&self) -> Arc<dyn BackendLauncher> {
        Arc::new(self.clone())
    }

    /// Makes launches fail for workspaces whose base directory is `name`.
    pub(crate) fn fail_workspace(&self, name: &str) {
        lock(&self.shared.failing).insert(name.to_owned());
    }

    pub(crate) fn running(&self) -> usize {
        lock(&self.shared.servers).len()
    }

    pub(crate) fn launches(&self) -> usize {
        self.shared.launches.load(Ordering::SeqCst)
    }

    pub(crate) fn terminations(&self) -> usize {
        self.shared.terminations.load(Ordering::SeqCst)
    }

    /// State of the daemon listening on `socket`.
    pub(crate) fn server_state(&self, socket: &Path) -> Option<MpdState> {
        lock(&self.shared.servers).get(socket).map(FakeMpd::state)
    }

    /// Runs `action` against the daemon listening on `socket`.
    pub(crate) fn with_server<R>(&self, socket: &Path, action: impl FnOnce(&FakeMpd) -> R) -> Option<R> {
        lock(&self.shared.servers).get(socket).map(action)
    }
}

impl BackendLauncher for FakeLauncher {
    fn launch(&self, workspace: &Workspace) -> Result<(), LaunchError> {
        let name = workspace
            .base()
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or_default();
        if lock(&self.shared.failing).contains(name) || !workspace.config_path().is_file() {
            return Err(LaunchError::BackendExited {
                binary: FAKE_BINARY.to_owned(),
                status: "exit status: 1".to_owned(),
                stderr: format!("refusing to start in {}", workspace.base().display()),
            });
        }
        let socket = workspace.socket_path();
        let server = FakeMpd::spawn(&socket, DEFAULT_VOLUME).map_err(|source| {
            LaunchError::LaunchBackend {
                binary: FAKE_BINARY.to_owned(),
                source,
            }
        })?;
        lock(&self.shared.servers).insert(socket, server);
        self.shared.launches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn terminate(&self, workspace: &Workspace) -> Result<(), LaunchError> {
        self.shared.terminations.fetch_add(1, Ordering::SeqCst);
        drop(lock(&self.shared.servers).remove(&workspace.socket_path()));
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
