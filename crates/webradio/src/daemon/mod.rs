//! Ownership of one backend daemon and its workspace.

mod errors;
mod launcher;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use crate::DAEMON_TARGET;
use crate::workspace::{BackendSettings, Workspace};

pub use errors::LaunchError;
pub use launcher::{BackendLauncher, CONFIG_HOME_ENV, MpdLauncher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DaemonState {
    Created,
    Running,
    Terminated,
    Destroyed,
}

/// A backend daemon bound to a private workspace.
///
/// Teardown is explicit through [`DaemonInstance::shutdown`]. Dropping an
/// instance that was never shut down performs the same teardown and logs a
/// warning.
pub struct DaemonInstance {
    workspace: Workspace,
    launcher: Arc<dyn BackendLauncher>,
    state: DaemonState,
}

impl std::fmt::Debug for DaemonInstance {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DaemonInstance")
            .field("workspace", &self.workspace)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl DaemonInstance {
    /// Creates the workspace at `base` without starting the daemon.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Workspace`] when the workspace cannot be
    /// created.
    pub fn create(
        base: &Path,
        settings: &BackendSettings,
        launcher: Arc<dyn BackendLauncher>,
    ) -> Result<Self, LaunchError> {
        let workspace = Workspace::create(base, settings)?;
        Ok(Self {
            workspace,
            launcher,
            state: DaemonState::Created,
        })
    }

    /// Creates the workspace at `base` and starts the daemon.
    ///
    /// The workspace is removed again if the daemon fails to start.
    ///
    /// # Errors
    ///
    /// Returns an error when the workspace cannot be created or the daemon
    /// cannot be launched.
    pub fn start(
        base: &Path,
        settings: &BackendSettings,
        launcher: Arc<dyn BackendLauncher>,
    ) -> Result<Self, LaunchError> {
        let mut instance = Self::create(base, settings, launcher)?;
        if let Err(error) = instance.spawn() {
            instance.shutdown();
            return Err(error);
        }
        Ok(instance)
    }

    /// Starts the daemon. Does nothing when it is already running.
    ///
    /// # Errors
    ///
    /// Returns the launcher's error when the daemon fails to start.
    pub fn spawn(&mut self) -> Result<(), LaunchError> {
        if self.state == DaemonState::Running {
            return Ok(());
        }
        self.launcher.launch(&self.workspace)?;
        self.state = DaemonState::Running;
        info!(
            target: DAEMON_TARGET,
            workspace = %self.workspace.base().display(),
            "backend daemon started"
        );
        Ok(())
    }

    /// Stops the daemon if it is running.
    ///
    /// A failed stop request falls back to signalling the pid recorded in the
    /// workspace. Errors are logged rather than returned.
    pub fn terminate(&mut self) {
        if self.state != DaemonState::Running {
            return;
        }
        match self.launcher.terminate(&self.workspace) {
            Ok(()) => debug!(
                target: DAEMON_TARGET,
                workspace = %self.workspace.base().display(),
                "backend daemon stopped"
            ),
            Err(error) => {
                warn!(
                    target: DAEMON_TARGET,
                    workspace = %self.workspace.base().display(),
                    error = %error,
                    "backend stop request failed; signalling recorded pid"
                );
                signal_recorded_pid(&self.workspace.pid_path());
            }
        }
        self.state = DaemonState::Terminated;
    }

    /// Removes the workspace. The daemon must already be stopped.
    pub fn destroy(&mut self) {
        if self.state == DaemonState::Destroyed {
            return;
        }
        self.workspace.destroy();
        self.state = DaemonState::Destroyed;
    }

    /// Stops the daemon and removes its workspace. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        self.terminate();
        self.destroy();
    }

    /// Returns whether the daemon has been started and not yet stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == DaemonState::Running
    }

    /// Workspace the daemon runs in.
    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Socket the daemon listens on.
    #[must_use]
    pub fn socket_path(&self) -> PathBuf {
        self.workspace.socket_path()
    }
}

impl Drop for DaemonInstance {
    fn drop(&mut self) {
        if self.state == DaemonState::Destroyed {
            return;
        }
        warn!(
            target: DAEMON_TARGET,
            workspace = %self.workspace.base().display(),
            "daemon instance dropped without shutdown"
        );
        self.shutdown();
    }
}

fn signal_recorded_pid(pid_path: &Path) {
    let Some(pid) = read_pid(pid_path) else {
        debug!(
            target: DAEMON_TARGET,
            file = %pid_path.display(),
            "no pid recorded; nothing to signal"
        );
        return;
    };
    match kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) => info!(target: DAEMON_TARGET, pid, "sent SIGTERM to backend daemon"),
        Err(Errno::ESRCH) => debug!(target: DAEMON_TARGET, pid, "backend daemon already exited"),
        Err(errno) => warn!(
            target: DAEMON_TARGET,
            pid,
            error = %errno,
            "failed to signal backend daemon"
        ),
    }
}

fn read_pid(path: &Path) -> Option<i32> {
    let content = fs::read_to_string(path).ok()?;
    content.trim().parse::<i32>().ok().filter(|pid| *pid > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::always;
    use tempfile::TempDir;

    mock! {
        Launcher {}
        impl BackendLauncher for Launcher {
            fn launch(&self, workspace: &Workspace) -> Result<(), LaunchError>;
            fn terminate(&self, workspace: &Workspace) -> Result<(), LaunchError>;
        }
    }

    fn exited() -> LaunchError {
        LaunchError::BackendExited {
            binary: "mpd".to_owned(),
            status: "exit status: 1".to_owned(),
            stderr: "failed to bind".to_owned(),
        }
    }

    #[test]
    fn start_launches_once_and_shutdown_removes_workspace() {
        let dir = TempDir::new().expect("temp dir");
        let base = dir.path().join("player");
        let mut launcher = MockLauncher::new();
        launcher.expect_launch().with(always()).once().returning(|_| Ok(()));
        launcher.expect_terminate().once().returning(|_| Ok(()));

        let mut daemon = DaemonInstance::start(&base, &BackendSettings::default(), Arc::new(launcher))
            .expect("start daemon");
        assert!(daemon.is_running());
        assert!(daemon.workspace().exists());

        daemon.shutdown();
        daemon.shutdown();

        assert!(!daemon.is_running());
        assert!(!base.exists());
    }

    #[test]
    fn failed_launch_removes_the_workspace() {
        let dir = TempDir::new().expect("temp dir");
        let base = dir.path().join("player");
        let mut launcher = MockLauncher::new();
        launcher.expect_launch().once().returning(|_| Err(exited()));
        launcher.expect_terminate().never();

        let error = DaemonInstance::start(&base, &BackendSettings::default(), Arc::new(launcher))
            .expect_err("launch fails");

        assert!(matches!(error, LaunchError::BackendExited { .. }));
        assert!(!base.exists());
    }

    #[test]
    fn workspace_conflict_skips_launch() {
        let dir = TempDir::new().expect("temp dir");
        let base = dir.path().join("player");
        fs::create_dir(&base).expect("pre-create base");
        let mut launcher = MockLauncher::new();
        launcher.expect_launch().never();

        let error = DaemonInstance::start(&base, &BackendSettings::default(), Arc::new(launcher))
            .expect_err("conflict");

        assert!(matches!(
            error,
            LaunchError::Workspace(crate::WorkspaceError::Conflict { .. })
        ));
        assert!(base.is_dir());
    }

    #[test]
    fn failed_stop_request_still_destroys_workspace() {
        let dir = TempDir::new().expect("temp dir");
        let base = dir.path().join("player");
        let mut launcher = MockLauncher::new();
        launcher.expect_launch().returning(|_| Ok(()));
        launcher.expect_terminate().once().returning(|_| Err(exited()));

        let mut daemon = DaemonInstance::start(&base, &BackendSettings::default(), Arc::new(launcher))
            .expect("start daemon");
        daemon.shutdown();

        assert!(!base.exists());
    }

    #[test]
    fn created_daemon_is_never_stopped() {
        let dir = TempDir::new().expect("temp dir");
        let base = dir.path().join("player");
        let mut launcher = MockLauncher::new();
        launcher.expect_launch().never();
        launcher.expect_terminate().never();

        let mut daemon =
            DaemonInstance::create(&base, &BackendSettings::default(), Arc::new(launcher))
                .expect("create workspace");
        assert!(!daemon.is_running());
        daemon.shutdown();

        assert!(!base.exists());
    }

    #[test]
    fn drop_tears_down_a_running_daemon() {
        let dir = TempDir::new().expect("temp dir");
        let base = dir.path().join("player");
        let mut launcher = MockLauncher::new();
        launcher.expect_launch().returning(|_| Ok(()));
        launcher.expect_terminate().once().returning(|_| Ok(()));

        let daemon = DaemonInstance::start(&base, &BackendSettings::default(), Arc::new(launcher))
            .expect("start daemon");
        drop(daemon);

        assert!(!base.exists());
    }

    #[test]
    fn unreadable_pid_files_are_ignored() {
        let dir = TempDir::new().expect("temp dir");
        let pid = dir.path().join("pid");
        fs::write(&pid, "not-a-pid\n").expect("write pid");

        assert_eq!(read_pid(&pid), None);
        assert_eq!(read_pid(&dir.path().join("absent")), None);
        signal_recorded_pid(&pid);
    }
}
