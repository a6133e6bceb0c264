use std::ffi::OsString;
use std::process::{Command, Output, Stdio};

use tracing::debug;

use super::errors::LaunchError;
use crate::DAEMON_TARGET;
use crate::workspace::Workspace;

/// Environment variable the backend reads to locate `mpd/mpd.conf`.
pub const CONFIG_HOME_ENV: &str = "XDG_CONFIG_HOME";

/// Starts and stops the backend process for a workspace.
pub trait BackendLauncher: Send + Sync {
    /// Starts a daemon for `workspace`. The call returns once the daemon has
    /// detached; its socket may not be listening yet.
    ///
    /// # Errors
    ///
    /// Returns an error when the daemon could not be started.
    fn launch(&self, workspace: &Workspace) -> Result<(), LaunchError>;

    /// Asks the daemon owning `workspace` to exit.
    ///
    /// # Errors
    ///
    /// Returns an error when the stop request failed.
    fn terminate(&self, workspace: &Workspace) -> Result<(), LaunchError>;
}

/// Launches the real `mpd` executable.
///
/// `mpd` daemonizes itself, so both launching and the `--kill` request run to
/// completion synchronously.
#[derive(Debug, Clone)]
pub struct MpdLauncher {
    binary: OsString,
}

impl MpdLauncher {
    /// Builds a launcher for the executable at `binary`, resolved via `PATH`
    /// when it is a bare name.
    #[must_use]
    pub fn new(binary: impl Into<OsString>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, workspace: &Workspace, arguments: &[&str]) -> Result<(), LaunchError> {
        let binary = self.binary.to_string_lossy().into_owned();
        debug!(
            target: DAEMON_TARGET,
            binary = %binary,
            ?arguments,
            workspace = %workspace.base().display(),
            "running backend"
        );
        let output = Command::new(&self.binary)
            .args(arguments)
            .env(CONFIG_HOME_ENV, workspace.base())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| LaunchError::LaunchBackend {
                binary: binary.clone(),
                source,
            })?;
        check_output(binary, &output)
    }
}

impl BackendLauncher for MpdLauncher {
    fn launch(&self, workspace: &Workspace) -> Result<(), LaunchError> {
        self.run(workspace, &[])
    }

    fn terminate(&self, workspace: &Workspace) -> Result<(), LaunchError> {
        self.run(workspace, &["--kill"])
    }
}

fn check_output(binary: String, output: &Output) -> Result<(), LaunchError> {
    if output.status.success() {
        return Ok(());
    }
    Err(LaunchError::BackendExited {
        binary,
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::workspace::BackendSettings;
    use tempfile::TempDir;

    fn workspace(dir: &TempDir) -> Workspace {
        Workspace::create(&dir.path().join("player"), &BackendSettings::default())
            .expect("create workspace")
    }

    #[test]
    fn missing_binary_fails_to_launch() {
        let dir = TempDir::new().expect("temp dir");
        let launcher = MpdLauncher::new("/nonexistent/webradio/mpd");

        let error = launcher.launch(&workspace(&dir)).expect_err("launch fails");

        assert!(matches!(error, LaunchError::LaunchBackend { .. }));
    }

    #[test]
    fn failing_binary_reports_exit_status() {
        let dir = TempDir::new().expect("temp dir");
        let launcher = MpdLauncher::new("false");

        let error = launcher.terminate(&workspace(&dir)).expect_err("kill fails");

        assert!(matches!(error, LaunchError::BackendExited { binary, .. } if binary == "false"));
    }

    #[test]
    fn succeeding_binary_launches() {
        let dir = TempDir::new().expect("temp dir");

        MpdLauncher::new("true")
            .launch(&workspace(&dir))
            .expect("launch succeeds");
    }
}
