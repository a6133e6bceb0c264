use std::io;

use thiserror::Error;

use crate::workspace::WorkspaceError;

/// Errors surfaced while starting or stopping a backend daemon.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Preparing the workspace failed.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    /// The backend executable could not be run.
    #[error("failed to run backend '{binary}': {source}")]
    LaunchBackend {
        /// Backend executable.
        binary: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The backend ran but reported failure.
    #[error("backend '{binary}' exited with {status}: {stderr}")]
    BackendExited {
        /// Backend executable.
        binary: String,
        /// Exit status rendered for display.
        status: String,
        /// Trimmed standard error of the backend.
        stderr: String,
    },
}
