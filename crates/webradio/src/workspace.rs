//! Private on-disk environment of one backend daemon.
//!
//! A workspace rooted at `base` owns the following tree:
//!
//! ```text
//! base/
//! └── mpd/
//!     ├── mpd.conf
//!     ├── database
//!     ├── log
//!     ├── pid
//!     ├── state
//!     ├── sticker.sql
//!     ├── socket
//!     └── playlists/
//! ```
//!
//! The daemon is launched with `XDG_CONFIG_HOME=base`, so it discovers
//! `mpd/mpd.conf` without any command-line arguments.

use std::fs::{self, DirBuilder, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use thiserror::Error;
use tracing::{debug, warn};

use webradio_config::Config;

use crate::DAEMON_TARGET;
use crate::quote::quoted;

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

const BACKEND_DIR: &str = "mpd";
const CONFIG_FILE: &str = "mpd.conf";

/// Errors raised while preparing a workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The base directory already exists.
    #[error("workspace '{path}' already exists")]
    Conflict {
        /// Requested base directory.
        path: PathBuf,
    },
    /// The parent of the base directory does not exist.
    #[error("parent directory of workspace '{path}' does not exist")]
    MissingParent {
        /// Requested base directory.
        path: PathBuf,
    },
    /// A directory in the tree could not be created.
    #[error("failed to create directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing the generated configuration file failed.
    #[error("failed to write backend configuration '{path}': {source}")]
    WriteConfig {
        /// Configuration file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The empty database file could not be created.
    #[error("failed to create backend database '{path}': {source}")]
    CreateDatabase {
        /// Database file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Settings written into every generated backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    /// Audio output plugin, e.g. `alsa` or `pulse`.
    pub audio_output: String,
    /// Music directory the backend indexes.
    pub music_directory: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for BackendSettings {
    fn from(config: &Config) -> Self {
        Self {
            audio_output: config.audio_output().to_owned(),
            music_directory: config.music_directory().to_owned(),
        }
    }
}

/// Filesystem layout of a backend workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    base: PathBuf,
    backend_dir: PathBuf,
}

impl Workspace {
    /// Describes the workspace rooted at `base` without touching the
    /// filesystem. Relative paths are made absolute.
    ///
    /// # Errors
    ///
    /// Fails when the current directory cannot be read to absolutise `base`.
    pub fn at(base: &Path) -> io::Result<Self> {
        let base = std::path::absolute(base)?;
        let backend_dir = base.join(BACKEND_DIR);
        Ok(Self { base, backend_dir })
    }

    /// Creates the workspace tree and writes the backend configuration.
    ///
    /// The base directory must not exist yet, but its parent must. If any
    /// later step fails the partially created tree is removed again.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Conflict`] when `base` exists,
    /// [`WorkspaceError::MissingParent`] when its parent does not, and the
    /// remaining variants when a file or directory cannot be written.
    pub fn create(base: &Path, settings: &BackendSettings) -> Result<Self, WorkspaceError> {
        let workspace = Self::at(base).map_err(|source| WorkspaceError::CreateDirectory {
            path: base.to_path_buf(),
            source,
        })?;
        create_private_dir(&workspace.base)?;
        if let Err(error) = workspace.populate(settings) {
            workspace.destroy();
            return Err(error);
        }
        debug!(
            target: DAEMON_TARGET,
            workspace = %workspace.base.display(),
            "created backend workspace"
        );
        Ok(workspace)
    }

    fn populate(&self, settings: &BackendSettings) -> Result<(), WorkspaceError> {
        create_private_dir(&self.backend_dir)?;
        create_private_dir(&self.playlist_dir())?;
        let database = self.database_path();
        File::create(&database)
            .map_err(|source| WorkspaceError::CreateDatabase { path: database, source })?;
        let config = self.config_path();
        atomic_write(&config, self.render_config(settings).as_bytes())
            .map_err(|source| WorkspaceError::WriteConfig { path: config, source })
    }

    /// Renders the backend configuration for this workspace.
    #[must_use]
    pub fn render_config(&self, settings: &BackendSettings) -> String {
        let path = |path: PathBuf| quoted(&path.to_string_lossy());
        format!(
            "music_directory    {music}\n\
             playlist_directory {playlists}\n\
             db_file            {database}\n\
             log_file           {log}\n\
             pid_file           {pid}\n\
             state_file         {state}\n\
             sticker_file       {sticker}\n\
             \n\
             bind_to_address    {socket}\n\
             \n\
             input {{\n    plugin \"curl\"\n}}\n\
             \n\
             audio_output {{\n    \
                 type       {output}\n    \
                 name       \"webradio\"\n    \
                 mixer_type \"software\"\n\
             }}\n\
             \n\
             replaygain         \"off\"\n",
            music = quoted(&settings.music_directory),
            playlists = path(self.playlist_dir()),
            database = path(self.database_path()),
            log = path(self.log_path()),
            pid = path(self.pid_path()),
            state = path(self.state_path()),
            sticker = path(self.sticker_path()),
            socket = path(self.socket_path()),
            output = quoted(&settings.audio_output),
        )
    }

    /// Removes the workspace tree.
    ///
    /// Missing paths are ignored. A base directory that still holds foreign
    /// files is left in place with a warning.
    pub fn destroy(&self) {
        match fs::remove_dir_all(&self.backend_dir) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => warn!(
                target: DAEMON_TARGET,
                path = %self.backend_dir.display(),
                error = %error,
                "failed to remove backend directory"
            ),
        }
        remove_empty_dir(&self.base);
    }

    /// Base directory; also the `XDG_CONFIG_HOME` of the daemon.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory holding every backend file.
    #[must_use]
    pub fn backend_dir(&self) -> &Path {
        &self.backend_dir
    }

    /// Returns whether the backend directory is present on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.backend_dir.exists()
    }

    /// Generated `mpd.conf`, found by the daemon through `XDG_CONFIG_HOME`.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.backend_dir.join(CONFIG_FILE)
    }

    /// Song database, created empty.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.backend_dir.join("database")
    }

    /// Daemon log file.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.backend_dir.join("log")
    }

    /// Pid file written by the daemon once it has started.
    #[must_use]
    pub fn pid_path(&self) -> PathBuf {
        self.backend_dir.join("pid")
    }

    /// Playback state saved by the daemon on exit.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.backend_dir.join("state")
    }

    /// Sticker database.
    #[must_use]
    pub fn sticker_path(&self) -> PathBuf {
        self.backend_dir.join("sticker.sql")
    }

    /// Stored playlists directory.
    #[must_use]
    pub fn playlist_dir(&self) -> PathBuf {
        self.backend_dir.join("playlists")
    }

    /// Unix socket the daemon listens on.
    #[must_use]
    pub fn socket_path(&self) -> PathBuf {
        self.backend_dir.join("socket")
    }
}

/// Creates `path` with owner-only permissions. The parent must exist and
/// `path` must not.
pub(crate) fn create_private_dir(path: &Path) -> Result<(), WorkspaceError> {
    let mut builder = DirBuilder::new();
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(path).map_err(|source| match source.kind() {
        io::ErrorKind::AlreadyExists => WorkspaceError::Conflict {
            path: path.to_path_buf(),
        },
        io::ErrorKind::NotFound => WorkspaceError::MissingParent {
            path: path.to_path_buf(),
        },
        _ => WorkspaceError::CreateDirectory {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Removes `path` if it is an empty directory, warning when it is not.
pub(crate) fn remove_empty_dir(path: &Path) {
    match fs::remove_dir(path) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => warn!(
            target: DAEMON_TARGET,
            path = %path.display(),
            error = %error,
            "leaving directory in place"
        ),
    }
}

/// Writes `contents` to `path` through a temporary file in the same
/// directory, so the daemon never reads a partial configuration.
fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "target path did not have a parent directory",
        )
    })?;

    let mut builder = Builder::new();
    builder.prefix(CONFIG_FILE);
    #[cfg(unix)]
    builder.permissions(fs::Permissions::from_mode(0o600));

    let mut file = builder.tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}
