//! Shared configuration for the webradio player.
//!
//! Values are layered by `ortho_config`: built-in defaults first, then a TOML
//! file named by `--config-path` or `WEBRADIO_CONFIG_PATH`, then `WEBRADIO_*`
//! environment variables, and finally command-line flags.

use std::ffi::OsString;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoResult};
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;

pub use defaults::{
    DEFAULT_AUDIO_OUTPUT, DEFAULT_BACKEND_BINARY, DEFAULT_CONNECT_ATTEMPTS,
    DEFAULT_CONNECT_INTERVAL_MS, DEFAULT_IO_TIMEOUT_MS, DEFAULT_LOG_FILTER,
    DEFAULT_MUSIC_DIRECTORY, default_audio_output, default_backend_binary, default_base_path,
    default_log_filter, default_log_filter_string, default_log_format, default_music_directory,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved player configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "WEBRADIO")]
pub struct Config {
    /// Workspace root for backend instances. Must not exist at startup.
    #[ortho_config(default = default_base_path())]
    pub base_path: Utf8PathBuf,
    /// Backend executable, looked up on `PATH` when not absolute.
    #[ortho_config(default = default_backend_binary())]
    pub backend_binary: String,
    /// File listing channel URLs, one per line.
    pub channels_file: Option<Utf8PathBuf>,
    /// Start in pool mode with one backend per channel.
    #[ortho_config(default = false)]
    pub prebuffering: bool,
    /// Output plugin written into each backend's `audio_output` block.
    #[ortho_config(default = default_audio_output())]
    pub audio_output: String,
    /// Music directory written into each backend config.
    #[ortho_config(default = default_music_directory())]
    pub music_directory: String,
    /// Connection attempts made while a backend opens its socket.
    #[ortho_config(default = DEFAULT_CONNECT_ATTEMPTS)]
    pub connect_attempts: u32,
    /// Delay between connection attempts in milliseconds.
    #[ortho_config(default = DEFAULT_CONNECT_INTERVAL_MS)]
    pub connect_interval_ms: u64,
    /// Socket read/write timeout in milliseconds.
    #[ortho_config(default = DEFAULT_IO_TIMEOUT_MS)]
    pub io_timeout_ms: u64,
    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            backend_binary: default_backend_binary(),
            channels_file: None,
            prebuffering: false,
            audio_output: default_audio_output(),
            music_directory: default_music_directory(),
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            connect_interval_ms: DEFAULT_CONNECT_INTERVAL_MS,
            io_timeout_ms: DEFAULT_IO_TIMEOUT_MS,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Loads configuration with `args` as the command line.
    ///
    /// Layers are merged in increasing precedence: built-in defaults, the
    /// file named by `--config-path` or `WEBRADIO_CONFIG_PATH` (or a
    /// discovered `.webradio.toml`), `WEBRADIO_*` variables, then flags.
    /// The first element of `args` is the program name.
    ///
    /// # Errors
    ///
    /// Returns [`ortho_config::OrthoError`] when the arguments do not parse,
    /// a configuration file cannot be read, or a value has the wrong type.
    pub fn load_from_iter<I, T>(args: I) -> OrthoResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Workspace root for backend instances.
    #[must_use]
    pub fn base_path(&self) -> &Utf8Path {
        self.base_path.as_path()
    }

    /// Backend executable name or path.
    #[must_use]
    pub fn backend_binary(&self) -> &str {
        self.backend_binary.as_str()
    }

    /// Channel list file, when configured.
    #[must_use]
    pub fn channels_file(&self) -> Option<&Utf8Path> {
        self.channels_file.as_deref()
    }

    /// Whether the player starts in pool mode.
    #[must_use]
    pub const fn prebuffering(&self) -> bool {
        self.prebuffering
    }

    /// Output plugin type for backend configs.
    #[must_use]
    pub fn audio_output(&self) -> &str {
        self.audio_output.as_str()
    }

    /// Music directory for backend configs.
    #[must_use]
    pub fn music_directory(&self) -> &str {
        self.music_directory.as_str()
    }

    /// Number of connection attempts, never less than one.
    #[must_use]
    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts.max(1)
    }

    /// Delay between connection attempts.
    #[must_use]
    pub const fn connect_interval(&self) -> Duration {
        Duration::from_millis(self.connect_interval_ms)
    }

    /// Socket read/write timeout.
    #[must_use]
    pub const fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
