use camino::Utf8PathBuf;
use std::env;

#[cfg(unix)]
use dirs::runtime_dir;
#[cfg(unix)]
use libc::geteuid;

/// Backend executable launched for every player workspace.
pub const DEFAULT_BACKEND_BINARY: &str = "mpd";

/// Sound sink selected in the generated `audio_output` block.
pub const DEFAULT_AUDIO_OUTPUT: &str = "alsa";

/// Music directory written into backend configs. The player never reads it.
pub const DEFAULT_MUSIC_DIRECTORY: &str = "~/Music";

/// Number of connection attempts made while a freshly spawned backend opens
/// its socket.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 50;

/// Delay between connection attempts, in milliseconds.
pub const DEFAULT_CONNECT_INTERVAL_MS: u64 = 200;

/// Read/write timeout applied to backend sockets, in milliseconds.
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 5_000;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Directory name appended to the runtime base for player workspaces.
const WORKSPACE_DIRECTORY: &str = "player";

/// Default log filter expression used by the binary.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binary.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

/// Owned backend binary name.
pub fn default_backend_binary() -> String {
    DEFAULT_BACKEND_BINARY.to_string()
}

/// Owned audio output type.
pub fn default_audio_output() -> String {
    DEFAULT_AUDIO_OUTPUT.to_string()
}

/// Owned music directory.
pub fn default_music_directory() -> String {
    DEFAULT_MUSIC_DIRECTORY.to_string()
}

/// Computes the default workspace root for the player.
///
/// The root itself must not exist when the player starts, so it sits one
/// level below the per-user runtime directory which is created on demand.
pub fn default_base_path() -> Utf8PathBuf {
    default_base_path_inner()
}

#[cfg(unix)]
fn default_base_path_inner() -> Utf8PathBuf {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("webradio");
    if apply_namespace {
        base.push(user_namespace());
    }
    base.join(WORKSPACE_DIRECTORY)
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn default_base_path_inner() -> Utf8PathBuf {
    let mut base = fallback_base_directory();
    base.push("webradio");
    base.join(WORKSPACE_DIRECTORY)
}
