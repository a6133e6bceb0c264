//! Harness shared by unit and behavioural tests: a fake daemon, a launcher
//! that starts fake daemons, and fixtures wiring them to controllers.

mod fake_mpd;
mod fake_launcher;

use std::path::PathBuf;
use std::time::Duration;

use rstest::fixture;
use tempfile::TempDir;

use crate::client::ConnectPolicy;
use crate::controller::ControllerSettings;
use crate::workspace::BackendSettings;

pub(crate) use fake_mpd::FakeMpd;
pub(crate) use fake_launcher::{DEFAULT_VOLUME, FakeLauncher};

pub(crate) const CHANNELS: [&str; 3] = [
    "http://radio.example/a.mp3",
    "http://radio.example/b.mp3",
    "http://radio.example/c.mp3",
];

pub(crate) fn channels() -> Vec<String> {
    CHANNELS.iter().map(|url| (*url).to_owned()).collect()
}

/// Short waits so failing tests give up quickly.
pub(crate) fn fast_policy() -> ConnectPolicy {
    ConnectPolicy {
        attempts: 40,
        interval: Duration::from_millis(10),
        io_timeout: Duration::from_secs(2),
    }
}

pub(crate) fn settings_for(launcher: &FakeLauncher) -> ControllerSettings {
    ControllerSettings {
        backend: BackendSettings::default(),
        connect: fast_policy(),
        launcher: launcher.as_launcher(),
    }
}

/// Temporary directory plus the path a player may claim inside it.
pub(crate) struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub(crate) fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    pub(crate) fn base(&self) -> PathBuf {
        self.dir.path().join("player")
    }

    pub(crate) fn socket(&self) -> PathBuf {
        self.dir.path().join("mpd.socket")
    }
}

#[fixture]
pub(crate) fn sandbox() -> Sandbox {
    Sandbox::new()
}

#[fixture]
pub(crate) fn launcher() -> FakeLauncher {
    FakeLauncher::new()
}
