//! Orchestration of Music Player Daemon processes for internet radio.
//!
//! Each daemon runs in a private [`Workspace`] and is driven over its Unix
//! socket by a [`ProtocolClient`]. A [`Player`] plays a list of channels in one
//! of two modes:
//!
//! - single: one daemon whose queue holds every channel;
//! - prebuffering: one muted daemon per channel, all playing, with switching
//!   reduced to a mute and an unmute.
//!
//! The [`BackendLauncher`] trait is the seam between the orchestration logic
//! and the `mpd` executable; [`MpdLauncher`] is the production
//! implementation.

pub mod client;
pub mod controller;
pub mod daemon;
mod player;
mod quote;
pub mod workspace;

#[cfg(test)]
mod tests;

pub use client::{ClientError, ConnectPolicy, ProtocolClient, Status};
pub use controller::{
    ActiveController, Controller, ControllerError, ControllerSettings, PoolController,
    SingleController,
};
pub use daemon::{BackendLauncher, DaemonInstance, LaunchError, MpdLauncher};
pub use player::Player;
pub use workspace::{BackendSettings, Workspace, WorkspaceError};

pub(crate) const DAEMON_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::daemon");
pub(crate) const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::client");
pub(crate) const PLAYER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::player");
