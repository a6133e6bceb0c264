//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use webradio::ControllerError;
use webradio_playlist::ResolutionError;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("no channel list configured; pass --channels-file or set WEBRADIO_CHANNELS_FILE")]
    MissingChannelsFile,
    #[error("failed to read channel list '{path}': {source}")]
    ReadChannels {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("channel list '{path}' names no channels")]
    NoChannels { path: Utf8PathBuf },
    #[error("failed to resolve channel {index} ({url}): {source}")]
    Resolve {
        index: usize,
        url: String,
        #[source]
        source: ResolutionError,
    },
    #[error("failed to prepare player directory '{path}': {source}")]
    PrepareBase {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),
    #[error(transparent)]
    Player(#[from] ControllerError),
    #[error("failed to write to the terminal: {0}")]
    Output(#[source] io::Error),
    #[error("failed to read a command: {0}")]
    Input(#[source] io::Error),
}
