//! Command-line front end for the webradio player.
//!
//! [`run`] loads configuration, installs logging, resolves the channel list,
//! starts a [`webradio::Player`] and drives it from a line prompt until the
//! user quits or the process receives a termination signal. The player is
//! always shut down before `run` returns.

use std::ffi::OsString;
use std::fs;
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};

use camino::Utf8Path;
use tracing::info;
use webradio::Player;
use webradio_config::Config;
use webradio_playlist::LocalFetcher;

mod channels;
mod command;
mod config;
mod errors;
mod prompt;
mod signals;
pub mod telemetry;

use config::{ConfigLoader, OrthoConfigLoader};
use errors::AppError;
use prompt::Terminal;
use signals::SignalListener;

pub(crate) const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::prompt");

/// Runs the player with the given arguments and terminal streams.
///
/// Returns [`ExitCode::FAILURE`] after printing the error to `stderr` when
/// the player cannot be started or the terminal fails.
pub fn run<I, R, W, E>(args: I, stdin: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdin, stdout, stderr, &OrthoConfigLoader)
}

fn run_with_loader<I, R, W, E>(
    args: I,
    stdin: R,
    stdout: &mut W,
    stderr: &mut E,
    loader: &dyn ConfigLoader,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let result = loader.load(&args).and_then(|config| {
        let terminal = Terminal {
            input: stdin,
            output: &mut *stdout,
            errors: &mut *stderr,
        };
        play(&config, terminal)
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "webradio: {error}");
            ExitCode::FAILURE
        }
    }
}

fn play<R, W, E>(config: &Config, terminal: Terminal<'_, R, W, E>) -> Result<(), AppError>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    telemetry::initialise(config)?;
    let path = config.channels_file().ok_or(AppError::MissingChannelsFile)?;
    let channels = channels::load(path, &LocalFetcher)?;
    prepare_base_parent(config.base_path())?;

    let player = Arc::new(Mutex::new(Player::from_config(config, channels.clone())?));
    let listener = match SignalListener::install(Arc::clone(&player)) {
        Ok(listener) => listener,
        Err(error) => {
            shutdown(&player);
            return Err(error);
        }
    };
    let outcome = prompt::run(&*player, &channels, terminal);
    listener.close();
    shutdown(&player);
    outcome
}

fn shutdown(player: &Mutex<Player>) {
    player.lock().unwrap_or_else(PoisonError::into_inner).shutdown();
    info!(target: CLI_TARGET, "player stopped");
}

/// Creates the directories above `base`; `base` itself must not exist yet.
fn prepare_base_parent(base: &Utf8Path) -> Result<(), AppError> {
    let Some(parent) = base.parent().filter(|parent| !parent.as_str().is_empty()) else {
        return Ok(());
    };
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(parent)
        .map_err(|source| AppError::PrepareBase {
            path: parent.to_owned(),
            source,
        })
}
