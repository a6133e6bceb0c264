//! Tears the player down when the process is asked to stop.

use std::process;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use tracing::{info, warn};
use webradio::Player;

use crate::CLI_TARGET;
use crate::errors::AppError;

/// Background thread waiting for a termination signal.
///
/// On a signal the player is shut down and the process exits with
/// `128 + signal`. [`SignalListener::close`] stops the thread when the prompt
/// ends normally.
pub(crate) struct SignalListener {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalListener {
    pub(crate) fn install(player: Arc<Mutex<Player>>) -> Result<Self, AppError> {
        let mut signals =
            Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP]).map_err(AppError::Signals)?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name("webradio-signals".to_owned())
            .spawn(move || {
                let Some(signal) = signals.forever().next() else {
                    return;
                };
                info!(target: CLI_TARGET, signal, "shutdown signal received");
                player
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .shutdown();
                process::exit(128 + signal);
            })
            .map_err(AppError::Signals)?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    pub(crate) fn close(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(target: CLI_TARGET, "signal listener panicked");
            }
        }
    }
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        self.stop();
    }
}
