//! Entry point for the `webradio` binary.

use std::io::{self, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdin = io::stdin().lock();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    // Log output shares stderr from other threads, so it stays unlocked.
    let mut stderr = io::stderr();
    webradio_cli::run(std::env::args_os(), stdin, &mut stdout, &mut stderr)
}
