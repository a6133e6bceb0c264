//! The interactive line prompt.

use std::io::{BufRead, Write};
use std::sync::{Mutex, PoisonError};

use tracing::debug;
use webradio::{ClientError, ControllerError, Player};

use crate::CLI_TARGET;
use crate::command::Command;
use crate::errors::AppError;

/// Player operations reachable from the prompt.
pub(crate) trait PlayerControl {
    fn play(&mut self, index: i64) -> Result<(), ControllerError>;
    fn set_volume(&mut self, volume: i64) -> Result<(), ControllerError>;
    fn toggle_mute(&mut self) -> Result<(), ControllerError>;
    fn is_muted(&self) -> bool;
    fn set_prebuffering(&mut self, prebuffering: bool) -> Result<(), ControllerError>;
}

impl PlayerControl for Player {
    fn play(&mut self, index: i64) -> Result<(), ControllerError> {
        Self::play(self, index)
    }

    fn set_volume(&mut self, volume: i64) -> Result<(), ControllerError> {
        Self::set_volume(self, volume)
    }

    fn toggle_mute(&mut self) -> Result<(), ControllerError> {
        Self::toggle_mute(self)
    }

    fn is_muted(&self) -> bool {
        Self::is_muted(self)
    }

    fn set_prebuffering(&mut self, prebuffering: bool) -> Result<(), ControllerError> {
        Self::set_prebuffering(self, prebuffering)
    }
}

/// Streams the prompt talks to.
pub(crate) struct Terminal<'a, R, W, E> {
    pub(crate) input: R,
    pub(crate) output: &'a mut W,
    pub(crate) errors: &'a mut E,
}

/// Reads commands until `quit`, an empty line or end of input.
///
/// Command failures are reported on the error stream and the prompt
/// continues. Only terminal IO failures end the loop early.
pub(crate) fn run<P, R, W, E>(
    player: &Mutex<P>,
    channels: &[String],
    terminal: Terminal<'_, R, W, E>,
) -> Result<(), AppError>
where
    P: PlayerControl,
    R: BufRead,
    W: Write,
    E: Write,
{
    let Terminal {
        input,
        output,
        errors,
    } = terminal;
    print_channels(output, channels)?;
    let mut lines = input.lines();
    loop {
        write!(output, "> ")
            .and_then(|()| output.flush())
            .map_err(AppError::Output)?;
        let Some(line) = lines.next() else {
            writeln!(output).map_err(AppError::Output)?;
            return Ok(());
        };
        let line = line.map_err(AppError::Input)?;
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(error) => {
                writeln!(errors, "{error}").map_err(AppError::Output)?;
                continue;
            }
        };
        debug!(target: CLI_TARGET, ?command, "prompt command");
        if command == Command::Quit {
            return Ok(());
        }
        if command == Command::List {
            print_channels(output, channels)?;
            continue;
        }
        let mut guard = player.lock().unwrap_or_else(PoisonError::into_inner);
        match execute(&mut *guard, command, channels) {
            Ok(message) => writeln!(output, "{message}").map_err(AppError::Output)?,
            Err(error) => {
                writeln!(errors, "error: {error}").map_err(AppError::Output)?;
                if matches!(
                    error,
                    ControllerError::Client(ClientError::OutOfRange { .. })
                ) {
                    print_channels(output, channels)?;
                }
            }
        }
    }
}

fn execute<P: PlayerControl>(
    player: &mut P,
    command: Command,
    channels: &[String],
) -> Result<String, ControllerError> {
    match command {
        Command::Play(index) => {
            player.play(index)?;
            let url = usize::try_from(index)
                .ok()
                .and_then(|position| channels.get(position))
                .map_or("", String::as_str);
            Ok(format!("playing {index}: {url}"))
        }
        Command::Volume(volume) => {
            player.set_volume(volume)?;
            Ok(format!("volume {volume}"))
        }
        Command::Mute => {
            player.toggle_mute()?;
            Ok(if player.is_muted() { "muted" } else { "unmuted" }.to_owned())
        }
        Command::Pool => {
            player.set_prebuffering(true)?;
            Ok("prebuffering every channel".to_owned())
        }
        Command::Single => {
            player.set_prebuffering(false)?;
            Ok("playing through a single daemon".to_owned())
        }
        Command::List | Command::Quit => Ok(String::new()),
    }
}

fn print_channels<W: Write>(output: &mut W, channels: &[String]) -> Result<(), AppError> {
    for (index, url) in channels.iter().enumerate() {
        writeln!(output, "{index:>3}  {url}").map_err(AppError::Output)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Control {}
        impl PlayerControl for Control {
            fn play(&mut self, index: i64) -> Result<(), ControllerError>;
            fn set_volume(&mut self, volume: i64) -> Result<(), ControllerError>;
            fn toggle_mute(&mut self) -> Result<(), ControllerError>;
            fn is_muted(&self) -> bool;
            fn set_prebuffering(&mut self, prebuffering: bool) -> Result<(), ControllerError>;
        }
    }

    fn channels() -> Vec<String> {
        vec![
            "http://radio.example/a.mp3".to_owned(),
            "http://radio.example/b.mp3".to_owned(),
        ]
    }

    struct Transcript {
        output: String,
        errors: String,
    }

    fn drive(control: MockControl, input: &str) -> Transcript {
        let player = Mutex::new(control);
        let mut output = Vec::new();
        let mut errors = Vec::new();
        run(
            &player,
            &channels(),
            Terminal {
                input: Cursor::new(input.to_owned()),
                output: &mut output,
                errors: &mut errors,
            },
        )
        .expect("prompt loop");
        Transcript {
            output: String::from_utf8(output).expect("utf-8 output"),
            errors: String::from_utf8(errors).expect("utf-8 errors"),
        }
    }

    #[test]
    fn prints_the_numbered_list_and_exits_on_eof() {
        let transcript = drive(MockControl::new(), "");

        assert_eq!(
            transcript.output,
            "  0  http://radio.example/a.mp3\n  1  http://radio.example/b.mp3\n> \n"
        );
        assert!(transcript.errors.is_empty());
    }

    #[test]
    fn dispatches_commands_to_the_player() {
        let mut control = MockControl::new();
        control.expect_play().with(eq(1)).once().returning(|_| Ok(()));
        control.expect_set_volume().with(eq(40)).once().returning(|_| Ok(()));
        control.expect_toggle_mute().once().returning(|| Ok(()));
        control.expect_is_muted().return_const(true);
        control
            .expect_set_prebuffering()
            .with(eq(true))
            .once()
            .returning(|_| Ok(()));

        let transcript = drive(control, "1\nvol 40\nmute\npool\nquit\n2\n");

        assert!(transcript.output.contains("playing 1: http://radio.example/b.mp3"));
        assert!(transcript.output.contains("volume 40"));
        assert!(transcript.output.contains("muted"));
        assert!(transcript.errors.is_empty());
    }

    #[test]
    fn empty_line_ends_the_session() {
        let mut control = MockControl::new();
        control.expect_play().never();

        let transcript = drive(control, "\n0\n");

        assert!(!transcript.output.contains("playing"));
    }

    #[test]
    fn failures_are_reported_and_the_prompt_continues() {
        let mut control = MockControl::new();
        control.expect_play().with(eq(5)).once().returning(|index| {
            Err(ClientError::OutOfRange { index, len: 2 }.into())
        });
        control.expect_set_volume().with(eq(101)).once().returning(|volume| {
            Err(ClientError::InvalidVolume { volume }.into())
        });
        control.expect_set_prebuffering().with(eq(false)).once().returning(|_| Ok(()));

        let transcript = drive(control, "5\nvol 101\nbogus\nsingle\n");

        assert!(transcript.errors.contains("error:"));
        assert!(transcript.errors.contains("unknown command 'bogus'"));
        assert_eq!(transcript.output.matches("  0  http://radio.example/a.mp3").count(), 2);
        assert!(transcript.output.contains("playing through a single daemon"));
    }

    #[test]
    fn list_reprints_channels_without_touching_the_player() {
        let transcript = drive(MockControl::new(), "list\n");

        assert_eq!(transcript.output.matches("  1  http://radio.example/b.mp3").count(), 2);
    }
}
