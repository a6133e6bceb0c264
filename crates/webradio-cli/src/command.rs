//! Prompt commands.

use std::str::FromStr;

use thiserror::Error;

/// One line typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Play the channel with this zero-based number.
    Play(i64),
    /// Set the volume.
    Volume(i64),
    /// Toggle mute.
    Mute,
    /// Switch to the prebuffering pool.
    Pool,
    /// Switch to a single daemon.
    Single,
    /// Print the channel list again.
    List,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum CommandError {
    #[error("unknown command '{0}'; try a channel number, vol <n>, mute, pool, single, list or quit")]
    Unknown(String),
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("vol needs a value between 0 and 100")]
    MissingVolume,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Ok(Self::Quit);
        };
        let command = match word {
            "vol" | "volume" => {
                let value = words.next().ok_or(CommandError::MissingVolume)?;
                Self::Volume(number(value)?)
            }
            "mute" => Self::Mute,
            "pool" => Self::Pool,
            "single" => Self::Single,
            "list" | "ls" => Self::List,
            "quit" | "exit" | "q" => Self::Quit,
            other if other.starts_with(|first: char| first.is_ascii_digit() || first == '-') => {
                Self::Play(number(other)?)
            }
            other => return Err(CommandError::Unknown(other.to_owned())),
        };
        match words.next() {
            Some(extra) => Err(CommandError::Unknown(extra.to_owned())),
            None => Ok(command),
        }
    }
}

fn number(text: &str) -> Result<i64, CommandError> {
    text.parse()
        .map_err(|_| CommandError::NotANumber(text.to_owned()))
}
