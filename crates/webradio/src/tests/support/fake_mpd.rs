//! In-process stand-in for a Music Player Daemon.
//!
//! Listens on a Unix socket, speaks enough of the protocol for the client
//! (`status`, `setvol`, `clear`, `add`, `play`, `ping`, `close`) and records
//! every command it answers. Connections are served one at a time.

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Observable state of a fake daemon.
#[derive(Debug, Clone)]
pub(crate) struct MpdState {
    pub volume: i64,
    pub queue: Vec<String>,
    pub song: Option<usize>,
    pub playing: bool,
    pub commands: Vec<String>,
    pub connections: usize,
    sever: usize,
}

impl MpdState {
    fn with_volume(volume: i64) -> Self {
        Self {
            volume,
            queue: Vec::new(),
            song: None,
            playing: false,
            commands: Vec::new(),
            connections: 0,
            sever: 0,
        }
    }
}

enum Reply {
    Text(String),
    HangUp,
}

pub(crate) struct FakeMpd {
    socket: PathBuf,
    state: Arc<Mutex<MpdState>>,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeMpd {
    /// Starts a fake daemon whose mixer reports `volume`; `-1` means no
    /// mixer.
    pub(crate) fn spawn(socket: &Path, volume: i64) -> io::Result<Self> {
        let listener = UnixListener::bind(socket)?;
        listener.set_nonblocking(true)?;
        let state = Arc::new(Mutex::new(MpdState::with_volume(volume)));
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let state = Arc::clone(&state);
            let stop = Arc::clone(&stop);
            thread::spawn(move || serve(&listener, &state, &stop))
        };
        Ok(Self {
            socket: socket.to_path_buf(),
            state,
            stop,
            handle: Some(handle),
        })
    }

    pub(crate) fn socket(&self) -> &Path {
        &self.socket
    }

    pub(crate) fn state(&self) -> MpdState {
        lock(&self.state).clone()
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        lock(&self.state).commands.clone()
    }

    /// Answers the next `count` commands by hanging up.
    pub(crate) fn sever_next(&self, count: usize) {
        lock(&self.state).sever = count;
    }

    /// Empties the queue behind the client's back.
    pub(crate) fn clear_queue(&self) {
        let mut state = lock(&self.state);
        state.queue.clear();
        state.song = None;
    }
}

impl Drop for FakeMpd {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let _ = fs::remove_file(&self.socket);
    }
}

fn lock(state: &Mutex<MpdState>) -> MutexGuard<'_, MpdState> {
    state
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn serve(listener: &UnixListener, state: &Mutex<MpdState>, stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                lock(state).connections += 1;
                let _ = serve_connection(stream, state, stop);
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(POLL_INTERVAL);
            }
            Err(_) => return,
        }
    }
}

fn serve_connection(stream: UnixStream, state: &Mutex<MpdState>, stop: &AtomicBool) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let mut writer = stream.try_clone()?;
    writer.write_all(b"OK MPD 0.23.5\n")?;
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        match reader.read_line(&mut line) {
            Ok(0) => return Ok(()),
            Ok(_) if line.ends_with('\n') => {
                let command = line.trim_end().to_owned();
                line.clear();
                if command == "close" {
                    return Ok(());
                }
                match respond(&command, &mut lock(state)) {
                    Reply::Text(text) => writer.write_all(text.as_bytes())?,
                    Reply::HangUp => return Ok(()),
                }
            }
            Ok(_) => {}
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                if stop.load(Ordering::SeqCst) {
                    return Ok(());
                }
            }
            Err(error) => return Err(error),
        }
    }
}

fn respond(command: &str, state: &mut MpdState) -> Reply {
    if state.sever > 0 {
        state.sever -= 1;
        return Reply::HangUp;
    }
    state.commands.push(command.to_owned());
    let (name, argument) = command
        .split_once(' ')
        .map_or((command, None), |(name, argument)| (name, Some(argument)));
    let text = match (name, argument) {
        ("status", None) => status(state),
        ("ping", None) => ok(),
        ("clear", None) => {
            state.queue.clear();
            state.song = None;
            state.playing = false;
            ok()
        }
        ("add", Some(argument)) => {
            state.queue.push(unquote(argument));
            ok()
        }
        ("setvol", Some(argument)) => match argument.parse::<i64>() {
            Ok(volume) if (0..=100).contains(&volume) => {
                state.volume = volume;
                ok()
            }
            _ => ack(2, "setvol", "Invalid volume value"),
        },
        ("play", None) => {
            if !state.queue.is_empty() {
                state.playing = true;
                state.song.get_or_insert(0);
            }
            ok()
        }
        ("play", Some(argument)) => match argument.parse::<usize>() {
            Ok(position) if position < state.queue.len() => {
                state.song = Some(position);
                state.playing = true;
                ok()
            }
            _ => ack(2, "play", "Bad song index"),
        },
        _ => ack(5, "", &format!("unknown command \"{name}\"")),
    };
    Reply::Text(text)
}

fn status(state: &MpdState) -> String {
    let mut text = format!(
        "volume: {}\nrepeat: 0\nplaylistlength: {}\nstate: {}\n",
        state.volume,
        state.queue.len(),
        if state.playing { "play" } else { "stop" }
    );
    if let Some(song) = state.song {
        text.push_str(&format!("song: {song}\n"));
    }
    text.push_str("OK\n");
    text
}

fn ok() -> String {
    String::from("OK\n")
}

fn ack(code: u32, command: &str, message: &str) -> String {
    format!("ACK [{code}@0] {{{command}}} {message}\n")
}

fn unquote(argument: &str) -> String {
    let inner = argument
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(argument);
    let mut value = String::with_capacity(inner.len());
    let mut characters = inner.chars();
    while let Some(character) = characters.next() {
        if character == '\\' {
            if let Some(escaped) = characters.next() {
                value.push(escaped);
            }
        } else {
            value.push(character);
        }
    }
    value
}
