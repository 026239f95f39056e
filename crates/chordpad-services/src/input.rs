//! Channel-fed keypad input and a line-based command reader

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use chordpad_core::{InputSource, KEY_COUNT, KeyEvent};
use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Missing argument for {0}")]
    MissingArgument(String),
    #[error("Invalid argument {arg:?} for {command}")]
    InvalidArgument { command: String, arg: String },
    #[error("Key index out of range: {0}")]
    KeyOutOfRange(usize),
}

/// One hardware-level input change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMessage {
    Key(KeyEvent),
    /// Encoder rotated by a signed number of detents
    Turn(i32),
    /// Encoder button state
    Button(bool),
    Quit,
}

/// Pending messages before the line reader blocks
pub const INPUT_QUEUE_DEPTH: usize = 256;

/// Commands understood by [`parse_command`]
pub const COMMAND_HELP: &str = "p N press | r N release | t N tap | e D turn encoder | hold | unhold | q quit";

/// Parse one line of the text protocol.
///
/// ```
/// use chordpad_services::input::{parse_command, InputMessage};
/// use chordpad_core::KeyEvent;
/// assert_eq!(
///     parse_command("tap 3").unwrap(),
///     vec![InputMessage::Key(KeyEvent::pressed(3)), InputMessage::Key(KeyEvent::released(3))]
/// );
/// ```
pub fn parse_command(line: &str) -> Result<Vec<InputMessage>, InputError> {
    let mut words = line.split_whitespace();
    let command = words.next().ok_or(InputError::Empty)?.to_ascii_lowercase();

    let messages = match command.as_str() {
        "p" | "press" => vec![InputMessage::Key(KeyEvent::pressed(key_arg(&command, words.next())?))],
        "r" | "release" => vec![InputMessage::Key(KeyEvent::released(key_arg(&command, words.next())?))],
        "t" | "tap" => {
            let key = key_arg(&command, words.next())?;
            vec![
                InputMessage::Key(KeyEvent::pressed(key)),
                InputMessage::Key(KeyEvent::released(key)),
            ]
        }
        "e" | "enc" => {
            let arg = words
                .next()
                .ok_or_else(|| InputError::MissingArgument(command.clone()))?;
            let delta = arg.parse::<i32>().map_err(|_| InputError::InvalidArgument {
                command: command.clone(),
                arg: arg.to_string(),
            })?;
            vec![InputMessage::Turn(delta)]
        }
        "hold" => vec![InputMessage::Button(true)],
        "unhold" => vec![InputMessage::Button(false)],
        "q" | "quit" => vec![InputMessage::Quit],
        _ => return Err(InputError::UnknownCommand(command)),
    };
    Ok(messages)
}

fn key_arg(command: &str, arg: Option<&str>) -> Result<usize, InputError> {
    let arg = arg.ok_or_else(|| InputError::MissingArgument(command.to_string()))?;
    let key = arg.parse::<usize>().map_err(|_| InputError::InvalidArgument {
        command: command.to_string(),
        arg: arg.to_string(),
    })?;
    if key >= KEY_COUNT {
        return Err(InputError::KeyOutOfRange(key));
    }
    Ok(key)
}

/// Spawn a thread that parses commands from `reader` into `tx`.
/// End of input is reported as [`InputMessage::Quit`].
pub fn spawn_line_reader<R>(reader: R, tx: Sender<InputMessage>) -> std::io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("chordpad-input".into())
        .spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(%err, "input read failed");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(messages) => {
                        for message in messages {
                            if tx.send(message).is_err() {
                                return;
                            }
                        }
                    }
                    Err(err) => warn!(%err, line = %line, "ignoring input line"),
                }
            }
            info!("input closed");
            let _ = tx.send(InputMessage::Quit);
        })
}

/// Input source draining [`InputMessage`]s without blocking.
///
/// Quit requests and a disconnected channel raise the shared shutdown flag.
/// A button change that follows an encoder turn within the same poll is held
/// back to the next poll, so the turn is applied with the button state it
/// happened under.
pub struct ChannelInput {
    rx: Receiver<InputMessage>,
    shutdown: Arc<AtomicBool>,
    position: i32,
    pressed: bool,
    deferred: Option<InputMessage>,
}

impl ChannelInput {
    pub fn new(shutdown: Arc<AtomicBool>) -> (Self, Sender<InputMessage>) {
        let (tx, rx) = bounded(INPUT_QUEUE_DEPTH);
        let input = Self {
            rx,
            shutdown,
            position: 0,
            pressed: false,
            deferred: None,
        };
        (input, tx)
    }

    fn next_message(&mut self) -> Option<InputMessage> {
        if let Some(message) = self.deferred.take() {
            return Some(message);
        }
        match self.rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if !self.shutdown.swap(true, Ordering::SeqCst) {
                    debug!("input channel disconnected");
                }
                None
            }
        }
    }
}

impl InputSource for ChannelInput {
    fn poll_keys(&mut self) -> Vec<KeyEvent> {
        let mut keys = Vec::new();
        let mut turned = false;

        while let Some(message) = self.next_message() {
            match message {
                InputMessage::Key(event) => keys.push(event),
                InputMessage::Turn(delta) => {
                    self.position = self.position.wrapping_add(delta);
                    turned = true;
                }
                InputMessage::Button(pressed) if turned && pressed != self.pressed => {
                    self.deferred = Some(message);
                    break;
                }
                InputMessage::Button(pressed) => self.pressed = pressed,
                InputMessage::Quit => {
                    self.shutdown.store(true, Ordering::SeqCst);
                    break;
                }
            }
        }
        keys
    }

    fn encoder_position(&self) -> i32 {
        self.position
    }

    fn encoder_pressed(&self) -> bool {
        self.pressed
    }
}
