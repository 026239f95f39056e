//! chordpad-services: MIDI transport, input plumbing and the event loop

pub mod console;
pub mod input;
pub mod midi_out;
pub mod runner;

pub use console::{ConsoleDisplay, ConsoleLeds};
pub use input::{COMMAND_HELP, ChannelInput, InputError, InputMessage, parse_command, spawn_line_reader};
pub use midi_out::{LogNoteSink, MidiNoteOut, MidiOutError, note_message};
pub use runner::run;
