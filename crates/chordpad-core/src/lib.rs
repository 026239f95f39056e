//! chordpad-core: chord and arpeggiator engine for the chordpad keypad

pub mod chord;
pub mod engine;
mod error;
pub mod feedback;
pub mod io;
pub mod scheduler;
pub mod tempo;
#[cfg(test)]
mod testing;
pub mod tuning;
pub mod voice;

pub use chord::{ARP_POOL_MAX, Chord, MAJOR_SCALE, compute_chord};
pub use engine::{Engine, EngineConfig};
pub use error::{ChordpadError, Result};
pub use io::{
    Control, InputSource, KEY_COUNT, Key, KeyEvent, LabelRegion, MUSICAL_KEYS, NoteSink, Outputs, Rgb,
    TextSink, VELOCITY_OFF, VELOCITY_ON, VisualSink,
};
pub use scheduler::{ArpScheduler, FLASH_DURATION, Rescheduling};
pub use tempo::{PULSE_DURATION, PulseAction, TempoPulse};
pub use tuning::{ArpMode, BASE_KEY, ChordQuality, DEFAULT_BPM, MAX_BPM, MIN_BPM, TuningState};
pub use voice::{ArpVoice, Voice, VoiceRegistry, play_order, shuffle_with};
