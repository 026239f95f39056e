//! Performance parameters mutated by the control keys and the encoder

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::tempo;

/// Anchor pitch for scale degree 0 (middle C)
pub const BASE_KEY: u8 = 60;
pub const MIN_BPM: u16 = 30;
pub const MAX_BPM: u16 = 300;
pub const DEFAULT_BPM: u16 = 120;

/// Triad quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChordQuality {
    #[default]
    Major,
    Minor,
    Diminished,
}

impl ChordQuality {
    /// Get chord intervals from root
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Diminished => &[0, 3, 6],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "Maj",
            Self::Minor => "Min",
            Self::Diminished => "Dim",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Self::Major => Self::Minor,
            Self::Minor => Self::Diminished,
            Self::Diminished => Self::Major,
        }
    }
}

/// Arpeggiator play order, or `Off` for plain held chords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArpMode {
    #[default]
    Off,
    Up,
    Down,
    Random,
}

impl ArpMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Random => "Rnd",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Self::Off => Self::Up,
            Self::Up => Self::Down,
            Self::Down => Self::Random,
            Self::Random => Self::Off,
        }
    }

    /// Position in the mode cycle (Off = 0)
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_active(&self) -> bool {
        *self != Self::Off
    }
}

/// Tuning and mode parameters.
///
/// Fields are private so every mutation goes through a wrapping or clamping
/// transition and can never leave its range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuningState {
    base_key: u8,
    key_offset: u8,
    inversion: u8,
    octave_shift: i8,
    chord_quality: ChordQuality,
    arp_mode: ArpMode,
    latch: bool,
    bpm: u16,
}

impl Default for TuningState {
    fn default() -> Self {
        Self {
            base_key: BASE_KEY,
            key_offset: 0,
            inversion: 0,
            octave_shift: 0,
            chord_quality: ChordQuality::Major,
            arp_mode: ArpMode::Off,
            latch: false,
            bpm: DEFAULT_BPM,
        }
    }
}

impl TuningState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with a start-up tempo, clamped to the BPM range
    pub fn with_bpm(bpm: u16) -> Self {
        Self {
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
            ..Default::default()
        }
    }

    pub fn base_key(&self) -> u8 {
        self.base_key
    }

    pub fn key_offset(&self) -> u8 {
        self.key_offset
    }

    pub fn inversion(&self) -> u8 {
        self.inversion
    }

    pub fn octave_shift(&self) -> i8 {
        self.octave_shift
    }

    pub fn chord_quality(&self) -> ChordQuality {
        self.chord_quality
    }

    pub fn arp_mode(&self) -> ArpMode {
        self.arp_mode
    }

    pub fn latch(&self) -> bool {
        self.latch
    }

    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    /// Time between arpeggio steps at the current tempo
    pub fn step_interval(&self) -> Duration {
        tempo::step_interval(self.bpm)
    }

    /// Time between tempo pulses at the current tempo
    pub fn beat_interval(&self) -> Duration {
        tempo::beat_interval(self.bpm)
    }

    pub fn cycle_inversion(&mut self) -> u8 {
        self.inversion = (self.inversion + 1) % 3;
        self.inversion
    }

    /// Octave shift walks the fixed cycle -1 -> 0 -> 1 -> -1
    pub fn cycle_octave(&mut self) -> i8 {
        self.octave_shift = match self.octave_shift {
            -1 => 0,
            0 => 1,
            _ => -1,
        };
        self.octave_shift
    }

    pub fn cycle_arp_mode(&mut self) -> ArpMode {
        self.arp_mode = self.arp_mode.next();
        self.arp_mode
    }

    pub fn toggle_latch(&mut self) -> bool {
        self.latch = !self.latch;
        self.latch
    }

    pub fn cycle_chord_quality(&mut self) -> ChordQuality {
        self.chord_quality = self.chord_quality.next();
        self.chord_quality
    }

    pub fn adjust_bpm(&mut self, delta: i32) -> u16 {
        let bpm = (self.bpm as i32).saturating_add(delta);
        self.bpm = bpm.clamp(MIN_BPM as i32, MAX_BPM as i32) as u16;
        self.bpm
    }

    pub fn adjust_key_offset(&mut self, delta: i32) -> u8 {
        let offset = self.key_offset as i32 + delta.rem_euclid(12);
        self.key_offset = offset.rem_euclid(12) as u8;
        self.key_offset
    }
}
