//! Chord calculation from key index and tuning

use std::fmt;

use crate::error::{ChordpadError, Result};
use crate::io::MUSICAL_KEYS;
use crate::tuning::TuningState;

/// Semitone offsets of the major scale degrees
pub const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
/// Longest note pool an arpeggio cycles through
pub const ARP_POOL_MAX: usize = 8;

const MAX_PITCH: i16 = 127;

/// Ordered MIDI pitches produced for one key press
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chord {
    notes: Vec<u8>,
}

impl Chord {
    pub fn notes(&self) -> &[u8] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn into_notes(self) -> Vec<u8> {
        self.notes
    }
}

impl From<Vec<u8>> for Chord {
    fn from(notes: Vec<u8>) -> Self {
        Self { notes }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, note) in self.notes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{note}")?;
        }
        Ok(())
    }
}

/// Build the chord for a musical key.
///
/// The key picks a major-scale degree (shifted by the key offset) whose root
/// carries the current triad quality. Inversion raises the first notes in
/// written order by an octave before sorting; the octave shift applies to
/// all notes. With `extended` the chord is followed by itself an octave up
/// and cut to [`ARP_POOL_MAX`] notes, giving the arpeggio pool.
///
/// Pitches that would fall outside 0..=127 are dropped.
pub fn compute_chord(key: usize, tuning: &TuningState, extended: bool) -> Result<Chord> {
    if key >= MUSICAL_KEYS {
        return Err(ChordpadError::InvalidKey(key));
    }

    let degree = key + tuning.key_offset() as usize;
    let root = tuning.base_key() as i16
        + MAJOR_SCALE[degree % MAJOR_SCALE.len()] as i16
        + 12 * (degree / MAJOR_SCALE.len()) as i16;

    let mut notes: Vec<i16> = tuning
        .chord_quality()
        .intervals()
        .iter()
        .map(|&interval| root + interval as i16)
        .collect();

    for note in notes.iter_mut().take(tuning.inversion() as usize) {
        *note += 12;
    }

    let shift = 12 * tuning.octave_shift() as i16;
    for note in notes.iter_mut() {
        *note += shift;
    }
    notes.sort_unstable();

    if extended {
        let upper: Vec<i16> = notes.iter().map(|note| note + 12).collect();
        notes.extend(upper);
        notes.truncate(ARP_POOL_MAX);
    }

    Ok(Chord {
        notes: notes
            .into_iter()
            .filter(|note| (0..=MAX_PITCH).contains(note))
            .map(|note| note as u8)
            .collect(),
    })
}
