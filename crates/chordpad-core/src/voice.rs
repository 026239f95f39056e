//! Sounding voices keyed by the musical key that started them

use std::collections::BTreeMap;
use std::time::Instant;

use fastrand::Rng;
use tracing::debug;

use crate::chord::Chord;
use crate::error::{ChordpadError, Result};
use crate::io::{NoteSink, VELOCITY_OFF, VELOCITY_ON};
use crate::tuning::ArpMode;

/// Running arpeggio state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpVoice {
    /// Play order, never empty
    pub notes: Vec<u8>,
    /// Index of the next note to play
    pub cursor: usize,
    /// Pitch with an outstanding note-on
    pub last_note: Option<u8>,
    pub next_time: Instant,
}

/// Something currently producing sound from one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Voice {
    Held { notes: Vec<u8> },
    Arpeggio(ArpVoice),
}

impl Voice {
    /// Pitches with an outstanding note-on
    pub fn sounding(&self) -> Vec<u8> {
        match self {
            Self::Held { notes } => notes.clone(),
            Self::Arpeggio(arp) => arp.last_note.into_iter().collect(),
        }
    }

    fn silence(self, sink: &mut dyn NoteSink) {
        for pitch in self.sounding() {
            sink.note_off(pitch, VELOCITY_OFF);
        }
    }
}

/// Fisher-Yates shuffle driven by `pick`, which returns an index in `0..=upper`.
/// Out-of-range picks are clamped to `upper`.
pub fn shuffle_with<T>(items: &mut [T], mut pick: impl FnMut(usize) -> usize) {
    for i in (1..items.len()).rev() {
        let j = pick(i).min(i);
        items.swap(i, j);
    }
}

/// Arpeggio play order for a note pool
pub fn play_order(pool: &[u8], mode: ArpMode, rng: &mut Rng) -> Vec<u8> {
    let mut order = pool.to_vec();
    match mode {
        ArpMode::Off | ArpMode::Up => {}
        ArpMode::Down => order.reverse(),
        ArpMode::Random => shuffle_with(&mut order, |upper| rng.usize(..=upper)),
    }
    order
}

/// Owns every sounding voice. Each entry has at least one outstanding
/// note-on, and removing an entry always sends the matching note-offs.
#[derive(Debug, Default)]
pub struct VoiceRegistry {
    voices: BTreeMap<usize, Voice>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: usize) -> Option<&Voice> {
        self.voices.get(&key)
    }

    pub fn contains(&self, key: usize) -> bool {
        self.voices.contains_key(&key)
    }

    pub fn is_held(&self, key: usize) -> bool {
        matches!(self.voices.get(&key), Some(Voice::Held { .. }))
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub(crate) fn arpeggios_mut(&mut self) -> impl Iterator<Item = (usize, &mut ArpVoice)> {
        self.voices.iter_mut().filter_map(|(&key, voice)| match voice {
            Voice::Arpeggio(arp) => Some((key, arp)),
            Voice::Held { .. } => None,
        })
    }

    fn ensure_vacant(&self, key: usize) -> Result<()> {
        if self.voices.contains_key(&key) {
            return Err(ChordpadError::VoiceSlotConflict(key));
        }
        Ok(())
    }

    /// Sound every pitch of `chord` and hold it under `key`
    pub fn attach_held(&mut self, key: usize, chord: &Chord, sink: &mut dyn NoteSink) -> Result<()> {
        self.ensure_vacant(key)?;
        if chord.is_empty() {
            return Ok(());
        }

        for &pitch in chord.notes() {
            sink.note_on(pitch, VELOCITY_ON);
        }
        self.voices.insert(key, Voice::Held { notes: chord.notes().to_vec() });
        debug!(key, notes = %chord, "held chord attached");
        Ok(())
    }

    /// Sound the first note of the pool's play order and start an arpeggio
    /// whose next step is due at `next_time`.
    pub fn attach_arpeggio(
        &mut self,
        key: usize,
        pool: &Chord,
        mode: ArpMode,
        rng: &mut Rng,
        next_time: Instant,
        sink: &mut dyn NoteSink,
    ) -> Result<()> {
        self.ensure_vacant(key)?;

        let notes = play_order(pool.notes(), mode, rng);
        let Some(&first) = notes.first() else {
            return Ok(());
        };

        sink.note_on(first, VELOCITY_ON);
        debug!(key, ?mode, ?notes, "arpeggio attached");
        self.voices.insert(
            key,
            Voice::Arpeggio(ArpVoice {
                cursor: 1 % notes.len(),
                notes,
                last_note: Some(first),
                next_time,
            }),
        );
        Ok(())
    }

    /// Silence and remove the voice at `key`. Returns false when nothing was sounding.
    pub fn release(&mut self, key: usize, sink: &mut dyn NoteSink) -> bool {
        match self.voices.remove(&key) {
            Some(voice) => {
                voice.silence(sink);
                debug!(key, "voice released");
                true
            }
            None => false,
        }
    }

    /// Silence every voice in key order; returns the released keys
    pub fn release_all(&mut self, sink: &mut dyn NoteSink) -> Vec<usize> {
        let voices = std::mem::take(&mut self.voices);
        let keys: Vec<usize> = voices.keys().copied().collect();
        for voice in voices.into_values() {
            voice.silence(sink);
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{NoteLog, NoteMsg};
    use std::time::Duration;

    fn pool() -> Chord {
        Chord::from(vec![60, 64, 67, 72, 76, 79])
    }

    #[test]
    fn test_attach_and_release_held() {
        let mut registry = VoiceRegistry::new();
        let mut log = NoteLog::default();
        registry.attach_held(2, &Chord::from(vec![64, 67, 71]), &mut log).unwrap();
        assert!(registry.is_held(2));
        assert_eq!(log.events, vec![NoteMsg::On(64), NoteMsg::On(67), NoteMsg::On(71)]);

        log.events.clear();
        assert!(registry.release(2, &mut log));
        assert_eq!(log.events, vec![NoteMsg::Off(64), NoteMsg::Off(67), NoteMsg::Off(71)]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_attach_conflict_emits_nothing() {
        let mut registry = VoiceRegistry::new();
        let mut log = NoteLog::default();
        let mut rng = Rng::with_seed(1);
        registry.attach_held(0, &Chord::from(vec![60, 64, 67]), &mut log).unwrap();
        log.events.clear();

        let err = registry.attach_held(0, &Chord::from(vec![62, 65, 69]), &mut log);
        assert_eq!(err, Err(ChordpadError::VoiceSlotConflict(0)));
        let err = registry.attach_arpeggio(0, &pool(), ArpMode::Up, &mut rng, Instant::now(), &mut log);
        assert_eq!(err, Err(ChordpadError::VoiceSlotConflict(0)));
        assert!(log.events.is_empty());
        assert_eq!(registry.get(0).unwrap().sounding(), vec![60, 64, 67]);
    }

    #[test]
    fn test_release_absent_is_noop() {
        let mut registry = VoiceRegistry::new();
        let mut log = NoteLog::default();
        assert!(!registry.release(3, &mut log));
        assert!(log.events.is_empty());
    }

    #[test]
    fn test_attach_arpeggio_state() {
        let mut registry = VoiceRegistry::new();
        let mut log = NoteLog::default();
        let mut rng = Rng::with_seed(1);
        let due = Instant::now() + Duration::from_millis(250);
        registry.attach_arpeggio(4, &pool(), ArpMode::Down, &mut rng, due, &mut log).unwrap();

        assert_eq!(log.events, vec![NoteMsg::On(79)]);
        let Some(Voice::Arpeggio(arp)) = registry.get(4) else {
            panic!("expected arpeggio voice");
        };
        assert_eq!(arp.notes, vec![79, 76, 72, 67, 64, 60]);
        assert_eq!(arp.cursor, 1);
        assert_eq!(arp.last_note, Some(79));
        assert_eq!(arp.next_time, due);

        log.events.clear();
        registry.release(4, &mut log);
        assert_eq!(log.events, vec![NoteMsg::Off(79)]);
    }

    #[test]
    fn test_single_note_pool_cursor_wraps() {
        let mut registry = VoiceRegistry::new();
        let mut log = NoteLog::default();
        let mut rng = Rng::with_seed(1);
        registry
            .attach_arpeggio(0, &Chord::from(vec![60]), ArpMode::Up, &mut rng, Instant::now(), &mut log)
            .unwrap();
        let Some(Voice::Arpeggio(arp)) = registry.get(0) else {
            panic!("expected arpeggio voice");
        };
        assert_eq!(arp.cursor, 0);
    }

    #[test]
    fn test_empty_pool_installs_nothing() {
        let mut registry = VoiceRegistry::new();
        let mut log = NoteLog::default();
        let mut rng = Rng::with_seed(1);
        registry
            .attach_arpeggio(0, &Chord::default(), ArpMode::Up, &mut rng, Instant::now(), &mut log)
            .unwrap();
        registry.attach_held(1, &Chord::default(), &mut log).unwrap();
        assert!(registry.is_empty());
        assert!(log.events.is_empty());
    }

    #[test]
    fn test_play_orders() {
        let notes = pool().into_notes();
        let mut rng = Rng::with_seed(42);
        assert_eq!(play_order(&notes, ArpMode::Up, &mut rng), notes);

        let mut reversed = notes.clone();
        reversed.reverse();
        assert_eq!(play_order(&notes, ArpMode::Down, &mut rng), reversed);

        let mut shuffled = play_order(&notes, ArpMode::Random, &mut rng);
        assert_eq!(shuffled.len(), notes.len());
        shuffled.sort_unstable();
        assert_eq!(shuffled, notes);
    }

    #[test]
    fn test_shuffle_with_fixed_picks() {
        let mut items = vec![1, 2, 3, 4, 5, 6];
        shuffle_with(&mut items, |_| 0);
        assert_eq!(items, vec![2, 3, 4, 5, 6, 1]);

        let mut items = vec![1, 2, 3, 4, 5, 6];
        shuffle_with(&mut items, |upper| upper);
        assert_eq!(items, vec![1, 2, 3, 4, 5, 6]);

        let mut items = vec![1, 2, 3];
        shuffle_with(&mut items, |upper| upper + 10);
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_random_order_reproducible_with_seed() {
        let notes = pool().into_notes();
        let first = play_order(&notes, ArpMode::Random, &mut Rng::with_seed(7));
        let second = play_order(&notes, ArpMode::Random, &mut Rng::with_seed(7));
        assert_eq!(first, second);
    }

    #[test]
    fn test_release_all_in_key_order() {
        let mut registry = VoiceRegistry::new();
        let mut log = NoteLog::default();
        let mut rng = Rng::with_seed(3);
        registry.attach_held(5, &Chord::from(vec![69, 72, 76]), &mut log).unwrap();
        registry.attach_arpeggio(1, &pool(), ArpMode::Up, &mut rng, Instant::now(), &mut log).unwrap();
        log.events.clear();

        assert_eq!(registry.release_all(&mut log), vec![1, 5]);
        assert_eq!(
            log.events,
            vec![NoteMsg::Off(60), NoteMsg::Off(69), NoteMsg::Off(72), NoteMsg::Off(76)]
        );
        assert!(registry.is_empty());
    }
}
