//! Arpeggiator scheduler: advances every due arpeggio once per loop tick

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::io::{NoteSink, VELOCITY_OFF, VELOCITY_ON};
use crate::voice::VoiceRegistry;

/// How long a key indicator flashes after an arpeggio step
pub const FLASH_DURATION: Duration = Duration::from_millis(50);

/// Where the next step lands after an advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rescheduling {
    /// `now + step`: loop jitter accumulates as tempo drift
    #[default]
    TickRelative,
    /// `scheduled + step`: holds the grid, re-anchors to `now + step` once a
    /// whole step has been missed instead of firing a burst
    Anchored,
}

impl Rescheduling {
    pub fn next_time(&self, scheduled: Instant, now: Instant, step: Duration) -> Instant {
        match self {
            Self::TickRelative => now + step,
            Self::Anchored => {
                let next = scheduled + step;
                if next <= now { now + step } else { next }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ArpScheduler {
    rescheduling: Rescheduling,
    /// Flash expiry per key
    flashes: BTreeMap<usize, Instant>,
}

impl ArpScheduler {
    pub fn new(rescheduling: Rescheduling) -> Self {
        Self {
            rescheduling,
            flashes: BTreeMap::new(),
        }
    }

    /// Step every arpeggio due at `now`: release the previous note, sound the
    /// next one, reschedule. Returns the keys that stepped.
    pub fn advance(
        &mut self,
        voices: &mut VoiceRegistry,
        now: Instant,
        step: Duration,
        sink: &mut dyn NoteSink,
    ) -> Vec<usize> {
        let mut stepped = Vec::new();

        for (key, arp) in voices.arpeggios_mut() {
            if now < arp.next_time {
                continue;
            }

            if let Some(previous) = arp.last_note.take() {
                sink.note_off(previous, VELOCITY_OFF);
            }
            let note = arp.notes[arp.cursor];
            sink.note_on(note, VELOCITY_ON);
            arp.last_note = Some(note);
            arp.cursor = (arp.cursor + 1) % arp.notes.len();
            arp.next_time = self.rescheduling.next_time(arp.next_time, now, step);

            self.flashes.insert(key, now + FLASH_DURATION);
            stepped.push(key);
        }

        stepped
    }

    /// Drop flashes that expired strictly before `now`; returns their keys
    pub fn expire_flashes(&mut self, now: Instant) -> Vec<usize> {
        let expired: Vec<usize> = self
            .flashes
            .iter()
            .filter(|&(_, &until)| now > until)
            .map(|(&key, _)| key)
            .collect();
        for key in &expired {
            self.flashes.remove(key);
        }
        expired
    }

    pub fn is_flashing(&self, key: usize) -> bool {
        self.flashes.contains_key(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::Chord;
    use crate::testing::{NoteLog, NoteMsg};
    use crate::tuning::ArpMode;
    use fastrand::Rng;

    const STEP: Duration = Duration::from_millis(250);

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn registry_with_up_arp(t0: Instant, log: &mut NoteLog) -> VoiceRegistry {
        let mut voices = VoiceRegistry::new();
        let pool = Chord::from(vec![60, 64, 67]);
        voices
            .attach_arpeggio(0, &pool, ArpMode::Up, &mut Rng::with_seed(1), t0 + STEP, log)
            .unwrap();
        voices
    }

    #[test]
    fn test_advance_cycles_pool() {
        let t0 = Instant::now();
        let mut log = NoteLog::default();
        let mut voices = registry_with_up_arp(t0, &mut log);
        let mut scheduler = ArpScheduler::default();

        assert!(scheduler.advance(&mut voices, t0 + ms(100), STEP, &mut log).is_empty());
        assert_eq!(scheduler.advance(&mut voices, t0 + ms(250), STEP, &mut log), vec![0]);
        scheduler.advance(&mut voices, t0 + ms(500), STEP, &mut log);
        scheduler.advance(&mut voices, t0 + ms(750), STEP, &mut log);

        assert_eq!(
            log.events,
            vec![
                NoteMsg::On(60),
                NoteMsg::Off(60),
                NoteMsg::On(64),
                NoteMsg::Off(64),
                NoteMsg::On(67),
                NoteMsg::Off(67),
                NoteMsg::On(60),
            ]
        );
    }

    #[test]
    fn test_one_advance_per_tick_even_when_late() {
        let t0 = Instant::now();
        let mut log = NoteLog::default();
        let mut voices = registry_with_up_arp(t0, &mut log);
        let mut scheduler = ArpScheduler::default();

        scheduler.advance(&mut voices, t0 + ms(1_000), STEP, &mut log);
        assert_eq!(log.events.len(), 3);
        assert_eq!(log.outstanding().len(), 1);
    }

    #[test]
    fn test_tick_relative_rescheduling() {
        let t0 = Instant::now();
        let late = t0 + ms(260);
        assert_eq!(Rescheduling::TickRelative.next_time(t0 + STEP, late, STEP), late + STEP);
    }

    #[test]
    fn test_anchored_rescheduling() {
        let t0 = Instant::now();
        let scheduled = t0 + STEP;
        assert_eq!(
            Rescheduling::Anchored.next_time(scheduled, t0 + ms(260), STEP),
            scheduled + STEP
        );
        // more than a whole step late: re-anchor instead of bursting
        let very_late = t0 + ms(900);
        assert_eq!(Rescheduling::Anchored.next_time(scheduled, very_late, STEP), very_late + STEP);
    }

    #[test]
    fn test_flash_expiry() {
        let t0 = Instant::now();
        let mut log = NoteLog::default();
        let mut voices = registry_with_up_arp(t0, &mut log);
        let mut scheduler = ArpScheduler::new(Rescheduling::Anchored);

        scheduler.advance(&mut voices, t0 + STEP, STEP, &mut log);
        assert!(scheduler.is_flashing(0));
        assert!(scheduler.expire_flashes(t0 + STEP + FLASH_DURATION).is_empty());
        assert_eq!(scheduler.expire_flashes(t0 + STEP + ms(51)), vec![0]);
        assert!(!scheduler.is_flashing(0));
    }

    #[test]
    fn test_held_voices_untouched() {
        let t0 = Instant::now();
        let mut log = NoteLog::default();
        let mut voices = VoiceRegistry::new();
        voices.attach_held(1, &Chord::from(vec![62, 66, 69]), &mut log).unwrap();
        log.events.clear();

        let mut scheduler = ArpScheduler::default();
        assert!(scheduler.advance(&mut voices, t0 + ms(5_000), STEP, &mut log).is_empty());
        assert!(log.events.is_empty());
    }
}
