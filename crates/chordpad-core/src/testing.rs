//! Recording collaborators for unit tests

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::io::{InputSource, KeyEvent, LabelRegion, NoteSink, Outputs, Rgb, TextSink, VisualSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteMsg {
    On(u8),
    Off(u8),
}

#[derive(Debug, Default)]
pub struct NoteLog {
    pub events: Vec<NoteMsg>,
}

impl NoteLog {
    /// Pitches whose note-ons outnumber note-offs, with the surplus
    pub fn outstanding(&self) -> BTreeMap<u8, i32> {
        let mut counts: BTreeMap<u8, i32> = BTreeMap::new();
        for event in &self.events {
            match *event {
                NoteMsg::On(pitch) => *counts.entry(pitch).or_default() += 1,
                NoteMsg::Off(pitch) => *counts.entry(pitch).or_default() -= 1,
            }
        }
        counts.retain(|_, count| *count != 0);
        counts
    }

    /// True if some prefix of the log ever released a pitch more often than it sounded
    pub fn has_unmatched_off(&self) -> bool {
        let mut counts: HashMap<u8, i32> = HashMap::new();
        self.events.iter().any(|event| match *event {
            NoteMsg::On(pitch) => {
                *counts.entry(pitch).or_default() += 1;
                false
            }
            NoteMsg::Off(pitch) => {
                let count = counts.entry(pitch).or_default();
                *count -= 1;
                *count < 0
            }
        })
    }
}

impl NoteSink for NoteLog {
    fn note_on(&mut self, pitch: u8, _velocity: u8) {
        self.events.push(NoteMsg::On(pitch));
    }

    fn note_off(&mut self, pitch: u8, _velocity: u8) {
        self.events.push(NoteMsg::Off(pitch));
    }
}

#[derive(Debug, Default)]
pub struct Leds {
    pub colors: HashMap<usize, Rgb>,
}

impl VisualSink for Leds {
    fn set_indicator(&mut self, slot: usize, color: Rgb) {
        self.colors.insert(slot, color);
    }
}

#[derive(Debug, Default)]
pub struct Labels {
    pub text: HashMap<LabelRegion, String>,
    pub writes: usize,
}

impl Labels {
    pub fn get(&self, region: LabelRegion) -> &str {
        self.text.get(&region).map(String::as_str).unwrap_or("")
    }
}

impl TextSink for Labels {
    fn set_label(&mut self, region: LabelRegion, text: &str) {
        self.writes += 1;
        self.text.insert(region, text.to_string());
    }
}

/// All three output recorders
#[derive(Debug, Default)]
pub struct Rig {
    pub notes: NoteLog,
    pub leds: Leds,
    pub labels: Labels,
}

impl Rig {
    pub fn out(&mut self) -> Outputs<'_> {
        Outputs {
            notes: &mut self.notes,
            visual: &mut self.leds,
            text: &mut self.labels,
        }
    }

    pub fn led(&self, slot: usize) -> Option<Rgb> {
        self.leds.colors.get(&slot).copied()
    }
}

/// Input source replaying queued polls. Each poll also applies the next
/// queued encoder turn, the way a channel-fed source updates its position.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    pub polls: VecDeque<Vec<KeyEvent>>,
    pub turns: VecDeque<i32>,
    pub position: i32,
    pub pressed: bool,
}

impl InputSource for ScriptedInput {
    fn poll_keys(&mut self) -> Vec<KeyEvent> {
        if let Some(delta) = self.turns.pop_front() {
            self.position += delta;
        }
        self.polls.pop_front().unwrap_or_default()
    }

    fn encoder_position(&self) -> i32 {
        self.position
    }

    fn encoder_pressed(&self) -> bool {
        self.pressed
    }
}
