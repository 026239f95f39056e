//! Performance engine: the context object the event loop drives

use std::time::Instant;

use fastrand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::chord::compute_chord;
use crate::error::Result;
use crate::feedback::{self, KEY_IDLE, KEY_SOUNDING, PULSE_HIGHLIGHT};
use crate::io::{Control, InputSource, Key, KeyEvent, LabelRegion, MUSICAL_KEYS, Outputs};
use crate::scheduler::{ArpScheduler, Rescheduling};
use crate::tempo::{PulseAction, TempoPulse};
use crate::tuning::{ArpMode, DEFAULT_BPM, TuningState};
use crate::voice::VoiceRegistry;

/// Start-up settings for an [`Engine`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial tempo, clamped to the BPM range
    pub bpm: u16,
    /// Seed for the random arpeggio order; random when absent
    pub seed: Option<u64>,
    pub rescheduling: Rescheduling,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            seed: None,
            rescheduling: Rescheduling::TickRelative,
        }
    }
}

/// Owns the tuning store, the voice registry and the tempo state.
///
/// Every call takes the output collaborators explicitly; the engine holds
/// no handles of its own.
#[derive(Debug)]
pub struct Engine {
    tuning: TuningState,
    voices: VoiceRegistry,
    scheduler: ArpScheduler,
    pulse: TempoPulse,
    rng: Rng,
    last_encoder: Option<i32>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => Rng::with_seed(seed),
            None => Rng::new(),
        };
        Self {
            tuning: TuningState::with_bpm(config.bpm),
            voices: VoiceRegistry::new(),
            scheduler: ArpScheduler::new(config.rescheduling),
            pulse: TempoPulse::new(),
            rng,
            last_encoder: None,
        }
    }

    pub fn tuning(&self) -> &TuningState {
        &self.tuning
    }

    pub fn voices(&self) -> &VoiceRegistry {
        &self.voices
    }

    /// Paint every indicator and label from the current state
    pub fn paint(&self, out: &mut Outputs<'_>) {
        for key in 0..MUSICAL_KEYS {
            let color = if self.voices.contains(key) { KEY_SOUNDING } else { KEY_IDLE };
            out.visual.set_indicator(key, color);
        }
        for control in Control::ALL {
            self.refresh_indicator(control, out);
        }
        for region in LabelRegion::ALL {
            match region {
                LabelRegion::Chord => out.text.set_label(region, &feedback::chord_label(&[])),
                _ => self.refresh_label(region, out),
            }
        }
    }

    /// One loop iteration: every pending key event in arrival order, then
    /// the encoder, then tempo and arpeggio timers against a single `now`.
    ///
    /// The first step takes the encoder baseline before polling, so turns
    /// delivered by that poll still count.
    pub fn step(&mut self, input: &mut dyn InputSource, now: Instant, out: &mut Outputs<'_>) {
        if self.last_encoder.is_none() {
            self.prime_encoder(input.encoder_position());
        }
        for event in input.poll_keys() {
            self.handle_key(event, now, out);
        }
        self.handle_encoder(input.encoder_position(), input.encoder_pressed(), out);
        self.tick(now, out);
    }

    pub fn handle_key(&mut self, event: KeyEvent, now: Instant, out: &mut Outputs<'_>) {
        match Key::from_index(event.key) {
            Some(Key::Musical(key)) if event.pressed => {
                if let Err(err) = self.press_chord_key(key, now, out) {
                    error!(key, %err, "chord key press failed");
                }
            }
            Some(Key::Musical(key)) => self.release_chord_key(key, out),
            Some(Key::Control(control)) if event.pressed => self.apply_control(control, out),
            Some(Key::Control(_)) => {}
            None => warn!(key = event.key, "ignoring event for unknown key"),
        }
    }

    /// Record `position` as the encoder baseline without applying it
    pub fn prime_encoder(&mut self, position: i32) {
        self.last_encoder = Some(position);
    }

    /// Apply the encoder's movement since the previous read. Without a
    /// baseline the first read only records the starting position.
    pub fn handle_encoder(&mut self, position: i32, pressed: bool, out: &mut Outputs<'_>) {
        let Some(last) = self.last_encoder.replace(position) else {
            return;
        };
        let delta = position.wrapping_sub(last);
        if delta == 0 {
            return;
        }

        if pressed {
            let bpm = self.tuning.adjust_bpm(delta);
            debug!(bpm, "tempo changed");
            self.refresh_label(LabelRegion::Arp, out);
        } else {
            let offset = self.tuning.adjust_key_offset(delta);
            debug!(offset, "key offset changed");
            self.refresh_label(LabelRegion::Status, out);
        }
    }

    /// Tempo pulse, arpeggio steps and flash decay for this iteration
    pub fn tick(&mut self, now: Instant, out: &mut Outputs<'_>) {
        match self.pulse.tick(now, &self.tuning) {
            Some(PulseAction::Highlight) => {
                out.visual.set_indicator(Control::ArpMode.slot(), PULSE_HIGHLIGHT)
            }
            Some(PulseAction::Restore) => self.refresh_indicator(Control::ArpMode, out),
            None => {}
        }

        let step = self.tuning.step_interval();
        for key in self.scheduler.advance(&mut self.voices, now, step, out.notes) {
            out.visual.set_indicator(key, KEY_SOUNDING);
        }

        for key in self.scheduler.expire_flashes(now) {
            if !self.voices.is_held(key) {
                out.visual.set_indicator(key, KEY_IDLE);
            }
        }
    }

    /// Silence every voice and reset the chord keys
    pub fn stop_all(&mut self, out: &mut Outputs<'_>) {
        let released = self.voices.release_all(out.notes);
        for key in 0..MUSICAL_KEYS {
            out.visual.set_indicator(key, KEY_IDLE);
        }
        out.text.set_label(LabelRegion::Chord, &feedback::chord_label(&[]));
        info!(voices = released.len(), "all notes stopped");
    }

    fn press_chord_key(&mut self, key: usize, now: Instant, out: &mut Outputs<'_>) -> Result<()> {
        let chord = compute_chord(key, &self.tuning, false)?;

        if self.voices.release(key, out.notes) {
            debug!(key, "retriggering sounding key");
        }

        match self.tuning.arp_mode() {
            ArpMode::Off => self.voices.attach_held(key, &chord, out.notes)?,
            mode => {
                let pool = compute_chord(key, &self.tuning, true)?;
                let next_time = now + self.tuning.step_interval();
                self.voices
                    .attach_arpeggio(key, &pool, mode, &mut self.rng, next_time, out.notes)?;
            }
        }

        out.visual.set_indicator(key, KEY_SOUNDING);
        out.text.set_label(LabelRegion::Chord, &feedback::chord_label(chord.notes()));
        Ok(())
    }

    fn release_chord_key(&mut self, key: usize, out: &mut Outputs<'_>) {
        if self.tuning.latch() {
            return;
        }
        self.voices.release(key, out.notes);
        out.visual.set_indicator(key, KEY_IDLE);
        out.text.set_label(LabelRegion::Chord, &feedback::chord_label(&[]));
    }

    fn apply_control(&mut self, control: Control, out: &mut Outputs<'_>) {
        match control {
            Control::Inversion => {
                self.tuning.cycle_inversion();
                self.refresh_label(LabelRegion::Inversion, out);
            }
            Control::Octave => {
                self.tuning.cycle_octave();
                self.refresh_label(LabelRegion::Status, out);
            }
            Control::ArpMode => {
                self.tuning.cycle_arp_mode();
                self.refresh_label(LabelRegion::Arp, out);
            }
            Control::Latch => {
                let latched = self.tuning.toggle_latch();
                self.refresh_label(LabelRegion::Inversion, out);
                self.refresh_label(LabelRegion::Arp, out);
                if !latched {
                    self.stop_all(out);
                }
            }
            Control::ChordQuality => {
                self.tuning.cycle_chord_quality();
                self.refresh_label(LabelRegion::Inversion, out);
            }
        }
        self.refresh_indicator(control, out);
        debug!(?control, tuning = ?self.tuning, "control applied");
    }

    fn refresh_indicator(&self, control: Control, out: &mut Outputs<'_>) {
        let tuning = &self.tuning;
        let color = match control {
            Control::Inversion => feedback::inversion_color(tuning.inversion()),
            Control::Octave => feedback::octave_color(tuning.octave_shift()),
            Control::ArpMode => feedback::arp_color(tuning.arp_mode()),
            Control::Latch => feedback::latch_color(tuning.latch()),
            Control::ChordQuality => feedback::quality_color(tuning.chord_quality()),
        };
        out.visual.set_indicator(control.slot(), color);
    }

    fn refresh_label(&self, region: LabelRegion, out: &mut Outputs<'_>) {
        let text = match region {
            LabelRegion::Chord => return,
            LabelRegion::Status => feedback::status_label(&self.tuning),
            LabelRegion::Inversion => feedback::inversion_label(&self.tuning),
            LabelRegion::Arp => feedback::arp_label(&self.tuning),
        };
        out.text.set_label(region, &text);
    }
}
